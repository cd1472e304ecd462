//! RangeList - sorted set of non-adjacent, inclusive integer ranges.
//!
//! Tracks which logical lines still need their metrics recomputed. Values are
//! logical line numbers, so the list has to follow text edits: inserting lines
//! shifts every stored value at or after the insertion point, deleting lines
//! shifts the values after the deleted block down.
//!
//! # Complexity
//!
//! - `find`, `contains_any`: O(log n)
//! - `add`, `remove`: O(log n + k) where k is the number of touched ranges
//! - `insert`, `delete`: O(n) (values after the edit point are shifted)

use std::fmt;

/// An inclusive range of values `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// First value in the range.
    pub low: usize,
    /// Last value in the range (inclusive).
    pub high: usize,
}

impl Range {
    /// Creates a range. `low` must not exceed `high`.
    pub fn new(low: usize, high: usize) -> Self {
        debug_assert!(low <= high, "inverted range {low}..={high}");
        Self { low, high }
    }

    /// Number of values covered by the range.
    pub fn span(&self) -> usize {
        self.high - self.low + 1
    }

    /// Returns true if `value` lies inside the range.
    pub fn contains(&self, value: usize) -> bool {
        self.low <= value && value <= self.high
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{},{}}}", self.low, self.high)
    }
}

/// Sorted list of disjoint, non-adjacent ranges with a cached value count.
///
/// Two stored ranges never touch: `items[i].high + 1 < items[i + 1].low`.
/// Adding a range that touches or overlaps existing ranges merges them.
///
/// # Examples
///
/// ```
/// # use textdisp::metrics::range_list::RangeList;
/// let mut list = RangeList::new();
/// list.add(5, 6);
/// list.add(8, 9);
/// list.insert(1, 5);
/// assert_eq!(list.to_string(), "{1,5} {10,11} {13,14}");
/// list.delete(1, 5);
/// assert_eq!(list.to_string(), "{5,6} {8,9}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeList {
    items: Vec<Range>,
    count: usize,
}

impl RangeList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty list with room for `capacity` ranges.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            count: 0,
        }
    }

    /// Returns true if the list holds no values.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of stored ranges.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of values across all ranges.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Stored ranges in ascending order.
    pub fn ranges(&self) -> &[Range] {
        &self.items
    }

    /// The lowest stored range.
    pub fn first(&self) -> Option<&Range> {
        self.items.first()
    }

    /// The highest stored range.
    pub fn last(&self) -> Option<&Range> {
        self.items.last()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.items.clear();
        self.count = 0;
    }

    /// Index of the first range whose `high` is at least `value`.
    fn lower_bound(&self, value: usize) -> usize {
        self.items.partition_point(|r| r.high < value)
    }

    /// Adds `[low, high]`, merging with overlapping and adjacent ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// # use textdisp::metrics::range_list::RangeList;
    /// let mut list = RangeList::new();
    /// list.add(2, 3);
    /// list.add(6, 7);
    /// list.add(5, 5);
    /// assert_eq!(list.to_string(), "{2,3} {5,7}");
    /// assert_eq!(list.count(), 5);
    /// ```
    pub fn add(&mut self, low: usize, high: usize) {
        debug_assert!(low <= high);

        // A range ending at low - 1 is adjacent and must merge.
        let start = self.items.partition_point(|r| r.high.saturating_add(1) < low);
        let mut merged = Range::new(low, high);
        let mut end = start;
        while end < self.items.len() && self.items[end].low <= high.saturating_add(1) {
            let r = self.items[end];
            merged.low = merged.low.min(r.low);
            merged.high = merged.high.max(r.high);
            self.count -= r.span();
            end += 1;
        }

        self.count += merged.span();
        self.items.splice(start..end, std::iter::once(merged));
        self.check();
    }

    /// Removes every value in `[low, high]`, splitting ranges as needed.
    pub fn remove(&mut self, low: usize, high: usize) {
        debug_assert!(low <= high);

        let start = self.lower_bound(low);
        let mut end = start;
        let mut pieces: [Option<Range>; 2] = [None, None];
        while end < self.items.len() && self.items[end].low <= high {
            let r = self.items[end];
            self.count -= r.span();
            if r.low < low {
                pieces[0] = Some(Range::new(r.low, low - 1));
            }
            if r.high > high {
                pieces[1] = Some(Range::new(high + 1, r.high));
            }
            end += 1;
        }
        if start == end {
            return;
        }

        let pieces = pieces.into_iter().flatten();
        let pieces: Vec<Range> = pieces.collect();
        self.count += pieces.iter().map(Range::span).sum::<usize>();
        self.items.splice(start..end, pieces);
        self.check();
    }

    /// Opens a gap for newly inserted values `[low, high]` and marks them.
    ///
    /// Every stored value `>= low` moves up by `high - low + 1`, then the
    /// inserted block itself is added.
    pub fn insert(&mut self, low: usize, high: usize) {
        debug_assert!(low <= high);
        let span = high - low + 1;

        let mut i = self.lower_bound(low);
        if i < self.items.len() && self.items[i].low < low {
            // Straddles the insertion point: keep the head, shift the tail.
            let r = self.items[i];
            self.items[i].high = low - 1;
            self.items.insert(i + 1, Range::new(low, r.high));
            i += 1;
        }
        for r in &mut self.items[i..] {
            r.low += span;
            r.high += span;
        }

        self.add(low, high);
    }

    /// Removes values `[low, high]` and closes the gap.
    ///
    /// Every stored value `> high` moves down by `high - low + 1`. Ranges that
    /// become adjacent across the closed gap are merged.
    pub fn delete(&mut self, low: usize, high: usize) {
        debug_assert!(low <= high);
        let span = high - low + 1;

        self.remove(low, high);
        let i = self.lower_bound(low);
        for r in &mut self.items[i..] {
            r.low -= span;
            r.high -= span;
        }

        if i > 0 && i < self.items.len() && self.items[i - 1].high + 1 >= self.items[i].low {
            self.items[i - 1].high = self.items[i].high;
            self.items.remove(i);
        }
        self.check();
    }

    /// Returns the range containing `value`.
    pub fn find(&self, value: usize) -> Option<&Range> {
        let i = self.lower_bound(value);
        self.items.get(i).filter(|r| r.low <= value)
    }

    /// Returns the range containing `value`, or else the first range after it.
    pub fn find_nearest(&self, value: usize) -> Option<&Range> {
        self.items.get(self.lower_bound(value))
    }

    /// Returns true if any value in `[low, high]` is stored.
    pub fn contains_any(&self, low: usize, high: usize) -> bool {
        let i = self.lower_bound(low);
        self.items.get(i).is_some_and(|r| r.low <= high)
    }

    /// Drops every value below `value`.
    pub fn truncate_at_front(&mut self, value: usize) {
        if value > 0 {
            self.remove(0, value - 1);
        }
    }

    /// Drops every value above `value`.
    pub fn truncate_at_end(&mut self, value: usize) {
        let i = self.items.partition_point(|r| r.high <= value);
        if i == self.items.len() {
            return;
        }
        let mut keep = i;
        if self.items[i].low <= value {
            self.count -= self.items[i].high - value;
            self.items[i].high = value;
            keep += 1;
        }
        for r in &self.items[keep..] {
            self.count -= r.span();
        }
        self.items.truncate(keep);
        self.check();
    }

    /// Iterates over the stored ranges in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, Range> {
        self.items.iter()
    }

    /// Iterates over every stored value in ascending order.
    pub fn values(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().flat_map(|r| r.low..=r.high)
    }

    #[cfg(debug_assertions)]
    fn check(&self) {
        let total: usize = self.items.iter().map(Range::span).sum();
        debug_assert_eq!(total, self.count, "cached count out of sync");
        for pair in self.items.windows(2) {
            debug_assert!(
                pair[0].high + 1 < pair[1].low,
                "ranges {} and {} touch",
                pair[0],
                pair[1]
            );
        }
    }

    #[cfg(not(debug_assertions))]
    fn check(&self) {}
}

impl fmt::Display for RangeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{r}")?;
        }
        Ok(())
    }
}
