//! HeightIndex - O(log n) pixel offsets of logical lines via a Fenwick tree.
//!
//! Maps logical line numbers to their vertical pixel position in the document
//! and back, which is what scrolling to a fraction of the document needs.
//!
//! # Complexity
//!
//! - `set`: O(log n)
//! - `prefix_sum`, `offset_of`, `total`: O(log n)
//! - `lower_bound`: O(log² n)
//! - `push`: amortized O(log n)
//! - `splice`: O(n log n) (the tree is rebuilt)
//! - `height`, `len`: O(1)

/// Fenwick tree over per-line pixel heights.
///
/// The plain heights are kept alongside the tree so single-line reads do not
/// need two prefix queries.
#[derive(Debug, Clone, Default)]
pub struct HeightIndex {
    /// Fenwick tree backing storage; may be longer than `heights`.
    tree: Vec<isize>,
    heights: Vec<usize>,
}

impl HeightIndex {
    /// Creates an empty index with room for `capacity` lines.
    ///
    /// # Examples
    ///
    /// ```
    /// # use textdisp::metrics::height_index::HeightIndex;
    /// let index = HeightIndex::new(100);
    /// assert_eq!(index.len(), 0);
    /// assert_eq!(index.total(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity],
            heights: Vec::with_capacity(capacity),
        }
    }

    /// Builds an index over the given heights.
    ///
    /// # Examples
    ///
    /// ```
    /// # use textdisp::metrics::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights(vec![10, 20, 15]);
    /// assert_eq!(index.offset_of(2), 30);
    /// assert_eq!(index.lower_bound(30), Some(2));
    /// ```
    pub fn from_heights(heights: Vec<usize>) -> Self {
        let mut index = Self {
            tree: Vec::new(),
            heights,
        };
        index.rebuild(index.heights.len());
        index
    }

    fn rebuild(&mut self, capacity: usize) {
        self.tree.clear();
        self.tree.resize(capacity.max(self.heights.len()), 0);
        for (i, &h) in self.heights.iter().enumerate() {
            if h != 0 {
                // Update against the full tree so every covering node sees it.
                fenwick::array::update(&mut self.tree, i, h as isize);
            }
        }
    }

    /// Number of lines in the index.
    pub fn len(&self) -> usize {
        self.heights.len()
    }

    /// Returns true if the index holds no lines.
    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Height of line `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn height(&self, index: usize) -> usize {
        self.heights[index]
    }

    /// Sets the height of line `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use textdisp::metrics::height_index::HeightIndex;
    /// let mut index = HeightIndex::from_heights(vec![3, 4, 5]);
    /// index.set(1, 10);
    /// assert_eq!(index.prefix_sum(2), 18);
    /// ```
    pub fn set(&mut self, index: usize, height: usize) {
        assert!(
            index < self.heights.len(),
            "index {} out of bounds (len: {})",
            index,
            self.heights.len()
        );

        let delta = height as isize - self.heights[index] as isize;
        if delta != 0 {
            fenwick::array::update(&mut self.tree, index, delta);
            self.heights[index] = height;
        }
    }

    /// Cumulative height of lines `0..=index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn prefix_sum(&self, index: usize) -> usize {
        assert!(
            index < self.heights.len(),
            "index {} out of bounds (len: {})",
            index,
            self.heights.len()
        );

        let sum = fenwick::array::prefix_sum(&self.tree, index);
        sum.max(0) as usize
    }

    /// Pixel offset of the top of line `index`, i.e. the height of all lines
    /// before it. `offset_of(len())` is the total height.
    pub fn offset_of(&self, index: usize) -> usize {
        if index == 0 || self.is_empty() {
            0
        } else {
            self.prefix_sum(index.min(self.heights.len()) - 1)
        }
    }

    /// Binary search for the first line with `prefix_sum(line) > value`,
    /// i.e. the line covering pixel offset `value`.
    ///
    /// Returns `None` if `value >= total()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use textdisp::metrics::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights(vec![10, 20, 15]);
    /// assert_eq!(index.lower_bound(0), Some(0));
    /// assert_eq!(index.lower_bound(10), Some(1));
    /// assert_eq!(index.lower_bound(44), Some(2));
    /// assert_eq!(index.lower_bound(45), None);
    /// ```
    pub fn lower_bound(&self, value: usize) -> Option<usize> {
        if self.is_empty() {
            return None;
        }

        // Line i covers [prefix_sum(i-1), prefix_sum(i))
        let mut left = 0;
        let mut right = self.heights.len();
        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > value {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        (left < self.heights.len()).then_some(left)
    }

    /// Total height of all lines.
    pub fn total(&self) -> usize {
        self.offset_of(self.heights.len())
    }

    /// Appends a line with the given height.
    pub fn push(&mut self, height: usize) {
        let idx = self.heights.len();
        self.heights.push(height);
        if idx >= self.tree.len() {
            // A grown Fenwick array needs its covering nodes recomputed.
            self.rebuild((self.tree.len().max(1)) * 2);
        } else if height != 0 {
            fenwick::array::update(&mut self.tree, idx, height as isize);
        }
    }

    /// Replaces `remove` lines starting at `at` with lines of the given
    /// heights.
    ///
    /// # Examples
    ///
    /// ```
    /// # use textdisp::metrics::height_index::HeightIndex;
    /// let mut index = HeightIndex::from_heights(vec![1, 2, 3, 4]);
    /// index.splice(1, 2, &[10, 10, 10]);
    /// assert_eq!(index.len(), 5);
    /// assert_eq!(index.total(), 35);
    /// ```
    pub fn splice(&mut self, at: usize, remove: usize, insert: &[usize]) {
        let end = (at + remove).min(self.heights.len());
        self.heights.splice(at..end, insert.iter().copied());
        self.rebuild(self.heights.len());
    }

    /// Removes every line, keeping the allocation.
    pub fn clear(&mut self) {
        self.tree.iter_mut().for_each(|n| *n = 0);
        self.heights.clear();
    }
}
