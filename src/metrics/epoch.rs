//! Metric epochs.
//!
//! Every cached per-line metric is stamped with the epoch it was computed in.
//! Bumping the epoch invalidates all stamps at once; a stamp with the
//! [`PARTIAL_EPOCH`] bit set marks a line whose display-line array is only
//! partially computed for that epoch.

/// High bit flagging a partially computed line.
pub const PARTIAL_EPOCH: u32 = 0x8000_0000;

/// Monotonic counter identifying the current generation of line metrics.
///
/// Zero is never a current epoch, so a zeroed stamp always reads as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Epoch(u32);

impl Default for Epoch {
    fn default() -> Self {
        Self(1)
    }
}

impl Epoch {
    /// Raw value of the epoch.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Advances to the next epoch, skipping zero on wrap-around.
    pub fn bump(&mut self) {
        let next = (self.0 + 1) & !PARTIAL_EPOCH;
        self.0 = next.max(1);
    }

    /// Stamp for a line whose metrics are complete in this epoch.
    pub fn complete(self) -> u32 {
        self.0
    }

    /// Stamp for a line whose metrics are partially computed in this epoch.
    pub fn partial(self) -> u32 {
        self.0 | PARTIAL_EPOCH
    }

    /// Returns true if `stamp` marks complete metrics for this epoch.
    pub fn is_complete(self, stamp: u32) -> bool {
        stamp == self.0
    }

    /// Returns true if `stamp` marks partial metrics for this epoch.
    pub fn is_partial(self, stamp: u32) -> bool {
        stamp == self.partial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_stamp_is_never_current() {
        let epoch = Epoch::default();
        assert!(!epoch.is_complete(0));
        assert!(!epoch.is_partial(0));
    }

    #[test]
    fn bump_invalidates_previous_stamps() {
        let mut epoch = Epoch::default();
        let complete = epoch.complete();
        let partial = epoch.partial();
        epoch.bump();
        assert!(!epoch.is_complete(complete));
        assert!(!epoch.is_partial(partial));
    }

    #[test]
    fn partial_and_complete_are_distinct() {
        let epoch = Epoch::default();
        assert!(epoch.is_partial(epoch.partial()));
        assert!(!epoch.is_complete(epoch.partial()));
    }

    #[test]
    fn wrap_skips_zero_and_partial_bit() {
        let mut epoch = Epoch(PARTIAL_EPOCH - 1);
        epoch.bump();
        assert_eq!(epoch.get(), 1);
    }
}
