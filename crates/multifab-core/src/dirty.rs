/// Tracks whether the auto-sorter has work to do.
///
/// `needed` is armed by any tracked slot change or a recipe cache flush and
/// is disarmed only by [`take_sort`](SortTracker::take_sort), immediately
/// before a sort runs. Changes made by the sort itself re-arm it so slots
/// emptied by the sort can be refilled on the next pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTracker {
    enabled: bool,
    needed: bool,
}

impl Default for SortTracker {
    fn default() -> Self {
        Self {
            enabled: false,
            needed: true,
        }
    }
}

impl SortTracker {
    /// A tracker with sorting disabled and a sort pending.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` if the enabled flag changed.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        let changed = self.enabled != enabled;
        self.enabled = enabled;
        changed
    }

    pub fn is_needed(&self) -> bool {
        self.needed
    }

    /// Arm the tracker after a slot content change.
    pub fn mark_needed(&mut self) {
        self.needed = true;
    }

    /// Returns `true` and disarms the tracker if a sort should run now.
    pub fn take_sort(&mut self) -> bool {
        if self.enabled && self.needed {
            self.needed = false;
            true
        } else {
            false
        }
    }

    /// Re-arm after a recipe cache flush, since the current layout may have
    /// been tuned for recipes that no longer exist.
    pub fn on_cache_flush(&mut self) {
        self.needed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_starts_needed_but_disabled() {
        let mut tracker = SortTracker::new();
        assert!(tracker.is_needed());
        assert!(!tracker.is_enabled());
        assert!(!tracker.take_sort());
        assert!(tracker.is_needed());
    }

    #[test]
    fn take_sort_disarms() {
        let mut tracker = SortTracker::new();
        tracker.set_enabled(true);
        assert!(tracker.take_sort());
        assert!(!tracker.is_needed());
        assert!(!tracker.take_sort());
    }

    #[test]
    fn mark_needed_rearms() {
        let mut tracker = SortTracker::new();
        tracker.set_enabled(true);
        tracker.take_sort();
        tracker.mark_needed();
        assert!(tracker.take_sort());
    }

    #[test]
    fn cache_flush_rearms() {
        let mut tracker = SortTracker::new();
        tracker.set_enabled(true);
        tracker.take_sort();
        tracker.on_cache_flush();
        assert!(tracker.is_needed());
    }

    #[test]
    fn set_enabled_reports_change() {
        let mut tracker = SortTracker::new();
        assert!(tracker.set_enabled(true));
        assert!(!tracker.set_enabled(true));
    }
}
