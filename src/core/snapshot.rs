//! Two-value snapshots of polled memory locations

/// The last two observed values of one memory location
///
/// `old` always equals the `new` of the previous tick. Both fields hold the
/// default value until the first successful refresh, which sets them both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueSnapshot<T> {
    /// Value observed on the previous tick
    pub old: T,
    /// Value observed on this tick
    pub new: T,
    initialized: bool,
}

impl<T: Clone + PartialEq> ValueSnapshot<T> {
    /// Create an empty snapshot
    pub fn new() -> Self
    where
        T: Default,
    {
        Self {
            old: T::default(),
            new: T::default(),
            initialized: false,
        }
    }

    /// Shift `new` into `old` and store `raw` as the new value
    pub fn refresh(&mut self, raw: T) {
        if self.initialized {
            self.old = std::mem::replace(&mut self.new, raw);
        } else {
            self.old = raw.clone();
            self.new = raw;
            self.initialized = true;
        }
    }

    /// Keep the current value for this tick so no edge is reported
    pub fn hold(&mut self) {
        self.old = self.new.clone();
    }

    /// Refresh with a successful read, or hold on a failed one
    pub fn update(&mut self, read: Option<T>) {
        match read {
            Some(raw) => self.refresh(raw),
            None => self.hold(),
        }
    }

    /// Whether at least one read has succeeded
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// `old != new`
    pub fn changed(&self) -> bool {
        self.initialized && self.old != self.new
    }

    /// The value changed this tick and is now `value`
    pub fn changed_to(&self, value: &T) -> bool {
        self.changed() && self.new == *value
    }

    /// `pred` was false for `old` and is true for `new`
    pub fn became(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.initialized && !pred(&self.old) && pred(&self.new)
    }

    /// Forget both values
    pub fn clear(&mut self)
    where
        T: Default,
    {
        *self = Self::new();
    }
}

impl<T: Clone + PartialOrd> ValueSnapshot<T> {
    /// `old < new`
    pub fn increased(&self) -> bool {
        self.initialized && self.old < self.new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_refresh_sets_both() {
        let mut snap = ValueSnapshot::<i32>::new();
        assert!(!snap.is_initialized());

        snap.refresh(5);
        assert_eq!((snap.old, snap.new), (5, 5));
        assert!(!snap.changed());
    }

    #[test]
    fn test_refresh_shifts() {
        let mut snap = ValueSnapshot::new();
        snap.refresh(1);
        snap.refresh(2);
        assert_eq!((snap.old, snap.new), (1, 2));
        assert!(snap.changed());
        assert!(snap.increased());

        snap.refresh(2);
        assert!(!snap.changed());
    }

    #[test]
    fn test_hold_reports_no_edge() {
        let mut snap = ValueSnapshot::new();
        snap.refresh(0.4f32);
        snap.refresh(0.6f32);
        assert!(snap.increased());

        snap.update(None);
        assert_eq!((snap.old, snap.new), (0.6, 0.6));
        assert!(!snap.increased());
    }

    #[test]
    fn test_changed_to() {
        let mut snap = ValueSnapshot::new();
        snap.refresh(String::new());
        snap.refresh("lvl_A".to_string());

        assert!(snap.changed_to(&"lvl_A".to_string()));
        assert!(!snap.changed_to(&"lvl_B".to_string()));
    }

    #[test]
    fn test_became_absent_to_present() {
        let mut snap = ValueSnapshot::<usize>::new();
        snap.refresh(0);
        snap.refresh(0x1234);
        assert!(snap.became(|p| *p != 0));

        snap.refresh(0x5678);
        assert!(!snap.became(|p| *p != 0));
    }

    #[test]
    fn test_uninitialized_reports_nothing() {
        let mut snap = ValueSnapshot::<i32>::new();
        snap.update(None);
        assert!(!snap.changed());
        assert!(!snap.became(|v| *v == 0));
        assert!(!snap.is_initialized());
    }
}
