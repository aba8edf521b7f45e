use std::{
    fmt,
    sync::atomic::{
        AtomicU64,
        Ordering
    }
};

/// Opaque identity of one registered handler.
///
/// Ids are handed out by a per-bus counter and never reused by that bus, so
/// an id that outlived its entry can never name a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub (crate) fn new(val: u64) -> Self {
        Self(val)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug)]
pub (crate) struct IdGenerator {
    next: AtomicU64
}

impl IdGenerator {
    pub fn new(first: u64) -> Self {
        Self { next: AtomicU64::new(first) }
    }

    pub fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let ids = IdGenerator::new(1);
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(a.as_u64(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(SubscriptionId::new(42).to_string(), "#42");
    }
}
