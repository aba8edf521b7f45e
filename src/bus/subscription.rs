use std::{
    fmt,
    sync::{Arc, Weak}
};

use crate::SubscriptionId;
use super::{BusInner, EventBusError};

/// Exclusive right to remove one handler from an [`EventBus`](super::EventBus).
///
/// Dropping the subscription unregisters its handler. Once the handler is
/// gone, whether through this handle, [`EventBus::clear_all`](super::EventBus::clear_all)
/// or the bus itself going away, the handle is inert and further removal
/// attempts return `false`.
///
/// The handle only holds a weak reference to the bus, so it never keeps the
/// bus alive.
#[must_use = "dropping a Subscription immediately unregisters its handler"]
pub struct Subscription {
    id: Option<SubscriptionId>,
    bus: Weak<BusInner>,
}

impl Subscription {

    pub (crate) fn new(id: SubscriptionId, bus: &Arc<BusInner>) -> Self {
        Self {
            id: Some(id),
            bus: Arc::downgrade(bus),
        }
    }

    pub fn id(&self) -> Option<SubscriptionId> {
        self.id
    }

    /// Whether the handler behind this handle is still registered.
    ///
    /// If the registry lock cannot be acquired in time, a handle that still
    /// holds its id is reported as active.
    pub fn is_active(&self) -> bool {
        let Some(id) = self.id else { return false; };
        match self.bus.upgrade() {
            Some(bus) => bus.contains(id).unwrap_or(true),
            None => false,
        }
    }

    /// Unregisters the handler. Returns `false` if there was nothing to remove.
    pub fn unsubscribe(&mut self) -> bool {
        self.try_unsubscribe().is_ok()
    }

    pub fn try_unsubscribe(&mut self) -> Result<(), EventBusError> {
        let id = self.id.ok_or(EventBusError::InactiveSubscription)?;

        let Some(bus) = self.bus.upgrade() else {
            self.id = None;
            return Err(EventBusError::UnknownSubscription(id));
        };

        match bus.remove(id) {
            // Nothing changed, so the handle keeps its right to retry.
            Err(EventBusError::LockUnavailable) => Err(EventBusError::LockUnavailable),
            result => {
                self.id = None;
                result
            }
        }
    }

    /// Gives up the right to remove the handler. It stays registered until
    /// the bus is cleared or dropped.
    pub fn detach(mut self) {
        self.id = None;
    }

    pub (crate) fn belongs_to(&self, bus: &Arc<BusInner>) -> bool {
        std::ptr::eq(self.bus.as_ptr(), Arc::as_ptr(bus))
    }
}

impl Default for Subscription {
    /// An inert handle that owns nothing.
    fn default() -> Self {
        Self {
            id: None,
            bus: Weak::new(),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.id.is_none() { return; }
        if let Err(EventBusError::LockUnavailable) = self.try_unsubscribe() {
            warn!(
                "Subscription {} dropped while the registry was locked; handler stays registered",
                self.id.map(|id| id.to_string()).unwrap_or_default()
            );
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("bus_alive", &(self.bus.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::EventBus;

    struct Tick;

    #[test]
    fn test_default_is_inert() {
        let mut sub = Subscription::default();
        assert_eq!(sub.id(), None);
        assert!(!sub.is_active());
        assert!(!sub.unsubscribe());
        assert!(matches!(
            sub.try_unsubscribe(),
            Err(EventBusError::InactiveSubscription)
        ));
    }

    #[test]
    fn test_drop_unregisters() {
        let bus = EventBus::new();
        let sub = bus.subscribe::<Tick, _>(|| {});
        assert!(sub.is_active());
        assert_eq!(bus.count(), 1);
        drop(sub);
        assert_eq!(bus.count(), 0);
    }

    #[test]
    fn test_second_unsubscribe_is_a_no_op() {
        let bus = EventBus::new();
        let _other = bus.subscribe::<Tick, _>(|| {});
        let mut sub = bus.subscribe::<Tick, _>(|| {});
        assert!(sub.unsubscribe());
        assert!(!sub.unsubscribe());
        assert!(!sub.is_active());
        assert_eq!(sub.id(), None);
        assert_eq!(bus.count(), 1);
    }

    #[test]
    fn test_move_transfers_ownership() {
        let bus = EventBus::new();
        let sub = bus.subscribe::<Tick, _>(|| {});
        let id = sub.id();

        let mut holder = Vec::new();
        holder.push(sub);
        assert_eq!(holder[0].id(), id);
        assert_eq!(bus.count(), 1);

        let moved = std::mem::take(&mut holder[0]);
        assert_eq!(holder[0].id(), None);
        drop(holder);
        assert_eq!(bus.count(), 1);

        drop(moved);
        assert_eq!(bus.count(), 0);
    }

    #[test]
    fn test_detach_keeps_handler() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        bus.subscribe::<Tick, _>(move || { h.fetch_add(1, Ordering::SeqCst); }).detach();

        assert_eq!(bus.count(), 1);
        bus.publish(Tick);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        bus.clear_all();
        assert_eq!(bus.count(), 0);
    }

    #[test]
    fn test_outliving_the_bus_is_harmless() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe::<Tick, _>(|| {});
        drop(bus);
        assert!(!sub.is_active());
        assert!(!sub.unsubscribe());
    }

    #[test]
    fn test_cleared_handle_reports_unknown() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe::<Tick, _>(|| {});
        let id = sub.id().unwrap();
        bus.clear_all();
        assert!(!sub.is_active());
        match sub.try_unsubscribe() {
            Err(EventBusError::UnknownSubscription(unknown)) => assert_eq!(unknown, id),
            other => panic!("unexpected {:?}", other),
        }
    }
}
