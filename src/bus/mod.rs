mod config;
mod dispatch;
mod guard;
mod handler;
mod registry;
mod subscription;

pub use config::EventBusConfig;
pub use dispatch::DispatchReport;
pub use handler::{
    Fallible,
    HandlerError,
    HandlerResult,
    IntoHandler,
    IntoMethodHandler,
    NoPayload,
    WithPayload
};
pub use subscription::Subscription;

use std::{
    any::type_name,
    fmt,
    sync::Arc
};

use thiserror::Error;

use crate::{id::IdGenerator, SubscriptionId};
use guard::ConcurrencyGuard;
use handler::Invoker;
use registry::EventRegistry;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EventBusError {
    #[error("Timed out waiting for the registry lock")]
    LockUnavailable,

    #[error("Subscription {0} is not registered")]
    UnknownSubscription(SubscriptionId),

    #[error("Subscription belongs to a different bus")]
    ForeignSubscription,

    #[error("Subscription handle is inactive")]
    InactiveSubscription,
}

pub (crate) struct BusInner {
    name: String,
    ids: IdGenerator,
    registry: ConcurrencyGuard<EventRegistry>,
}

impl BusInner {

    pub (crate) fn remove(&self, id: SubscriptionId) -> Result<(), EventBusError> {
        let evicted = {
            let mut registry = self.registry.exclusive()?;
            registry.remove(id)
        };

        // The evicted handler may own other subscriptions; it is dropped
        // here, after the exclusive guard has been released.
        match evicted {
            Some(handler) => {
                drop(handler);
                debug!("[{}] Unregistered handler {}", self.name, id);
                Ok(())
            },
            None => {
                debug!("[{}] Handler {} was not registered", self.name, id);
                Err(EventBusError::UnknownSubscription(id))
            }
        }
    }

    pub (crate) fn contains(&self, id: SubscriptionId) -> Result<bool, EventBusError> {
        Ok(self.registry.shared()?.contains(id))
    }
}

/// Typed, in-process publish/subscribe dispatcher.
///
/// Handlers are registered per payload type and invoked synchronously, on
/// the publishing thread, for every value of that type published afterwards.
/// Cloning the bus is cheap and every clone shares the same registry.
///
/// A handler may subscribe or unregister on the same bus while it is being
/// invoked. Such changes apply from the next `publish` onwards: each
/// `publish` works on the set of handlers registered at the moment it
/// started.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {

    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    pub fn with_config(config: EventBusConfig) -> Self {
        info!(
            "Creating event bus '{}' (lock timeout: {:?})",
            config.name, config.lock_timeout
        );
        Self {
            inner: Arc::new(BusInner {
                ids: IdGenerator::new(1),
                registry: ConcurrencyGuard::new(
                    EventRegistry::with_capacity(config.initial_capacity),
                    config.lock_timeout
                ),
                name: config.name,
            })
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Registers `handler` for events of type `E`.
    ///
    /// `handler` may take no arguments, take `&E`, or take `&E` and return a
    /// `Result`. If the registry lock cannot be acquired in time nothing is
    /// registered and an inert subscription is returned.
    pub fn subscribe<E: 'static, M>(
        &self,
        handler: impl IntoHandler<E, M>
    ) -> Subscription {
        self.try_subscribe(handler).unwrap_or_else(|e| {
            warn!("[{}] Failed to subscribe to {}: {}", self.inner.name, type_name::<E>(), e);
            Subscription::default()
        })
    }

    pub fn try_subscribe<E: 'static, M>(
        &self,
        handler: impl IntoHandler<E, M>
    ) -> Result<Subscription, EventBusError> {
        self.insert(handler.into_invoker())
    }

    /// Registers a method of `target` for events of type `E`.
    ///
    /// Only a weak reference to `target` is kept: the subscription never
    /// keeps it alive, and once it is dropped the method is skipped.
    pub fn subscribe_method<E: 'static, T: Send + Sync + 'static, M>(
        &self,
        target: &Arc<T>,
        method: impl IntoMethodHandler<T, E, M>
    ) -> Subscription {
        self.try_subscribe_method(target, method).unwrap_or_else(|e| {
            warn!(
                "[{}] Failed to subscribe {} to {}: {}",
                self.inner.name, type_name::<T>(), type_name::<E>(), e
            );
            Subscription::default()
        })
    }

    pub fn try_subscribe_method<E: 'static, T: Send + Sync + 'static, M>(
        &self,
        target: &Arc<T>,
        method: impl IntoMethodHandler<T, E, M>
    ) -> Result<Subscription, EventBusError> {
        self.insert(method.bind(Arc::downgrade(target)))
    }

    fn insert<E: 'static>(&self, invoker: Invoker<E>) -> Result<Subscription, EventBusError> {
        let id = self.inner.ids.next_id();
        self.inner.registry.exclusive()?.insert(id, invoker);
        debug!("[{}] Registered handler {} for {}", self.inner.name, id, type_name::<E>());
        Ok(Subscription::new(id, &self.inner))
    }

    /// Broadcasts `event` to every handler registered for `E`.
    pub fn publish<E: 'static>(&self, event: E) -> DispatchReport {
        self.publish_ref(&event)
    }

    pub fn publish_ref<E: 'static>(&self, event: &E) -> DispatchReport {
        let snapshot = match self.inner.registry.shared() {
            Ok(registry) => registry.snapshot::<E>(),
            Err(e) => {
                warn!("[{}] Dropping {} event: {}", self.inner.name, type_name::<E>(), e);
                return DispatchReport::default();
            }
        };

        match snapshot {
            Ok(dispatch_set) => dispatch::dispatch(&self.inner.name, dispatch_set, event),
            Err(e) => {
                error!("[{}] {}", self.inner.name, e);
                DispatchReport::default()
            }
        }
    }

    /// Removes the handler owned by `subscription` and disarms the handle.
    ///
    /// Returns `false` if the handle is inert, was already used, belongs to
    /// another bus, or the registry lock was unavailable.
    pub fn unregister(&self, subscription: &mut Subscription) -> bool {
        self.try_unregister(subscription).is_ok()
    }

    pub fn try_unregister(&self, subscription: &mut Subscription) -> Result<(), EventBusError> {
        if subscription.id().is_none() {
            return Err(EventBusError::InactiveSubscription);
        }
        if !subscription.belongs_to(&self.inner) {
            return Err(EventBusError::ForeignSubscription);
        }
        subscription.try_unsubscribe()
    }

    /// Removes every handler. Outstanding subscriptions become inert.
    pub fn clear_all(&self) {
        let evicted = match self.inner.registry.exclusive() {
            Ok(mut registry) => registry.clear(),
            Err(e) => {
                warn!("[{}] Failed to clear handlers: {}", self.inner.name, e);
                return;
            }
        };
        debug!("[{}] Cleared {} handler group(s)", self.inner.name, evicted.len());
        drop(evicted);
    }

    /// Number of registered handlers across all event types.
    pub fn count(&self) -> usize {
        self.inner.registry.shared().map_or(0, |registry| registry.len())
    }

    pub fn count_of<E: 'static>(&self) -> usize {
        self.inner.registry.shared().map_or(0, |registry| registry.len_of::<E>())
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}
