//! Typed, in-process publish/subscribe.
//!
//! Handlers register for a payload type on an [`EventBus`] and receive every
//! value of that type published afterwards. Registration hands back a
//! [`Subscription`] that unregisters the handler when dropped.
//!
//! ```
//! use typebus::EventBus;
//!
//! struct Resized { width: u32 }
//!
//! let bus = EventBus::new();
//! let _sub = bus.subscribe::<Resized, _>(|e: &Resized| println!("width {}", e.width));
//! bus.publish(Resized { width: 640 });
//! ```

use thiserror::Error;

#[macro_use]
pub (crate) mod logging;

mod id;

pub mod bus;

pub use id::SubscriptionId;
pub use bus::{
    DispatchReport,
    EventBus,
    EventBusConfig,
    EventBusError,
    HandlerError,
    HandlerResult,
    IntoHandler,
    IntoMethodHandler,
    Subscription
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Event bus error: {0}")]
    Bus(#[from] EventBusError),

    #[error("Global event bus already initialized")]
    AlreadyInitialized,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(feature = "global")]
static GLOBAL_BUS: once_cell::sync::OnceCell<EventBus> = once_cell::sync::OnceCell::new();

/// Process-wide bus for applications that want one.
///
/// Created with default settings on first use unless [`init_global`] ran
/// first. Libraries should take an `&EventBus` instead of reaching for this.
#[cfg(feature = "global")]
pub fn global() -> &'static EventBus {
    GLOBAL_BUS.get_or_init(|| {
        EventBus::with_config(EventBusConfig::new().with_name("global"))
    })
}

/// Configures the process-wide bus. Fails once it has been created.
#[cfg(feature = "global")]
pub fn init_global(config: EventBusConfig) -> Result<()> {
    GLOBAL_BUS
        .set(EventBus::with_config(config))
        .map_err(|_| Error::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc
    };

    use super::*;

    struct GlobalPing;

    #[cfg(feature = "global")]
    #[test]
    fn test_global_bus_is_shared() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = global().subscribe::<GlobalPing, _>(move || { h.fetch_add(1, Ordering::SeqCst); });

        assert!(std::ptr::eq(global(), global()));
        global().publish(GlobalPing);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        drop(sub);
        global().publish(GlobalPing);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(global().count_of::<GlobalPing>(), 0);
    }

    #[cfg(feature = "global")]
    #[test]
    fn test_init_after_use_fails() {
        let _ = global();
        assert!(matches!(
            init_global(EventBusConfig::new()),
            Err(Error::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_error_conversion() {
        let err: Error = EventBusError::LockUnavailable.into();
        assert_eq!(err.to_string(), "Event bus error: Timed out waiting for the registry lock");
    }
}
