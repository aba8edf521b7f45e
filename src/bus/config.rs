use std::time::Duration;

/// Construction-time settings for an [`EventBus`](super::EventBus).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBusConfig {
    /// Label used in log lines.
    pub name: String,

    /// Upper bound on how long an operation waits for the registry lock.
    ///
    /// `None` blocks until the lock is acquired. With `Some`, an operation
    /// that times out performs no state change.
    pub lock_timeout: Option<Duration>,

    /// Number of distinct event types to reserve room for.
    pub initial_capacity: usize,
}

impl EventBusConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            name: String::from("event-bus"),
            lock_timeout: None,
            initial_capacity: 0,
        }
    }
}
