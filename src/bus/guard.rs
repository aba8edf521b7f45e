use std::time::Duration;

use parking_lot::{
    RwLock,
    RwLockReadGuard,
    RwLockWriteGuard
};

use super::EventBusError;

/// Reader/writer discipline around the registry.
///
/// Shared access is taken by `publish` and the counting operations,
/// exclusive access by everything that mutates. Guards are never held while
/// user code runs: dispatch copies what it needs and drops the guard first,
/// and evicted handlers are dropped only after the exclusive guard is gone.
/// That is what lets a handler subscribe or unregister on the same bus from
/// inside a dispatch without deadlocking.
pub (crate) struct ConcurrencyGuard<T> {
    lock: RwLock<T>,
    timeout: Option<Duration>,
}

impl<T> ConcurrencyGuard<T> {

    pub fn new(value: T, timeout: Option<Duration>) -> Self {
        Self {
            lock: RwLock::new(value),
            timeout,
        }
    }

    pub fn shared(&self) -> Result<RwLockReadGuard<'_, T>, EventBusError> {
        match self.timeout {
            None => Ok(self.lock.read()),
            Some(timeout) => self.lock
                .try_read_for(timeout)
                .ok_or(EventBusError::LockUnavailable),
        }
    }

    pub fn exclusive(&self) -> Result<RwLockWriteGuard<'_, T>, EventBusError> {
        match self.timeout {
            None => Ok(self.lock.write()),
            Some(timeout) => self.lock
                .try_write_for(timeout)
                .ok_or(EventBusError::LockUnavailable),
        }
    }
}
