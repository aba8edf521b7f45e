use std::{
    any::{type_name, Any},
    panic::{self, AssertUnwindSafe}
};

use crate::SubscriptionId;
use super::handler::{Invocation, Invoker};

/// What happened during one `publish` call.
///
/// Publishing is fire-and-forget, so callers are free to ignore this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that ran to completion.
    pub delivered: usize,

    /// Handlers that panicked or returned an error.
    pub failed: usize,

    /// Method handlers whose target had already been dropped.
    pub skipped: usize,
}

impl DispatchReport {
    /// Size of the dispatch set this call worked through.
    pub fn total(&self) -> usize {
        self.delivered + self.failed + self.skipped
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Runs every invoker of an already captured dispatch set.
///
/// Must be called without the registry lock held. A failure in one handler
/// is logged and counted, and never stops the rest of the set.
pub (crate) fn dispatch<E: 'static>(
    bus_name: &str,
    dispatch_set: Vec<(SubscriptionId, Invoker<E>)>,
    event: &E,
) -> DispatchReport {
    let mut report = DispatchReport::default();

    for (id, invoker) in dispatch_set {
        match panic::catch_unwind(AssertUnwindSafe(|| invoker(event))) {
            Ok(Invocation::Delivered) => report.delivered += 1,
            Ok(Invocation::Failed(e)) => {
                error!(
                    "[{}] Handler {} for {} failed: {}",
                    bus_name, id, type_name::<E>(), e
                );
                report.failed += 1;
            },
            Ok(Invocation::TargetGone) => {
                debug!(
                    "[{}] Handler {} for {} skipped: target dropped",
                    bus_name, id, type_name::<E>()
                );
                report.skipped += 1;
            },
            Err(payload) => {
                error!(
                    "[{}] Handler {} for {} panicked: {}",
                    bus_name, id, type_name::<E>(), panic_message(payload.as_ref())
                );
                report.failed += 1;
            }
        }
    }

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}
