//! Cross-thread hand-off from the contacts gateway to the owning thread.
//!
//! Gateway notifications and access answers may arrive on any thread. They
//! only flip flags here; `StateController::process_pending_changes` applies
//! them on the thread that owns the controller.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::types::AccessResult;

#[derive(Debug, Default)]
pub(crate) struct RefreshSignal {
    pending: AtomicBool,
    suppressed: AtomicBool,
    access: Mutex<Option<AccessResult>>,
}

impl RefreshSignal {
    /// Record a "database changed" notification. Dropped while suppressed.
    pub(crate) fn raise(&self) {
        if self.suppressed.load(Ordering::SeqCst) {
            log::debug!("Ignoring contacts change notification during local mutation");
            return;
        }
        self.pending.store(true, Ordering::SeqCst);
    }

    pub(crate) fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::SeqCst)
    }

    /// Set suppression, returning the previous value.
    pub(crate) fn set_suppressed(&self, suppressed: bool) -> bool {
        self.suppressed.swap(suppressed, Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn is_suppressed(&self) -> bool {
        self.suppressed.load(Ordering::SeqCst)
    }

    pub(crate) fn record_access(&self, result: AccessResult) {
        *self.access.lock() = Some(result);
    }

    pub(crate) fn take_access(&self) -> Option<AccessResult> {
        self.access.lock().take()
    }
}

/// Restores the previous suppression state when dropped, including on unwind.
pub(crate) struct SuppressionGuard {
    signal: Arc<RefreshSignal>,
    previous: bool,
}

impl SuppressionGuard {
    pub(crate) fn enter(signal: Arc<RefreshSignal>) -> Self {
        let previous = signal.set_suppressed(true);
        Self { signal, previous }
    }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        self.signal.set_suppressed(self.previous);
    }
}
