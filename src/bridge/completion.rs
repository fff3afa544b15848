//! Per-call completion slot
//!
//! A monitor (mutex + condvar) guarding the state of exactly one in-flight
//! operation. The [`Completer`] half travels with the callback; the
//! [`Completion`] half stays with the waiting caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::OperationKind;
use crate::error::{ConnectorError, Result};
use crate::store::CODE_OK;

/// Lifecycle of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Completed,
}

struct SlotState<T> {
    phase: Phase,
    code: i32,
    payload: Option<T>,
    /// Completed by dropping the completer rather than by a callback
    abandoned: bool,
    /// Waiter asked to stop waiting
    cancelled: bool,
}

struct Slot<T> {
    kind: OperationKind,
    state: Mutex<SlotState<T>>,
    completed: Condvar,
}

impl<T> Slot<T> {
    fn finish(&self, code: i32, payload: Option<T>, abandoned: bool) {
        {
            let mut state = self.state.lock();
            if state.phase == Phase::Completed {
                return;
            }
            state.phase = Phase::Completed;
            state.code = code;
            state.payload = payload;
            state.abandoned = abandoned;
        }
        self.completed.notify_all();
    }
}

/// Create the two halves of a fresh, pending slot
pub fn completion<T>(kind: OperationKind) -> (Completer<T>, Completion<T>) {
    let slot = Arc::new(Slot {
        kind,
        state: Mutex::new(SlotState {
            phase: Phase::Pending,
            code: CODE_OK,
            payload: None,
            abandoned: false,
            cancelled: false,
        }),
        completed: Condvar::new(),
    });

    (
        Completer {
            kind,
            slot: Some(Arc::clone(&slot)),
        },
        Completion { slot },
    )
}

// =============================================================================
// Completer
// =============================================================================

/// Callback-side half of a slot
pub struct Completer<T> {
    kind: OperationKind,
    slot: Option<Arc<Slot<T>>>,
}

impl<T> Completer<T> {
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Publish the result and wake the waiter
    pub fn complete(mut self, code: i32, payload: Option<T>) {
        if let Some(slot) = self.slot.take() {
            tracing::trace!(kind = %self.kind, code, "operation completed");
            slot.finish(code, payload, false);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            tracing::trace!(kind = %self.kind, "callback dropped before completion");
            slot.finish(CODE_OK, None, true);
        }
    }
}

// =============================================================================
// Completion
// =============================================================================

/// Waiter-side half of a slot
pub struct Completion<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Completion<T> {
    pub fn kind(&self) -> OperationKind {
        self.slot.kind
    }

    pub fn phase(&self) -> Phase {
        self.slot.state.lock().phase
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == Phase::Completed
    }

    /// Block until the callback fires
    pub fn wait(self) -> Result<T> {
        self.wait_until(None)
    }

    /// Block until the callback fires or `timeout` elapses
    pub fn wait_timeout(self, timeout: Duration) -> Result<T> {
        self.wait_until(Some(Instant::now() + timeout))
    }

    fn wait_until(self, deadline: Option<Instant>) -> Result<T> {
        let kind = self.slot.kind;
        let mut state = self.slot.state.lock();

        // Loop guards against spurious wakeups
        while state.phase == Phase::Pending {
            if state.cancelled {
                return Err(ConnectorError::Cancelled { kind });
            }

            match deadline {
                Some(deadline) => {
                    let result = self.slot.completed.wait_until(&mut state, deadline);
                    if result.timed_out() && state.phase == Phase::Pending && !state.cancelled {
                        return Err(ConnectorError::Timeout { kind });
                    }
                }
                None => self.slot.completed.wait(&mut state),
            }
        }

        if state.abandoned {
            // Issue-time rejections also drop the callback but never reach a waiter
            tracing::warn!(%kind, "operation abandoned without a callback");
            return Err(ConnectorError::OperationAbandoned { kind });
        }
        if state.code != CODE_OK {
            return Err(ConnectorError::OperationFailed {
                kind,
                code: state.code,
            });
        }
        state
            .payload
            .take()
            .ok_or(ConnectorError::EmptyResult { kind })
    }
}

impl<T: Send + 'static> Completion<T> {
    /// A handle that wakes this call's waiter with `Cancelled`
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            slot: Arc::clone(&self.slot) as Arc<dyn Cancel>,
        }
    }
}

// =============================================================================
// Cancellation
// =============================================================================

trait Cancel: Send + Sync {
    fn cancel(&self);
}

impl<T: Send> Cancel for Slot<T> {
    fn cancel(&self) {
        {
            let mut state = self.state.lock();
            if state.phase == Phase::Completed {
                return;
            }
            state.cancelled = true;
        }
        self.completed.notify_all();
    }
}

/// Cancels one pending wait. Has no effect once the call has completed.
#[derive(Clone)]
pub struct CancelHandle {
    slot: Arc<dyn Cancel>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.slot.cancel();
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle").finish_non_exhaustive()
    }
}
