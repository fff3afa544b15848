//! Bridge Module
//!
//! Turns "issue now, callback later" store operations into blocking calls.
//!
//! ## Protocol
//! ```text
//!   caller thread                         store I/O thread
//!   ─────────────                         ────────────────
//!   completion(kind) ─► (Completer, Completion)
//!   send(request, callback{Completer}) ──────►
//!   Completion::wait
//!     lock slot
//!     while Pending: condvar.wait ◄────── Completer::complete(code, payload)
//!                                            lock slot, set Completed,
//!                                            notify_all
//!     take (code, payload)
//! ```
//!
//! ## Invariants
//! - One slot per in-flight call, carried inside the callback closure.
//!   Calls of the same kind never share state.
//! - A slot goes Pending → Completed at most once; `Completer::complete`
//!   consumes the completer.
//! - A completer dropped without completing marks the slot abandoned, so a
//!   lost callback cannot leave the waiter blocked.
//! - A non-zero code still completes the wait, as `OperationFailed`.
//! - Waits can be bounded by a timeout and woken by a [`CancelHandle`].

use std::fmt;

mod completion;
mod sync;

pub use completion::{completion, CancelHandle, Completer, Completion, Phase};
pub use sync::{issue, SyncBridge};

/// Kinds of bridged operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Get,
    Put,
    Delete,
    Scan,
    ClientDisconnect,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Get => "Get",
            OperationKind::Put => "Put",
            OperationKind::Delete => "Delete",
            OperationKind::Scan => "Scan",
            OperationKind::ClientDisconnect => "ClientDisconnect",
        };
        f.write_str(name)
    }
}
