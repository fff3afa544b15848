//! Store Module
//!
//! The seam between the connector and a column store client library.
//!
//! ## Responsibilities
//! - Open connections to an endpoint and create clients from them
//! - Issue operations that complete later through a callback
//! - Tear clients down asynchronously
//!
//! ## Handle Lifetimes
//! ```text
//!   connect ──► Connection ──► create_client ──► Client
//!                   ▲                              │
//!                   │      destroy (async) ◄───────┘
//!   close ──────────┘  (only after destroy completed)
//! ```
//!
//! Callbacks may run on any thread the implementation owns. Every callback
//! is invoked at most once; an implementation that drops a callback without
//! invoking it is tolerated (see [`crate::bridge`]).

mod types;
pub mod memory;

pub use types::{Cell, DeleteRequest, GetRequest, PutRequest, Row, ScanRequest};
pub use memory::{FaultPlan, MemoryStore, StoreEvent};

use crate::error::Result;

/// Completion code for a successful operation
pub const CODE_OK: i32 = 0;

/// Completion callback: `(code, payload)`
///
/// Whatever the closure captures plays the role of per-call user data.
pub type Callback<T> = Box<dyn FnOnce(i32, Option<T>) + Send + 'static>;

/// Opens connections to a store endpoint
pub trait StoreConnector: Send + Sync {
    fn connect(&self, endpoint: &str) -> Result<Box<dyn Connection>>;
}

/// An open connection; must outlive every client created from it
pub trait Connection: Send {
    fn create_client(&self) -> Result<Box<dyn Client>>;

    /// Release the connection. Callers destroy all clients first.
    fn close(self: Box<Self>);
}

/// Issues asynchronous operations
///
/// Each `send_*` either returns `Ok` and later invokes the callback exactly
/// once, or returns `Err` synchronously.
pub trait Client: Send + Sync {
    fn send_get(&self, request: GetRequest, callback: Callback<Row>) -> Result<()>;

    fn send_put(&self, request: PutRequest, callback: Callback<()>) -> Result<()>;

    fn send_delete(&self, request: DeleteRequest, callback: Callback<()>) -> Result<()>;

    fn send_scan(&self, request: ScanRequest, callback: Callback<Vec<Row>>) -> Result<()>;

    /// Begin asynchronous teardown; the callback fires once the client's
    /// outstanding operations have completed.
    fn destroy(self: Box<Self>, callback: Callback<()>) -> Result<()>;
}
