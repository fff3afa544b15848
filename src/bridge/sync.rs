//! Blocking wrappers over the store's callback API

use std::time::{Duration, Instant};

use super::{completion, Completion, OperationKind};
use crate::error::{ConnectorError, Result};
use crate::store::{Callback, Client, DeleteRequest, GetRequest, PutRequest, Row, ScanRequest};

/// Issue one operation with a fresh slot and return its waiter half
///
/// `send` receives the callback to register. If it fails synchronously the
/// error is returned as-is and nothing waits.
pub fn issue<T, F>(kind: OperationKind, send: F) -> Result<Completion<T>>
where
    T: Send + 'static,
    F: FnOnce(Callback<T>) -> Result<()>,
{
    let (completer, completion) = completion(kind);
    let callback: Callback<T> = Box::new(move |code, payload| completer.complete(code, payload));

    match send(callback) {
        Ok(()) => Ok(completion),
        Err(e) => {
            tracing::debug!(%kind, error = %e, "operation rejected at issue");
            Err(e)
        }
    }
}

/// Runs store operations to completion on the calling thread
///
/// The timeout bounds data operations only. Client teardown is always
/// waited out in full, so a connection is never closed under a client that
/// is still being destroyed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncBridge {
    timeout: Option<Duration>,
}

impl SyncBridge {
    /// Unbounded waits
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each data-operation wait by `timeout` (`None` = unbounded)
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get(&self, client: &dyn Client, request: GetRequest) -> Result<Row> {
        self.run(OperationKind::Get, |cb| client.send_get(request, cb))
    }

    pub fn put(&self, client: &dyn Client, request: PutRequest) -> Result<()> {
        unit(self.run(OperationKind::Put, |cb| client.send_put(request, cb)))
    }

    pub fn delete(&self, client: &dyn Client, request: DeleteRequest) -> Result<()> {
        unit(self.run(OperationKind::Delete, |cb| client.send_delete(request, cb)))
    }

    pub fn scan(&self, client: &dyn Client, request: ScanRequest) -> Result<Vec<Row>> {
        self.run(OperationKind::Scan, |cb| client.send_scan(request, cb))
    }

    /// Destroy a client and wait, without a deadline, for the teardown callback
    pub fn destroy_client(&self, client: Box<dyn Client>) -> Result<()> {
        unit(self.run_with(OperationKind::ClientDisconnect, None, move |cb| {
            client.destroy(cb)
        }))
    }

    fn run<T, F>(&self, kind: OperationKind, send: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Callback<T>) -> Result<()>,
    {
        self.run_with(kind, self.timeout, send)
    }

    fn run_with<T, F>(&self, kind: OperationKind, timeout: Option<Duration>, send: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(Callback<T>) -> Result<()>,
    {
        let start = Instant::now();
        let completion = issue(kind, send)?;

        let result = match timeout {
            Some(timeout) => completion.wait_timeout(timeout),
            None => completion.wait(),
        };

        tracing::debug!(
            %kind,
            ok = result.is_ok(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "bridged operation finished"
        );
        result
    }
}

/// Unit operations may complete successfully without a payload
fn unit(result: Result<()>) -> Result<()> {
    match result {
        Err(ConnectorError::EmptyResult { .. }) => Ok(()),
        other => other,
    }
}
