//! In-memory column store
//!
//! A reference implementation of the store traits. Each connection owns one
//! I/O thread fed by a crossbeam channel; every callback is invoked on that
//! thread, never on the caller's. A [`FaultPlan`] can make the store refuse
//! connections or clients, reject operations at issue, report error codes,
//! delay, drop, or stall callbacks.
//!
//! A client counts its in-flight operations; `destroy` is deferred until the
//! last one has called back or been released. The lifecycle event log keeps
//! at most [`DEFAULT_EVENT_CAPACITY`] entries unless configured otherwise.
//!
//! ## Layout
//! ```text
//! table ─► row key ─► (family, qualifier) ─► versions, newest first
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::ops::Bound;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use super::{
    Callback, Cell, Client, Connection, DeleteRequest, GetRequest, PutRequest, Row, ScanRequest,
    StoreConnector, CODE_OK,
};
use crate::bridge::OperationKind;
use crate::error::{ConnectorError, Result};

/// Completion code for an operation on a table that does not exist
pub const CODE_TABLE_NOT_FOUND: i32 = 2;

/// Events retained by [`MemoryStore::new`]; older ones are discarded first
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

type ColumnKey = (Bytes, Bytes);
type Versions = Vec<(i64, Bytes)>;
type StoredRow = BTreeMap<ColumnKey, Versions>;
type Table = BTreeMap<Bytes, StoredRow>;

/// Failures and delays to inject
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    /// `connect` fails
    pub refuse_connect: bool,
    /// `create_client` fails
    pub refuse_client: bool,
    /// `send_*` fails synchronously
    pub reject_issue: bool,
    /// Data callbacks report this code instead of running
    pub fail_code: Option<i32>,
    /// Sleep on the I/O thread before each data callback
    pub callback_delay: Option<Duration>,
    /// Data callbacks are dropped without being invoked
    pub drop_callbacks: bool,
    /// Data callbacks are parked until [`MemoryStore::release_stalled`]
    pub stall_callbacks: bool,
}

/// Lifecycle record, in the order things happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Connected { endpoint: String },
    ClientCreated,
    Issued(OperationKind),
    Completed(OperationKind, i32),
    ClientDestroyed,
    ConnectionClosed,
}

struct StoreInner {
    tables: RwLock<BTreeMap<String, Table>>,
    faults: Mutex<FaultPlan>,
    events: Mutex<VecDeque<StoreEvent>>,
    event_capacity: usize,
    stalled: Mutex<Vec<Box<dyn Send>>>,
    clock: AtomicI64,
    io_threads: AtomicUsize,
}

/// Shared handle to an in-memory store
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Keep at most `capacity` lifecycle events (0 disables the log)
    pub fn with_event_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                tables: RwLock::new(BTreeMap::new()),
                faults: Mutex::new(FaultPlan::default()),
                events: Mutex::new(VecDeque::new()),
                event_capacity: capacity,
                stalled: Mutex::new(Vec::new()),
                clock: AtomicI64::new(0),
                io_threads: AtomicUsize::new(0),
            }),
        }
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Create an empty table (no-op if it exists)
    pub fn create_table(&self, name: &str) {
        self.inner
            .tables
            .write()
            .entry(name.to_string())
            .or_default();
    }

    /// Write one cell directly, creating the table if needed
    ///
    /// Returns the assigned timestamp.
    pub fn insert(
        &self,
        table: &str,
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> i64 {
        let timestamp = self.inner.tick();
        self.insert_at(table, row, family, qualifier, value, timestamp);
        timestamp
    }

    /// Write one cell with an explicit timestamp, creating the table if needed
    pub fn insert_at(
        &self,
        table: &str,
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        value: impl Into<Bytes>,
        timestamp: i64,
    ) {
        let mut tables = self.inner.tables.write();
        let table = tables.entry(table.to_string()).or_default();
        let stored = table.entry(row.into()).or_default();
        put_version(stored, (family.into(), qualifier.into()), timestamp, value.into());
    }

    // =========================================================================
    // Fault Injection & Inspection
    // =========================================================================

    pub fn set_faults(&self, faults: FaultPlan) {
        *self.inner.faults.lock() = faults;
    }

    pub fn faults(&self) -> FaultPlan {
        self.inner.faults.lock().clone()
    }

    /// Drop every stalled callback, abandoning its operation
    ///
    /// A client destroy waiting on these operations is queued once they are
    /// gone. Returns how many were released.
    pub fn release_stalled(&self) -> usize {
        let stalled: Vec<_> = self.inner.stalled.lock().drain(..).collect();
        stalled.len()
    }

    /// Retained lifecycle events, oldest first
    pub fn events(&self) -> Vec<StoreEvent> {
        self.inner.events.lock().iter().cloned().collect()
    }

    pub fn clear_events(&self) {
        self.inner.events.lock().clear();
    }

    /// I/O threads currently running
    pub fn io_thread_count(&self) -> usize {
        self.inner.io_threads.load(Ordering::SeqCst)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreConnector for MemoryStore {
    fn connect(&self, endpoint: &str) -> Result<Box<dyn Connection>> {
        if endpoint.trim().is_empty() {
            return Err(ConnectorError::Connection("empty endpoint".to_string()));
        }
        if self.inner.faults.lock().refuse_connect {
            return Err(ConnectorError::Connection(format!(
                "connection to {} refused",
                endpoint
            )));
        }

        let (sender, receiver) = channel::unbounded();
        let id = self.inner.io_threads.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);

        let handle = thread::Builder::new()
            .name(format!("colquery-io-{}", id))
            .spawn(move || {
                io_loop(receiver);
                inner.io_threads.fetch_sub(1, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.inner.io_threads.fetch_sub(1, Ordering::SeqCst);
                ConnectorError::Connection(format!("failed to start I/O thread: {}", e))
            })?;

        self.inner.record(StoreEvent::Connected {
            endpoint: endpoint.to_string(),
        });

        Ok(Box::new(MemoryConnection {
            store: Arc::clone(&self.inner),
            io: sender,
            handle: Some(handle),
        }))
    }
}

// =============================================================================
// I/O Thread
// =============================================================================

enum Job {
    Run(Box<dyn FnOnce() + Send>),
    Shutdown,
}

fn io_loop(receiver: Receiver<Job>) {
    for job in receiver.iter() {
        match job {
            Job::Run(work) => work(),
            Job::Shutdown => break,
        }
    }
}

// =============================================================================
// Connection
// =============================================================================

struct MemoryConnection {
    store: Arc<StoreInner>,
    io: Sender<Job>,
    handle: Option<JoinHandle<()>>,
}

impl MemoryConnection {
    fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Jobs already queued (including client teardown) run first
            let _ = self.io.send(Job::Shutdown);
            if handle.join().is_err() {
                tracing::error!("store I/O thread panicked");
            }
            self.store.record(StoreEvent::ConnectionClosed);
        }
    }
}

impl Connection for MemoryConnection {
    fn create_client(&self) -> Result<Box<dyn Client>> {
        if self.store.faults.lock().refuse_client {
            return Err(ConnectorError::ClientCreate(
                "client creation refused".to_string(),
            ));
        }
        self.store.record(StoreEvent::ClientCreated);
        Ok(Box::new(MemoryClient {
            shared: Arc::new(ClientShared {
                store: Arc::clone(&self.store),
                io: self.io.clone(),
                ops: Mutex::new(InFlight::default()),
            }),
        }))
    }

    fn close(mut self: Box<Self>) {
        self.shutdown();
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Client
// =============================================================================

struct MemoryClient {
    shared: Arc<ClientShared>,
}

struct ClientShared {
    store: Arc<StoreInner>,
    io: Sender<Job>,
    ops: Mutex<InFlight>,
}

#[derive(Default)]
struct InFlight {
    outstanding: usize,
    /// Destroy work waiting for `outstanding` to reach zero
    on_idle: Option<Box<dyn FnOnce() + Send>>,
}

/// Held by one issued operation until its callback is consumed
struct Ticket {
    shared: Arc<ClientShared>,
}

impl Ticket {
    fn acquire(shared: &Arc<ClientShared>) -> Self {
        shared.ops.lock().outstanding += 1;
        Self {
            shared: Arc::clone(shared),
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let on_idle = {
            let mut ops = self.shared.ops.lock();
            ops.outstanding -= 1;
            if ops.outstanding == 0 {
                ops.on_idle.take()
            } else {
                None
            }
        };
        if let Some(work) = on_idle {
            // A closed connection drops the work, abandoning the destroy
            let _ = self.shared.io.send(Job::Run(work));
        }
    }
}

impl MemoryClient {
    /// Queue `work` on the I/O thread and hand its outcome to `callback`
    fn dispatch<T, W>(&self, kind: OperationKind, work: W, callback: Callback<T>) -> Result<()>
    where
        T: Send + 'static,
        W: FnOnce(&StoreInner) -> std::result::Result<T, i32> + Send + 'static,
    {
        let faults = self.shared.store.faults.lock().clone();
        if faults.reject_issue {
            return Err(ConnectorError::IssueFailed {
                kind,
                reason: "rejected by store".to_string(),
            });
        }

        self.shared.store.record(StoreEvent::Issued(kind));
        let store = Arc::clone(&self.shared.store);
        let ticket = Ticket::acquire(&self.shared);

        let job = Job::Run(Box::new(move || {
            if let Some(delay) = faults.callback_delay {
                thread::sleep(delay);
            }
            if faults.drop_callbacks {
                drop(callback);
                drop(ticket);
                return;
            }
            if faults.stall_callbacks {
                // Tuple fields drop in order: callback first, then ticket
                store.stalled.lock().push(Box::new((callback, ticket)));
                return;
            }

            let (code, payload) = match faults.fail_code {
                Some(code) => (code, None),
                None => match work(&*store) {
                    Ok(value) => (CODE_OK, Some(value)),
                    Err(code) => (code, None),
                },
            };
            store.record(StoreEvent::Completed(kind, code));
            callback(code, payload);
            drop(ticket);
        }));

        self.shared.io.send(job).map_err(|_| ConnectorError::IssueFailed {
            kind,
            reason: "connection closed".to_string(),
        })
    }
}

impl Client for MemoryClient {
    fn send_get(&self, request: GetRequest, callback: Callback<Row>) -> Result<()> {
        self.dispatch(OperationKind::Get, move |s| s.get(&request), callback)
    }

    fn send_put(&self, request: PutRequest, callback: Callback<()>) -> Result<()> {
        self.dispatch(OperationKind::Put, move |s| s.put(request), callback)
    }

    fn send_delete(&self, request: DeleteRequest, callback: Callback<()>) -> Result<()> {
        self.dispatch(OperationKind::Delete, move |s| s.delete(&request), callback)
    }

    fn send_scan(&self, request: ScanRequest, callback: Callback<Vec<Row>>) -> Result<()> {
        self.dispatch(OperationKind::Scan, move |s| s.scan(&request), callback)
    }

    fn destroy(self: Box<Self>, callback: Callback<()>) -> Result<()> {
        let store = Arc::clone(&self.shared.store);
        let work: Box<dyn FnOnce() + Send> = Box::new(move || {
            store.record(StoreEvent::ClientDestroyed);
            callback(CODE_OK, Some(()));
        });

        {
            let mut ops = self.shared.ops.lock();
            if ops.outstanding > 0 {
                tracing::debug!(outstanding = ops.outstanding, "client destroy deferred");
                ops.on_idle = Some(work);
                return Ok(());
            }
        }

        self.shared.io.send(Job::Run(work)).map_err(|_| ConnectorError::IssueFailed {
            kind: OperationKind::ClientDisconnect,
            reason: "connection closed".to_string(),
        })
    }
}

// =============================================================================
// Data Operations
// =============================================================================

impl StoreInner {
    fn record(&self, event: StoreEvent) {
        if self.event_capacity == 0 {
            return;
        }
        let mut events = self.events.lock();
        if events.len() == self.event_capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Strictly increasing wall-clock millis
    fn tick(&self) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let prev = self
            .clock
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev + 1))
            })
            .unwrap_or(now);
        now.max(prev + 1)
    }

    fn get(&self, request: &GetRequest) -> std::result::Result<Row, i32> {
        let tables = self.tables.read();
        let table = tables.get(&request.table).ok_or(CODE_TABLE_NOT_FOUND)?;

        let cells = match table.get(&request.row) {
            Some(stored) => collect_cells(
                stored,
                request.family.as_ref(),
                request.qualifier.as_ref(),
                request.max_versions,
            ),
            None => Vec::new(),
        };
        Ok(Row::new(request.row.clone(), cells))
    }

    fn put(&self, request: PutRequest) -> std::result::Result<(), i32> {
        let timestamp = request.timestamp.unwrap_or_else(|| self.tick());

        let mut tables = self.tables.write();
        let table = tables.get_mut(&request.table).ok_or(CODE_TABLE_NOT_FOUND)?;
        let stored = table.entry(request.row).or_default();
        for (family, qualifier, value) in request.cells {
            put_version(stored, (family, qualifier), timestamp, value);
        }
        Ok(())
    }

    fn delete(&self, request: &DeleteRequest) -> std::result::Result<(), i32> {
        let mut tables = self.tables.write();
        let table = tables.get_mut(&request.table).ok_or(CODE_TABLE_NOT_FOUND)?;

        let now_empty = match table.get_mut(&request.row) {
            Some(stored) => {
                match (&request.family, &request.qualifier) {
                    (None, _) => stored.clear(),
                    (Some(family), None) => stored.retain(|(f, _), _| f != family),
                    (Some(family), Some(qualifier)) => {
                        stored.remove(&(family.clone(), qualifier.clone()));
                    }
                }
                stored.is_empty()
            }
            None => false,
        };
        if now_empty {
            table.remove(&request.row);
        }
        Ok(())
    }

    fn scan(&self, request: &ScanRequest) -> std::result::Result<Vec<Row>, i32> {
        let tables = self.tables.read();
        let table = tables.get(&request.table).ok_or(CODE_TABLE_NOT_FOUND)?;

        let start = match &request.start_row {
            Some(start) => Bound::Included(start.clone()),
            None => Bound::Unbounded,
        };
        let stop = match &request.stop_row {
            Some(stop) => Bound::Excluded(stop.clone()),
            None => Bound::Unbounded,
        };
        // BTreeMap::range panics on an inverted range
        if let (Bound::Included(a), Bound::Excluded(b)) = (&start, &stop) {
            if a >= b {
                return Ok(Vec::new());
            }
        }

        let limit = request.limit.unwrap_or(usize::MAX);
        let rows = table
            .range((start, stop))
            .map(|(key, stored)| {
                let cells = collect_cells(stored, request.family.as_ref(), None, request.max_versions);
                Row::new(key.clone(), cells)
            })
            .filter(|row| !row.is_empty())
            .take(limit)
            .collect();
        Ok(rows)
    }
}

fn put_version(stored: &mut StoredRow, column: ColumnKey, timestamp: i64, value: Bytes) {
    let versions = stored.entry(column).or_default();
    match versions.binary_search_by(|(ts, _)| timestamp.cmp(ts)) {
        Ok(pos) => versions[pos].1 = value,
        Err(pos) => versions.insert(pos, (timestamp, value)),
    }
}

fn collect_cells(
    stored: &StoredRow,
    family: Option<&Bytes>,
    qualifier: Option<&Bytes>,
    max_versions: u32,
) -> Vec<Cell> {
    stored
        .iter()
        .filter(|((f, _), _)| family.map_or(true, |family| f == family))
        .filter(|((_, q), _)| qualifier.map_or(true, |qualifier| q == qualifier))
        .flat_map(|((f, q), versions)| {
            versions
                .iter()
                .take(max_versions as usize)
                .map(move |(ts, value)| Cell::new(f.clone(), q.clone(), value.clone(), *ts))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_kept_newest_first() {
        let mut stored = StoredRow::new();
        let column = (Bytes::from_static(b"cf"), Bytes::from_static(b"q"));
        put_version(&mut stored, column.clone(), 10, Bytes::from_static(b"a"));
        put_version(&mut stored, column.clone(), 30, Bytes::from_static(b"c"));
        put_version(&mut stored, column.clone(), 20, Bytes::from_static(b"b"));
        put_version(&mut stored, column.clone(), 20, Bytes::from_static(b"B"));

        let timestamps: Vec<i64> = stored[&column].iter().map(|(ts, _)| *ts).collect();
        assert_eq!(timestamps, vec![30, 20, 10]);
        assert_eq!(stored[&column][1].1, Bytes::from_static(b"B"));
    }

    #[test]
    fn test_collect_cells_caps_versions() {
        let mut stored = StoredRow::new();
        let column = (Bytes::from_static(b"cf"), Bytes::from_static(b"q"));
        for ts in 0..5 {
            put_version(&mut stored, column.clone(), ts, Bytes::from(ts.to_string()));
        }
        let cells = collect_cells(&stored, None, None, 2);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].timestamp(), 4);
        assert_eq!(cells[1].timestamp(), 3);
    }

    #[test]
    fn test_tick_is_strictly_increasing() {
        let store = MemoryStore::new();
        let a = store.inner.tick();
        let b = store.inner.tick();
        assert!(b > a);
    }
}
