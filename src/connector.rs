//! Connector Module
//!
//! The query orchestrator: address in, JSON out.
//!
//! ## Responsibilities
//! - Compile the address grammar once at init
//! - Resolve the store endpoint from configuration
//! - Open a connection and client per request, and always tear them down
//! - Run the fetch through the bridge and serialize the row
//!
//! ## Request Lifecycle
//! ```text
//! Init ─► ConnectionOpen ─► ClientOpen ─► RequestSent ─► RequestComplete ─► TornDown
//!   │           │               │              │                              ▲
//!   └───────────┴───────────────┴──────────────┴──────── on error ───────────┘
//! ```
//! Teardown releases only what was acquired: client first (bridged), then
//! the connection.

use std::sync::Arc;

use bytes::Bytes;

use crate::bridge::SyncBridge;
use crate::config::{Config, ConfigEntry, ENDPOINT_KEY};
use crate::error::{ConnectorError, Result};
use crate::protocol::{row_to_json, CommandParser, Query};
use crate::store::{Client, Connection, GetRequest, Row, StoreConnector};

/// Resolves addresses against a store
///
/// Holds no per-request state, so one connector can serve concurrent
/// callers.
pub struct Connector {
    /// Connector configuration
    config: Config,

    /// Compiled address grammar
    parser: CommandParser,

    /// Opens connections for each request
    store: Arc<dyn StoreConnector>,

    /// Wait policy for every store operation
    bridge: SyncBridge,
}

impl Connector {
    /// Build a connector from ordered key/value entries
    ///
    /// Fails only on configuration or grammar errors, both fatal.
    pub fn init(entries: &[ConfigEntry], store: Arc<dyn StoreConnector>) -> Result<Self> {
        let config = Config::from_entries(entries)?;
        Self::with_config(config, store)
    }

    /// Build a connector from a prepared config
    pub fn with_config(config: Config, store: Arc<dyn StoreConnector>) -> Result<Self> {
        let parser = match &config.command_pattern {
            Some(pattern) => CommandParser::with_pattern(pattern),
            None => CommandParser::new(),
        }
        .map_err(|e| {
            tracing::error!("Failed to compile address grammar: {}", e);
            e
        })?;

        tracing::info!(
            endpoint = config.endpoint.as_deref().unwrap_or("<unset>"),
            max_versions = config.max_versions,
            "connector initialized"
        );

        Ok(Self {
            bridge: SyncBridge::with_timeout(config.request_timeout),
            config,
            parser,
            store,
        })
    }

    /// Resolve an address to JSON, or `None` on any request failure
    pub fn get_value(&self, command: &str) -> Option<String> {
        match self.execute(command) {
            Ok(json) => Some(json),
            Err(e) => {
                tracing::warn!(command, error = %e, "request failed");
                None
            }
        }
    }

    /// Resolve an address to JSON
    pub fn execute(&self, command: &str) -> Result<String> {
        let query = self.parser.parse(command)?;
        tracing::debug!(%query, "parsed address");

        let row = self.fetch(&query)?;
        let json = row_to_json(&row)?;
        Ok(json)
    }

    /// Fetch the row a query addresses
    pub fn fetch(&self, query: &Query) -> Result<Row> {
        let request = self.build_request(query);
        self.with_client(|client, bridge| bridge.get(client, request))
    }

    /// Build the store read for a query
    pub fn build_request(&self, query: &Query) -> GetRequest {
        GetRequest {
            table: query.table().to_string(),
            row: Bytes::copy_from_slice(query.row_key().as_bytes()),
            family: query
                .column_family()
                .map(|f| Bytes::copy_from_slice(f.as_bytes())),
            qualifier: query
                .column_qualifier()
                .map(|q| Bytes::copy_from_slice(q.as_bytes())),
            max_versions: self.config.max_versions,
        }
    }

    /// Open a connection and client, run `op`, and tear both down
    ///
    /// Teardown happens whether `op` succeeds, fails, or never runs.
    pub fn with_client<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&dyn Client, &SyncBridge) -> Result<T>,
    {
        let endpoint = self.config.endpoint.as_deref().ok_or_else(|| {
            ConnectorError::Connection(format!("no endpoint configured under '{}'", ENDPOINT_KEY))
        })?;

        let mut session = Session::new(self.bridge);
        let result = session.run(self.store.as_ref(), endpoint, op);

        if let Err(e) = &result {
            tracing::debug!(stage = ?session.stage, error = %e, "unwinding request");
        }
        session.teardown();

        result
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Init,
    ConnectionOpen,
    ClientOpen,
    RequestSent,
    RequestComplete,
    TornDown,
}

/// Resources held by one request
struct Session {
    stage: Stage,
    connection: Option<Box<dyn Connection>>,
    client: Option<Box<dyn Client>>,
    bridge: SyncBridge,
}

impl Session {
    fn new(bridge: SyncBridge) -> Self {
        Self {
            stage: Stage::Init,
            connection: None,
            client: None,
            bridge,
        }
    }

    fn run<T, F>(&mut self, store: &dyn StoreConnector, endpoint: &str, op: F) -> Result<T>
    where
        F: FnOnce(&dyn Client, &SyncBridge) -> Result<T>,
    {
        let connection = self.connection.insert(store.connect(endpoint)?);
        self.stage = Stage::ConnectionOpen;

        let client = connection.create_client()?;
        self.stage = Stage::ClientOpen;

        let client = self.client.insert(client);
        self.stage = Stage::RequestSent;

        let value = op(&**client, &self.bridge)?;
        self.stage = Stage::RequestComplete;

        Ok(value)
    }

    /// Release whatever was acquired; safe to call more than once
    fn teardown(&mut self) {
        if let Some(client) = self.client.take() {
            if let Err(e) = self.bridge.destroy_client(client) {
                tracing::warn!(error = %e, "client teardown did not complete cleanly");
            }
        }
        if let Some(connection) = self.connection.take() {
            connection.close();
        }
        if self.stage != Stage::TornDown {
            tracing::trace!(from = ?self.stage, "session torn down");
            self.stage = Stage::TornDown;
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
