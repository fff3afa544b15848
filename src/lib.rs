//! # colquery
//!
//! Resolves compact addresses like `orders@1001@cf:qty` against a column
//! store and returns the row as JSON:
//! - Typed address grammar with named fields
//! - Per-call bridge from callback-driven store APIs to blocking calls
//! - Escaping JSON serializer for rows and cells
//! - Per-request connection/client lifecycle with ordered teardown
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 "orders@1001@cf:qty"                        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Command Parser → Query                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Connector                              │
//! │   connect → create client → get → destroy client → close    │
//! └──────────┬───────────────────────────────────┬──────────────┘
//!            │                                   │
//!            ▼                                   ▼
//!   ┌─────────────────┐   callback on    ┌─────────────────┐
//!   │   SyncBridge    │◄── store I/O ────│  Store client   │
//!   │ (mutex+condvar) │     thread       │  (trait seam)   │
//!   └────────┬────────┘                  └─────────────────┘
//!            │ Row
//!            ▼
//!   ┌─────────────────┐
//!   │ JSON serializer │ → {"rowkey":"1001","columns":[...]}
//!   └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod logging;

pub mod protocol;
pub mod bridge;
pub mod store;
pub mod connector;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{status_code, ConnectorError, Result, STATUS_FATAL, STATUS_OK};
pub use config::{Config, ConfigEntry};
pub use connector::Connector;
pub use protocol::Query;
pub use store::{Cell, Row};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of colquery
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
