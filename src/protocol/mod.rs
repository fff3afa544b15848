//! Protocol Module
//!
//! The text-facing edges of the connector: the address grammar a caller
//! sends in, and the JSON document handed back.
//!
//! ## Address Format
//! ```text
//! ┌─────────┬───┬──────────┬───┬──────────┬───┬─────────────┐
//! │  table  │ @ │  rowkey  │ @ │  family  │ : │  qualifier  │
//! └─────────┴───┴──────────┴───┴──────────┴───┴─────────────┘
//!                          └──────── optional ─────────────┘
//!                                            └─ optional ─┘
//! ```
//!
//! Tokens are `[A-Za-z0-9_-]` plus the escapes `\#`, `\@`, `\:`, `\\`.
//!
//! ## Response Format
//! ```text
//! {"rowkey":"<key>","columns":[{"name":"<family>:<qualifier>","value":"<value>"}, ...]}
//! ```

mod query;
mod parser;
mod json;

pub use query::Query;
pub use parser::{CommandParser, ADDRESS_PATTERN};
pub use json::{row_to_json, row_to_value, rows_to_json, ColumnDocument, RowDocument};
