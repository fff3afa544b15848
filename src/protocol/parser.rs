//! Address parser
//!
//! Turns `table@rowkey@family:qualifier` into a [`Query`].
//!
//! The grammar is a single anchored regex with named groups, compiled once
//! when the connector starts:
//!
//! ```text
//! address := table '@' rowkey ( '@' family ( ':' qualifier )? )?
//! token   := ( [A-Za-z0-9_-] | '\' [#@:\] )+
//! ```

use regex::{Captures, Regex};

use super::Query;
use crate::error::{ConnectorError, Result};

/// Built-in address grammar
pub const ADDRESS_PATTERN: &str = concat!(
    r"\A",
    r"(?P<table>(?:[A-Za-z0-9_\-]|\\[#@:\\])+)",
    r"@",
    r"(?P<rowkey>(?:[A-Za-z0-9_\-]|\\[#@:\\])+)",
    r"(?:@",
    r"(?P<family>(?:[A-Za-z0-9_\-]|\\[#@:\\])+)",
    r"(?::",
    r"(?P<qualifier>(?:[A-Za-z0-9_\-]|\\[#@:\\])+)",
    r")?)?",
    r"\z",
);

const TABLE: &str = "table";
const ROWKEY: &str = "rowkey";
const FAMILY: &str = "family";
const QUALIFIER: &str = "qualifier";

/// Compiled address grammar
#[derive(Debug, Clone)]
pub struct CommandParser {
    regex: Regex,
}

impl CommandParser {
    /// Compile the built-in grammar
    pub fn new() -> Result<Self> {
        Self::with_pattern(ADDRESS_PATTERN)
    }

    /// Compile a replacement grammar
    ///
    /// The pattern must define the named groups `table`, `rowkey`, `family`
    /// and `qualifier`.
    pub fn with_pattern(pattern: &str) -> Result<Self> {
        let regex =
            Regex::new(pattern).map_err(|e| ConnectorError::PatternCompile(e.to_string()))?;

        for group in [TABLE, ROWKEY, FAMILY, QUALIFIER] {
            if !regex.capture_names().flatten().any(|name| name == group) {
                return Err(ConnectorError::PatternCompile(format!(
                    "pattern has no named group '{}'",
                    group
                )));
            }
        }

        Ok(Self { regex })
    }

    /// Source of the compiled grammar
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Parse one address
    pub fn parse(&self, command: &str) -> Result<Query> {
        let no_match = || ConnectorError::NoMatch(command.to_string());

        let caps = self.regex.captures(command).ok_or_else(no_match)?;

        let table = required(&caps, TABLE).ok_or_else(no_match)?;
        let row_key = required(&caps, ROWKEY).ok_or_else(no_match)?;
        let family = required(&caps, FAMILY);
        let qualifier = required(&caps, QUALIFIER);

        let query = Query::new(table, row_key);
        match (family, qualifier) {
            (None, None) => Ok(query),
            (Some(family), None) => Ok(query.with_family(family)),
            (Some(family), Some(qualifier)) => Ok(query.with_column(family, qualifier)),
            // Only reachable through a replacement grammar
            (None, Some(_)) => Err(no_match()),
        }
    }
}

/// A group that took part in the match and is non-empty, unescaped
fn required(caps: &Captures<'_>, name: &str) -> Option<String> {
    caps.name(name)
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .map(unescape)
}

fn unescape(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
                continue;
            }
        }
        out.push(c);
    }
    out
}
