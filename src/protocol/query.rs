//! Query definitions
//!
//! A parsed address, ready to be turned into a fetch request.

use std::fmt;

/// A structured read against one row
///
/// `table` and `row_key` are never empty when produced by the parser. A
/// qualifier can only be attached together with its family, so there is no
/// way to build a query that names a qualifier alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    row_key: String,
    column_family: Option<String>,
    column_qualifier: Option<String>,
}

impl Query {
    /// Query a whole row
    pub fn new(table: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            row_key: row_key.into(),
            column_family: None,
            column_qualifier: None,
        }
    }

    /// Restrict the query to one column family
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.column_family = Some(family.into());
        self.column_qualifier = None;
        self
    }

    /// Restrict the query to one `family:qualifier` column
    pub fn with_column(mut self, family: impl Into<String>, qualifier: impl Into<String>) -> Self {
        self.column_family = Some(family.into());
        self.column_qualifier = Some(qualifier.into());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn row_key(&self) -> &str {
        &self.row_key
    }

    pub fn column_family(&self) -> Option<&str> {
        self.column_family.as_deref()
    }

    pub fn column_qualifier(&self) -> Option<&str> {
        self.column_qualifier.as_deref()
    }
}

/// Renders the query back in address form, re-escaping special characters
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", escape(&self.table), escape(&self.row_key))?;
        if let Some(family) = &self.column_family {
            write!(f, "@{}", escape(family))?;
            if let Some(qualifier) = &self.column_qualifier {
                write!(f, ":{}", escape(qualifier))?;
            }
        }
        Ok(())
    }
}

fn escape(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    for c in token.chars() {
        if matches!(c, '#' | '@' | ':' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
