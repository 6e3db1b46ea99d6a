//! Structured Livestatus queries and their wire rendering.
//!
//! A [`Query`] names one of the queryable [`Table`]s, an optional column
//! restriction, an optional [`Filter`] tree and an optional row limit. It is
//! validated once when built and rendered to [`QueryText`] in the output
//! mode the gateway was constructed with. Text queries in the SQL-like NQL
//! dialect are parsed by [`parse_nql`].

use std::fmt;

use nagix_config::ResponseFormat;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::QuerySyntaxError;

mod filter;
mod nql;

pub use filter::{Filter, Operator, Predicate};
pub use nql::parse_nql;

/// Tables the gateway is allowed to query.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Table {
    /// Host status.
    Hosts,
    /// Service status.
    Services,
    /// Host groups.
    Hostgroups,
    /// Service groups.
    Servicegroups,
    /// Global program status of the monitoring core.
    Status,
}

/// Protocol-ready request text, terminated by the blank end-of-request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryText(String);

impl QueryText {
    /// Request text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Request bytes as written to the socket.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for QueryText {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A validated status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: Table,
    columns: Vec<String>,
    filter: Option<Filter>,
    limit: Option<usize>,
}

impl Query {
    /// Starts building a query against `table`.
    #[must_use]
    pub const fn builder(table: Table) -> QueryBuilder {
        QueryBuilder {
            table,
            columns: Vec::new(),
            filter: None,
            limit: None,
        }
    }

    /// Table being queried.
    #[must_use]
    pub const fn table(&self) -> Table {
        self.table
    }

    /// Requested columns; empty means every column.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Filter applied to rows, if any.
    #[must_use]
    pub const fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    /// Maximum number of rows, if any.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Renders the request in the given output mode.
    ///
    /// Column headers and the fixed16 response header are always requested
    /// so the response parser can pair values with names and detect
    /// truncated or rejected responses.
    #[must_use]
    pub fn render(&self, format: ResponseFormat) -> QueryText {
        let mut text = format!("GET {}\n", self.table);
        if !self.columns.is_empty() {
            text.push_str("Columns: ");
            text.push_str(&self.columns.join(" "));
            text.push('\n');
        }
        if let Some(filter) = &self.filter {
            filter.write_lql(&mut text);
        }
        if let Some(limit) = self.limit {
            text.push_str(&format!("Limit: {limit}\n"));
        }
        match format {
            ResponseFormat::Json => text.push_str("OutputFormat: json\n"),
            ResponseFormat::Csv => text.push_str("Separators: 10 59 44 124\n"),
        }
        text.push_str("ColumnHeaders: on\n");
        text.push_str("ResponseHeader: fixed16\n");
        text.push('\n');
        QueryText(text)
    }
}

/// Incremental construction of a [`Query`].
///
/// # Example
///
/// ```
/// use nagix_config::ResponseFormat;
/// use nagix_livestatus::{Filter, Query, Table};
///
/// let query = Query::builder(Table::Hosts)
///     .columns(["name", "address"])
///     .filter(Filter::any_of(["name", "alias", "address"], "foo"))
///     .build()
///     .expect("valid query");
/// let text = query.render(ResponseFormat::Json);
/// assert!(text.as_str().starts_with("GET hosts\nColumns: name address\n"));
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: Table,
    columns: Vec<String>,
    filter: Option<Filter>,
    limit: Option<usize>,
}

impl QueryBuilder {
    /// Appends one column. Order and duplicates are preserved.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Appends several columns. Order and duplicates are preserved.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Sets the filter, combining with an existing one by conjunction.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Limits the number of rows returned.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validates columns and filter and produces the query.
    ///
    /// # Errors
    ///
    /// Returns [`QuerySyntaxError`] when a column name is not a bare
    /// identifier, a filter value contains a line break, or a filter group is
    /// empty.
    pub fn build(self) -> Result<Query, QuerySyntaxError> {
        for column in &self.columns {
            filter::validate_column(column)?;
        }
        if let Some(filter) = &self.filter {
            filter.validate()?;
        }
        Ok(Query {
            table: self.table,
            columns: self.columns,
            filter: self.filter,
            limit: self.limit,
        })
    }
}
