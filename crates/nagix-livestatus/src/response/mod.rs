//! Decoding of Livestatus responses into records.
//!
//! Requests always ask for `ResponseHeader: fixed16` and column headers, so a
//! response is a 16-byte status line followed by a body whose first row names
//! the columns. The body is a JSON array of arrays or, in CSV mode, lines of
//! `;`-separated fields.

use indexmap::IndexMap;
use nagix_config::ResponseFormat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::transport::RawResponse;

/// Length of the fixed16 response header, newline included.
pub(crate) const HEADER_LEN: usize = 16;
const STATUS_OK: u16 = 200;

/// One response row keyed by column name, in response header order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, Value>);

impl Record {
    /// Value of `column`, if present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Value of `column` when it is a string.
    #[must_use]
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }

    /// Column names in header order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Column/value pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(column, value)| (column.as_str(), value))
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for a record without columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(column, value)| (column.into(), value))
                .collect(),
        )
    }
}

/// Decodes raw responses in the output mode chosen at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseParser {
    format: ResponseFormat,
}

impl ResponseParser {
    /// Creates a parser for responses in `format`.
    #[must_use]
    pub const fn new(format: ResponseFormat) -> Self {
        Self { format }
    }

    /// Output mode this parser decodes.
    #[must_use]
    pub const fn format(&self) -> ResponseFormat {
        self.format
    }

    /// Parses a complete response into records.
    ///
    /// An empty response yields no records.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError`] when the fixed16 header is unreadable, the
    /// status is not 200, the body is shorter than announced, the body is
    /// not in the expected format, or a row's value count differs from the
    /// header's column count.
    pub fn parse(&self, response: &RawResponse) -> Result<Vec<Record>, ProtocolError> {
        if response.is_empty() {
            return Ok(Vec::new());
        }
        let body = framed_body(response.as_bytes())?;
        let text = std::str::from_utf8(body)
            .map_err(|error| ProtocolError::malformed(format!("body is not UTF-8: {error}")))?;
        let rows = match self.format {
            ResponseFormat::Json => json_rows(text)?,
            ResponseFormat::Csv => csv_rows(text),
        };
        pair_rows(rows)
    }
}

/// Body length announced by a well-formed fixed16 header at the start of
/// `bytes`, or `None` when no such header is present.
pub(crate) fn announced_body_len(bytes: &[u8]) -> Option<usize> {
    let header = std::str::from_utf8(bytes.get(..HEADER_LEN)?).ok()?;
    if !header.ends_with('\n') || header.as_bytes().get(3) != Some(&b' ') {
        return None;
    }
    header
        .get(4..HEADER_LEN - 1)
        .and_then(|digits| digits.trim_start().parse::<usize>().ok())
}

fn framed_body(bytes: &[u8]) -> Result<&[u8], ProtocolError> {
    let Some(header_bytes) = bytes.get(..HEADER_LEN) else {
        return Err(ProtocolError::invalid_header(format!(
            "expected {HEADER_LEN} header bytes, received {}",
            bytes.len()
        )));
    };
    let header = std::str::from_utf8(header_bytes)
        .map_err(|_| ProtocolError::invalid_header("header is not ASCII"))?;
    if !header.ends_with('\n') || header.as_bytes().get(3) != Some(&b' ') {
        return Err(ProtocolError::invalid_header(format!("{header:?}")));
    }
    let status = header
        .get(..3)
        .and_then(|digits| digits.parse::<u16>().ok())
        .ok_or_else(|| ProtocolError::invalid_header(format!("bad status in {header:?}")))?;
    let expected = header
        .get(4..HEADER_LEN - 1)
        .and_then(|digits| digits.trim_start().parse::<usize>().ok())
        .ok_or_else(|| ProtocolError::invalid_header(format!("bad length in {header:?}")))?;

    let rest = bytes.get(HEADER_LEN..).unwrap_or_default();
    let Some(body) = rest.get(..expected) else {
        return Err(ProtocolError::Truncated {
            expected,
            received: rest.len(),
        });
    };
    if status != STATUS_OK {
        return Err(ProtocolError::Rejected {
            status,
            message: String::from_utf8_lossy(body).trim().to_owned(),
        });
    }
    Ok(body)
}

fn json_rows(text: &str) -> Result<Vec<Vec<Value>>, ProtocolError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(text)
        .map_err(|error| ProtocolError::malformed(format!("expected a JSON array of rows: {error}")))
}

fn csv_rows(text: &str) -> Vec<Vec<Value>> {
    text.split('\n')
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split(';')
                .map(|field| Value::String(field.to_owned()))
                .collect()
        })
        .collect()
}

fn pair_rows(rows: Vec<Vec<Value>>) -> Result<Vec<Record>, ProtocolError> {
    let mut rows = rows.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns = header
        .into_iter()
        .map(|cell| match cell {
            Value::String(name) => Ok(name),
            other => Err(ProtocolError::malformed(format!(
                "column header must be a string, found {other}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    rows.enumerate()
        .map(|(index, row)| {
            if row.len() != columns.len() {
                return Err(ProtocolError::ColumnMismatch {
                    row: index + 1,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            Ok(columns.iter().cloned().zip(row).collect::<Record>())
        })
        .collect()
}
