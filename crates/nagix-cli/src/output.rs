//! JSON rendering of command results.

use std::io::Write;

use nagix_livestatus::{CommandCatalog, Record};
use serde::Serialize;

use crate::AppError;

/// Catalog entry as printed by `nagix commands`.
#[derive(Debug, Serialize)]
struct CommandEntry<'a> {
    name: &'a str,
    parameters: &'a [&'a str],
    doc_url: String,
}

/// Acknowledgement printed after a command was submitted.
#[derive(Debug, Serialize)]
struct Submitted<'a> {
    command: &'a str,
    submitted: bool,
}

pub(crate) fn write_records<W: Write>(
    out: &mut W,
    records: &[Record],
    pretty: bool,
) -> Result<(), AppError> {
    write_json(out, &records, pretty)
}

pub(crate) fn write_catalog<W: Write>(
    out: &mut W,
    catalog: &CommandCatalog,
    pretty: bool,
) -> Result<(), AppError> {
    let entries: Vec<CommandEntry<'_>> = catalog
        .specs()
        .into_iter()
        .map(|spec| CommandEntry {
            name: spec.name(),
            parameters: spec.parameters(),
            doc_url: spec.doc_url(),
        })
        .collect();
    write_json(out, &entries, pretty)
}

pub(crate) fn write_submitted<W: Write>(
    out: &mut W,
    command: &str,
    pretty: bool,
) -> Result<(), AppError> {
    write_json(
        out,
        &Submitted {
            command,
            submitted: true,
        },
        pretty,
    )
}

fn write_json<W: Write, T: Serialize + ?Sized>(
    out: &mut W,
    value: &T,
    pretty: bool,
) -> Result<(), AppError> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value).map_err(AppError::Serialise)?;
    } else {
        serde_json::to_writer(&mut *out, value).map_err(AppError::Serialise)?;
    }
    writeln!(out).map_err(AppError::Emit)?;
    out.flush().map_err(AppError::Emit)
}
