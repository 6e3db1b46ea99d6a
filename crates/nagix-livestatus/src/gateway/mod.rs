//! The facade the HTTP and RPC layers call.
//!
//! A [`Gateway`] owns the command catalog, a [`Transport`] for queries, a
//! [`CommandDispatcher`] for commands and the response format fixed at
//! construction. It keeps no state between calls, so a shared reference can
//! serve concurrent callers when the collaborators are `Sync`.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::Arc;

use nagix_config::{Config, ResponseFormat};
use tracing::{debug, warn};

use crate::catalog::CommandCatalog;
use crate::command::build_command;
use crate::dispatch::{CommandDispatcher, ConfiguredDispatcher};
use crate::error::{ExecutionError, QueryError};
use crate::query::{Query, parse_nql};
use crate::response::{Record, ResponseParser};
use crate::transport::{SocketTransport, Transport};

mod lookup;

const GATEWAY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::gateway");

/// Gateway wired to the configured socket and command channel.
pub type SocketGateway = Gateway<SocketTransport, ConfiguredDispatcher>;

/// Runs status queries and external commands against one monitoring core.
#[derive(Debug, Clone)]
pub struct Gateway<T, D> {
    catalog: Arc<CommandCatalog>,
    transport: T,
    dispatcher: D,
    parser: ResponseParser,
}

impl SocketGateway {
    /// Builds a gateway from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SocketTransport::from_config(config),
            ConfiguredDispatcher::from_config(config),
            config.response_format(),
        )
    }
}

impl<T: Transport, D: CommandDispatcher> Gateway<T, D> {
    /// Creates a gateway over the Nagios command catalog.
    #[must_use]
    pub fn new(transport: T, dispatcher: D, format: ResponseFormat) -> Self {
        Self {
            catalog: Arc::new(CommandCatalog::nagios()),
            transport,
            dispatcher,
            parser: ResponseParser::new(format),
        }
    }

    /// Replaces the command catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<CommandCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Commands this gateway accepts.
    #[must_use]
    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    /// Output mode requested from Livestatus.
    #[must_use]
    pub const fn format(&self) -> ResponseFormat {
        self.parser.format()
    }

    /// Parses an NQL query, runs it and returns the matching records.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] wrapping the parse, transport or protocol
    /// failure.
    pub fn query(&self, text: &str) -> Result<Vec<Record>, QueryError> {
        let query = parse_nql(text).inspect_err(|error| {
            debug!(target: GATEWAY_TARGET, %error, "rejected query text");
        })?;
        self.run(&query)
    }

    /// Runs a structured query and returns the matching records.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] wrapping the transport or protocol failure.
    pub fn run(&self, query: &Query) -> Result<Vec<Record>, QueryError> {
        let request = query.render(self.parser.format());
        let response = self.transport.exchange(&request).inspect_err(|error| {
            warn!(target: GATEWAY_TARGET, table = %query.table(), %error, "query failed");
        })?;
        let records = self.parser.parse(&response).inspect_err(|error| {
            warn!(target: GATEWAY_TARGET, table = %query.table(), %error, "unreadable response");
        })?;
        debug!(
            target: GATEWAY_TARGET,
            table = %query.table(),
            records = records.len(),
            "query completed"
        );
        Ok(records)
    }

    /// Validates and submits an external command.
    ///
    /// The dispatcher is only reached once the command has passed catalog
    /// validation.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] wrapping the unknown command, missing or
    /// invalid parameter, or dispatch failure.
    pub fn execute<S: BuildHasher>(
        &self,
        name: &str,
        params: &HashMap<String, String, S>,
    ) -> Result<(), ExecutionError> {
        let command = build_command(&self.catalog, name, params).inspect_err(|error| {
            debug!(target: GATEWAY_TARGET, command = name, %error, "rejected command");
        })?;
        self.dispatcher.dispatch(&command).inspect_err(|error| {
            warn!(target: GATEWAY_TARGET, command = command.name(), %error, "dispatch failed");
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
