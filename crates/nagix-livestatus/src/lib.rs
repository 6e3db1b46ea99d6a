//! Livestatus query and command gateway for Nagios.
//!
//! The crate turns status queries into Livestatus Query Language requests,
//! exchanges them over a Unix or TCP socket and decodes the response into
//! ordered [`Record`]s. External commands are validated against a fixed
//! [`CommandCatalog`], serialized in the order Nagios expects and handed to a
//! [`CommandDispatcher`].
//!
//! [`Gateway`] is the entry point for callers:
//!
//! - [`Gateway::query`] accepts NQL text such as
//!   `SELECT name FROM hosts WHERE alias = 'www'`, and [`Gateway::run`] a
//!   structured [`Query`].
//! - [`Gateway::execute`] validates and submits a command given its name and
//!   a parameter map.
//!
//! Failures come back as [`QueryError`] or [`ExecutionError`]. Both report a
//! [`FailureKind`] separating caller mistakes from upstream failures.
//!
//! ```no_run
//! use std::collections::HashMap;
//!
//! use nagix_config::Config;
//! use nagix_livestatus::SocketGateway;
//!
//! let gateway = SocketGateway::from_config(&Config::default());
//! let hosts = gateway.find_hosts("web01")?;
//! for host in &hosts {
//!     println!("{:?}", host.get("state"));
//! }
//! gateway.execute(
//!     "ENABLE_HOST_CHECK",
//!     &HashMap::from([(String::from("host_name"), String::from("web01"))]),
//! )?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod catalog;
mod command;
mod dispatch;
mod error;
mod gateway;
mod query;
mod response;
mod transport;

#[cfg(test)]
mod test_support;

pub use catalog::{CommandCatalog, CommandSpec, DOC_URL_BASE};
pub use command::{
    AcknowledgementOptions, Command, CommandText, build_command, normalize_parameters,
};
pub use dispatch::{
    Clock, CommandDispatcher, CommandPipe, ConfiguredDispatcher, LivestatusDispatcher, unix_now,
};
pub use error::{
    CommandError, DispatchError, ExecutionError, FailureKind, ProtocolError, QueryError,
    QuerySyntaxError, TransportError,
};
pub use gateway::{Gateway, SocketGateway};
pub use nagix_config::ResponseFormat;
pub use query::{Filter, Operator, Predicate, Query, QueryBuilder, QueryText, Table, parse_nql};
pub use response::{Record, ResponseParser};
pub use transport::{RawResponse, SocketTransport, Transport};
