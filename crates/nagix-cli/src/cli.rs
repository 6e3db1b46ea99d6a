//! Command-line argument definitions for `nagix`.

use clap::{Parser, Subcommand};

/// Queries Nagios status and submits external commands through Livestatus.
#[derive(Parser, Debug)]
#[command(name = "nagix", version, disable_help_subcommand = true)]
pub(crate) struct Cli {
    /// Pretty-prints JSON output.
    #[arg(long, global = true)]
    pub(crate) pretty: bool,
    /// The operation to run.
    #[command(subcommand)]
    pub(crate) command: CliCommand,
}

/// Operations supported by the CLI.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum CliCommand {
    /// Runs an NQL query, e.g. `SELECT name FROM hosts WHERE alias = 'www'`.
    Query {
        /// Query text; several words are joined with spaces.
        #[arg(value_name = "NQL", required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Submits an external command.
    Exec {
        /// Command name, e.g. `ENABLE_HOST_CHECK`.
        #[arg(value_name = "COMMAND")]
        name: String,
        /// Parameters as `key=value`; `host` and `service` are accepted for
        /// `host_name` and `service_description`.
        #[arg(value_name = "KEY=VALUE", num_args = 0..)]
        params: Vec<String>,
    },
    /// Shows a host found by name, alias or address, or one of its services.
    Status {
        /// Host name, alias or address.
        #[arg(value_name = "HOST")]
        host: String,
        /// Service description on that host.
        #[arg(value_name = "SERVICE")]
        service: Option<String>,
    },
    /// Lists the supported external commands.
    Commands,
}
