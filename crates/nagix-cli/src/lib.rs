//! Command-line runtime for the Nagix Livestatus gateway.
//!
//! The runtime splits configuration flags from the subcommand, loads the
//! [`Config`], installs telemetry and runs one operation through a
//! [`SocketGateway`]. Results are printed as JSON. Failures are printed to
//! stderr and mapped onto the exit status: 1 for invalid input, 2 when
//! Livestatus or the command channel failed.

use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use nagix_config::Config;
use nagix_livestatus::{AcknowledgementOptions, SocketGateway, normalize_parameters};
use tracing::debug;

mod cli;
mod config;
mod errors;
mod output;
mod telemetry;

use cli::{Cli, CliCommand};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;

const CLI_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cli");

/// Runs the CLI with the given arguments, writing results to `stdout` and
/// diagnostics to `stderr`.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &OrthoConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let split = split_config_arguments(&args);

    let cli = match Cli::try_parse_from(split.command_arguments.iter()) {
        Ok(cli) => cli,
        Err(error) if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = write!(stdout, "{error}");
            return ExitCode::SUCCESS;
        }
        Err(error) => return report(stderr, &AppError::CliUsage(error)),
    };

    let outcome = loader.load(&split.config_arguments).and_then(|config| {
        let _telemetry = telemetry::initialise(&config)?;
        execute(&cli, &config, stdout)
    });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => report(stderr, &error),
    }
}

fn report<E: Write>(stderr: &mut E, error: &AppError) -> ExitCode {
    let _ = writeln!(stderr, "{error}");
    error.exit_code()
}

fn execute<W: Write>(cli: &Cli, config: &Config, stdout: &mut W) -> Result<(), AppError> {
    let gateway = SocketGateway::from_config(config);
    match &cli.command {
        CliCommand::Query { text } => {
            let records = gateway.query(&text.join(" "))?;
            output::write_records(stdout, &records, cli.pretty)
        }
        CliCommand::Exec { name, params } => {
            let bound = command_parameters(name, params)?;
            gateway.execute(name, &bound)?;
            debug!(target: CLI_TARGET, command = %name, "command accepted");
            output::write_submitted(stdout, &name.to_ascii_uppercase(), cli.pretty)
        }
        CliCommand::Status { host, service } => {
            let records = match service {
                Some(description) => gateway.host_service(host, description)?,
                None => gateway.find_hosts(host)?,
            };
            output::write_records(stdout, &records, cli.pretty)
        }
        CliCommand::Commands => output::write_catalog(stdout, gateway.catalog(), cli.pretty),
    }
}

/// Parses `key=value` arguments, maps the `host`/`service` shorthand and
/// fills acknowledgement defaults.
fn command_parameters(name: &str, raw: &[String]) -> Result<HashMap<String, String>, AppError> {
    let supplied = raw
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim().to_owned(), value.to_owned()))
                .ok_or_else(|| AppError::MalformedParameter(pair.clone()))
        })
        .collect::<Result<HashMap<_, _>, _>>()?;
    let mut params = normalize_parameters(&supplied);

    let options = AcknowledgementOptions::from_parameters(&params);
    let host_name = params.get("host_name").cloned();
    let service_description = params.get("service_description").cloned();
    let acknowledgement = match (
        name.trim().to_ascii_uppercase().as_str(),
        host_name,
        service_description,
    ) {
        ("ACKNOWLEDGE_HOST_PROBLEM", Some(host), _) => Some(options.host_parameters(&host)),
        ("ACKNOWLEDGE_SVC_PROBLEM", Some(host), Some(service)) => {
            Some(options.service_parameters(&host, &service))
        }
        _ => None,
    };
    if let Some(defaults) = acknowledgement {
        params.extend(defaults);
    }
    Ok(params)
}
