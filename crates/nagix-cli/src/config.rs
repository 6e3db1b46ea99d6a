//! Configuration loading helpers for the CLI.
//!
//! Configuration flags are accepted before the subcommand. They are split
//! off and handed to `ortho_config`, while the remaining tokens go to the
//! subcommand parser.

use std::ffi::{OsStr, OsString};

use nagix_config::Config;
use ortho_config::OrthoConfig;

use crate::AppError;

/// Flags `ortho_config` understands for [`Config`].
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--livestatus-socket",
    "--command-channel",
    "--timeout-ms",
    "--response-format",
    "--log-filter",
    "--log-format",
    "--log-file",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the program name and configuration flags.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    let (flag, inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments split into the configuration loader's share and the rest.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    /// Program name followed by the leading configuration flags.
    pub(crate) config_arguments: Vec<OsString>,
    /// Program name followed by everything after the configuration flags.
    pub(crate) command_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };
    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter();
    let mut command_arguments = vec![program.clone()];

    while let Some(argument) = remaining.next() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                if needs_value && let Some(value) = remaining.next() {
                    config_arguments.push(value.clone());
                }
            }
            FlagAction::Stop => {
                command_arguments.push(argument.clone());
                command_arguments.extend(remaining.cloned());
                break;
            }
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}
