//! Building external command lines from catalog entries.
//!
//! A command line is the command name followed by each parameter value in
//! the order the catalog declares, joined by `;`. Values are inserted
//! verbatim: a `;` inside a value shifts the remaining fields, which Nagios
//! has no way to escape. Line breaks and NUL are rejected because they would
//! let a value start a second command.

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

use crate::catalog::{CommandCatalog, CommandSpec};
use crate::error::CommandError;

mod acknowledgement;

pub use acknowledgement::{AcknowledgementOptions, normalize_parameters};

/// A command name with its parameter values bound in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: &'static str,
    values: Vec<String>,
}

impl Command {
    /// Binds `params` to the parameters `spec` declares.
    ///
    /// Parameters are checked in declaration order and the first one without
    /// a value is reported. An empty string counts as a value. Keys the
    /// command does not declare are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::MissingParameter`] for the first absent
    /// parameter and [`CommandError::InvalidParameter`] for a value
    /// containing a line break or NUL.
    pub fn bind<S: BuildHasher>(
        spec: &CommandSpec,
        params: &HashMap<String, String, S>,
    ) -> Result<Self, CommandError> {
        let values = spec
            .parameters()
            .iter()
            .map(|&parameter| {
                let value = params
                    .get(parameter)
                    .ok_or_else(|| CommandError::MissingParameter {
                        command: spec.name().to_owned(),
                        parameter: parameter.to_owned(),
                        doc_url: Some(spec.doc_url()),
                    })?;
                if value.chars().any(|ch| matches!(ch, '\n' | '\r' | '\0')) {
                    return Err(CommandError::InvalidParameter {
                        command: spec.name().to_owned(),
                        parameter: parameter.to_owned(),
                    });
                }
                Ok(value.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: spec.name(),
            values,
        })
    }

    /// Canonical command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Parameter values in declared order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Serializes the command line.
    #[must_use]
    pub fn to_text(&self) -> CommandText {
        let mut line = String::from(self.name);
        for value in &self.values {
            line.push(';');
            line.push_str(value);
        }
        CommandText(line)
    }
}

/// A serialized command line such as `ENABLE_HOST_CHECK;web01`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandText(String);

impl CommandText {
    /// Command line without timestamp or trailing newline.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Command name, the text before the first `;`.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0.split(';').next().unwrap_or_default()
    }

    /// The line as Nagios reads it from its command file:
    /// `[<unix timestamp>] <command line>`.
    #[must_use]
    pub fn submission(&self, timestamp: i64) -> String {
        format!("[{timestamp}] {}", self.0)
    }
}

impl fmt::Display for CommandText {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// Looks `name` up in `catalog` and serializes it with `params`.
///
/// # Errors
///
/// Returns [`CommandError::UnknownCommand`] when the catalog has no such
/// command, otherwise the errors of [`Command::bind`].
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
///
/// use nagix_livestatus::{CommandCatalog, build_command};
///
/// let catalog = CommandCatalog::nagios();
/// let params = HashMap::from([(String::from("host_name"), String::from("web01"))]);
/// let text = build_command(&catalog, "enable_host_check", &params).expect("valid command");
/// assert_eq!(text.as_str(), "ENABLE_HOST_CHECK;web01");
/// ```
pub fn build_command<S: BuildHasher>(
    catalog: &CommandCatalog,
    name: &str,
    params: &HashMap<String, String, S>,
) -> Result<CommandText, CommandError> {
    let spec = catalog.lookup(name)?;
    Command::bind(spec, params).map(|command| command.to_text())
}
