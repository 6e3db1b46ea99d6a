//! Static registry of supported Nagios external commands.
//!
//! The [`CommandCatalog`] is built once at startup and handed to the gateway
//! explicitly. Lookups are case-insensitive: names are upper-cased before the
//! table is consulted. Each [`CommandSpec`] lists its required parameters in
//! the order they are serialised on the command line.

use std::collections::HashMap;

use crate::error::CommandError;

/// Base of the Nagios developer documentation link for a command id.
pub const DOC_URL_BASE: &str =
    "http://old.nagios.org/developerinfo/externalcommands/commandinfo.php?command_id=";

/// Signature of one external command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    name: &'static str,
    parameters: &'static [&'static str],
    command_id: u16,
}

impl CommandSpec {
    /// Describes a command with its ordered parameter names and Nagios id.
    #[must_use]
    pub const fn new(
        name: &'static str,
        parameters: &'static [&'static str],
        command_id: u16,
    ) -> Self {
        Self {
            name,
            parameters,
            command_id,
        }
    }

    /// Canonical upper-case command name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Required parameter names in declaration order.
    #[must_use]
    pub const fn parameters(&self) -> &'static [&'static str] {
        self.parameters
    }

    /// Numeric identifier in the Nagios command reference.
    #[must_use]
    pub const fn command_id(&self) -> u16 {
        self.command_id
    }

    /// Link to the command's page in the Nagios developer documentation.
    #[must_use]
    pub fn doc_url(&self) -> String {
        format!("{DOC_URL_BASE}{}", self.command_id)
    }
}

const HOST: &[&str] = &["host_name"];
const SERVICE: &[&str] = &["host_name", "service_description"];
const SERVICEGROUP: &[&str] = &["servicegroup"];
const HOSTGROUP: &[&str] = &["hostgroup"];

const NAGIOS_COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("DISABLE_NOTIFICATIONS", &[], 7),
    CommandSpec::new("ENABLE_NOTIFICATIONS", &[], 8),
    CommandSpec::new("ENABLE_EVENT_HANDLERS", &[], 47),
    CommandSpec::new("DISABLE_EVENT_HANDLERS", &[], 48),
    CommandSpec::new("ENABLE_HOST_NOTIFICATIONS", HOST, 15),
    CommandSpec::new("DISABLE_HOST_NOTIFICATIONS", HOST, 16),
    CommandSpec::new("ENABLE_HOST_SVC_CHECKS", HOST, 33),
    CommandSpec::new("DISABLE_HOST_SVC_CHECKS", HOST, 34),
    CommandSpec::new("ENABLE_HOST_SVC_NOTIFICATIONS", HOST, 35),
    CommandSpec::new("DISABLE_HOST_SVC_NOTIFICATIONS", HOST, 36),
    CommandSpec::new("ENABLE_HOST_CHECK", HOST, 53),
    CommandSpec::new("DISABLE_HOST_CHECK", HOST, 54),
    CommandSpec::new("REMOVE_HOST_ACKNOWLEDGEMENT", HOST, 116),
    CommandSpec::new("DISABLE_SVC_NOTIFICATIONS", SERVICE, 12),
    CommandSpec::new("ENABLE_SVC_NOTIFICATIONS", SERVICE, 11),
    CommandSpec::new("REMOVE_SVC_ACKNOWLEDGEMENT", SERVICE, 117),
    CommandSpec::new("ENABLE_SERVICEGROUP_SVC_NOTIFICATIONS", SERVICEGROUP, 91),
    CommandSpec::new("DISABLE_SERVICEGROUP_SVC_NOTIFICATIONS", SERVICEGROUP, 92),
    CommandSpec::new("ENABLE_SERVICEGROUP_HOST_NOTIFICATIONS", SERVICEGROUP, 93),
    CommandSpec::new("DISABLE_SERVICEGROUP_HOST_NOTIFICATIONS", SERVICEGROUP, 94),
    CommandSpec::new("ENABLE_SERVICEGROUP_SVC_CHECKS", SERVICEGROUP, 95),
    CommandSpec::new("DISABLE_SERVICEGROUP_SVC_CHECKS", SERVICEGROUP, 96),
    CommandSpec::new("ENABLE_HOSTGROUP_HOST_NOTIFICATIONS", HOSTGROUP, 81),
    CommandSpec::new(
        "ACKNOWLEDGE_HOST_PROBLEM",
        &["host_name", "sticky", "notify", "persistent", "author", "comment"],
        39,
    ),
    CommandSpec::new(
        "ACKNOWLEDGE_SVC_PROBLEM",
        &[
            "host_name",
            "service_description",
            "sticky",
            "notify",
            "persistent",
            "author",
            "comment",
        ],
        40,
    ),
    CommandSpec::new(
        "PROCESS_SERVICE_CHECK_RESULT",
        &["host_name", "service_description", "return_code", "plugin_output"],
        114,
    ),
];

/// Read-only lookup table of external commands.
///
/// # Example
///
/// ```
/// use nagix_livestatus::CommandCatalog;
///
/// let catalog = CommandCatalog::nagios();
/// let spec = catalog.lookup("enable_host_check").expect("known command");
/// assert_eq!(spec.parameters(), ["host_name"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandCatalog {
    entries: HashMap<&'static str, CommandSpec>,
}

impl CommandCatalog {
    /// Builds the catalog of commands the gateway supports.
    #[must_use]
    pub fn nagios() -> Self {
        Self::from_specs(NAGIOS_COMMANDS.iter().copied())
    }

    /// Builds a catalog from arbitrary specs. Later duplicates replace earlier
    /// ones.
    #[must_use]
    pub fn from_specs(specs: impl IntoIterator<Item = CommandSpec>) -> Self {
        let entries = specs.into_iter().map(|spec| (spec.name, spec)).collect();
        Self { entries }
    }

    /// Looks up a command by name, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::UnknownCommand`] when the name is not in the
    /// catalog.
    pub fn lookup(&self, name: &str) -> Result<&CommandSpec, CommandError> {
        let normalised = name.trim().to_ascii_uppercase();
        self.entries
            .get(normalised.as_str())
            .ok_or_else(|| CommandError::UnknownCommand {
                name: name.trim().to_owned(),
            })
    }

    /// Documentation link for a command, or `None` when it is unknown.
    #[must_use]
    pub fn doc_reference(&self, name: &str) -> Option<String> {
        self.lookup(name).ok().map(CommandSpec::doc_url)
    }

    /// All specs ordered by command name.
    #[must_use]
    pub fn specs(&self) -> Vec<&CommandSpec> {
        let mut specs: Vec<&CommandSpec> = self.entries.values().collect();
        specs.sort_by_key(|spec| spec.name);
        specs
    }

    /// Number of commands in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the catalog holds no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
