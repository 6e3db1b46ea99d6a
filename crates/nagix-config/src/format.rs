use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output mode requested from Livestatus for every query.
///
/// The mode is fixed when the gateway is built; responses are only ever
/// decoded in the mode that was requested.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ResponseFormat {
    /// `OutputFormat: json`; values keep their JSON types.
    #[default]
    Json,
    /// Delimited text with the default Livestatus separators; every value is
    /// a string.
    Csv,
}
