//! Parameter helpers for the acknowledgement commands and the `host` /
//! `service` shorthand accepted from callers.

use std::collections::HashMap;
use std::hash::BuildHasher;

/// Optional settings of `ACKNOWLEDGE_HOST_PROBLEM` and
/// `ACKNOWLEDGE_SVC_PROBLEM`.
///
/// Flags are given as text and are set only when they read `true`, in any
/// case. Any other text, including `1`, clears the flag. An absent flag is
/// set. Author and comment default to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcknowledgementOptions {
    /// Keep the acknowledgement until the object recovers.
    pub sticky: Option<String>,
    /// Send an acknowledgement notification.
    pub notify: Option<String>,
    /// Keep the acknowledgement comment across restarts.
    pub persistent: Option<String>,
    /// Author recorded with the acknowledgement.
    pub author: Option<String>,
    /// Comment recorded with the acknowledgement.
    pub comment: Option<String>,
}

impl AcknowledgementOptions {
    /// Reads the options from a caller-supplied parameter map.
    #[must_use]
    pub fn from_parameters<S: BuildHasher>(params: &HashMap<String, String, S>) -> Self {
        let take = |key: &str| params.get(key).cloned();
        Self {
            sticky: take("sticky"),
            notify: take("notify"),
            persistent: take("persistent"),
            author: take("author"),
            comment: take("comment"),
        }
    }

    /// Parameters for `ACKNOWLEDGE_HOST_PROBLEM`.
    #[must_use]
    pub fn host_parameters(&self, host_name: &str) -> HashMap<String, String> {
        let mut params = self.flag_parameters();
        params.insert(String::from("host_name"), host_name.to_owned());
        params
    }

    /// Parameters for `ACKNOWLEDGE_SVC_PROBLEM`.
    #[must_use]
    pub fn service_parameters(
        &self,
        host_name: &str,
        service_description: &str,
    ) -> HashMap<String, String> {
        let mut params = self.host_parameters(host_name);
        params.insert(
            String::from("service_description"),
            service_description.to_owned(),
        );
        params
    }

    fn flag_parameters(&self) -> HashMap<String, String> {
        HashMap::from([
            (String::from("sticky"), flag(self.sticky.as_deref())),
            (String::from("notify"), flag(self.notify.as_deref())),
            (String::from("persistent"), flag(self.persistent.as_deref())),
            (
                String::from("author"),
                self.author.clone().unwrap_or_default(),
            ),
            (
                String::from("comment"),
                self.comment.clone().unwrap_or_default(),
            ),
        ])
    }
}

fn flag(value: Option<&str>) -> String {
    let set = value.is_none_or(|raw| raw.trim().eq_ignore_ascii_case("true"));
    String::from(if set { "1" } else { "0" })
}

/// Maps the `host` and `service` shorthand onto `host_name` and
/// `service_description`. A canonical key already present is kept.
#[must_use]
pub fn normalize_parameters<S: BuildHasher>(
    params: &HashMap<String, String, S>,
) -> HashMap<String, String> {
    let mut normalized: HashMap<String, String> = params
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for (alias, canonical) in [("host", "host_name"), ("service", "service_description")] {
        if let Some(value) = params.get(alias) {
            normalized
                .entry(canonical.to_owned())
                .or_insert_with(|| value.clone());
        }
    }
    normalized
}
