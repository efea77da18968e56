use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DocumentError;

/// The six alert condition families.
///
/// Each family lives behind its own REST resource with its own envelope.
/// The engine only needs a stable identity per kind plus the plural key used
/// to group conditions inside a policy document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    /// APM / browser / mobile metric conditions.
    Apm,
    ExternalService,
    Synthetics,
    Plugins,
    Nrql,
    /// Conditions served by the separate Infrastructure API.
    Infrastructure,
}

impl ConditionKind {
    /// Every kind, in the order a sync run processes them.
    pub const ALL: [ConditionKind; 6] = [
        ConditionKind::Apm,
        ConditionKind::ExternalService,
        ConditionKind::Synthetics,
        ConditionKind::Plugins,
        ConditionKind::Nrql,
        ConditionKind::Infrastructure,
    ];

    /// Singular resource name, as used in REST envelopes.
    pub fn singular(&self) -> &'static str {
        match self {
            ConditionKind::Apm => "condition",
            ConditionKind::ExternalService => "external_service_condition",
            ConditionKind::Synthetics => "synthetics_condition",
            ConditionKind::Plugins => "plugins_condition",
            ConditionKind::Nrql => "nrql_condition",
            ConditionKind::Infrastructure => "infrastructure_condition",
        }
    }

    /// Plural key grouping this kind in documents and list responses.
    pub fn plural(&self) -> &'static str {
        match self {
            ConditionKind::Apm => "conditions",
            ConditionKind::ExternalService => "external_service_conditions",
            ConditionKind::Synthetics => "synthetics_conditions",
            ConditionKind::Plugins => "plugins_conditions",
            ConditionKind::Nrql => "nrql_conditions",
            ConditionKind::Infrastructure => "infrastructure_conditions",
        }
    }

    /// Looks up a kind by its document key.
    pub fn from_plural(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.plural() == key)
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.singular())
    }
}

impl FromStr for ConditionKind {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.singular() == s || k.plural() == s)
            .ok_or_else(|| DocumentError::UnknownSection(s.to_string()))
    }
}
