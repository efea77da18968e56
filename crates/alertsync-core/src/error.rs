//! Error types for policy resolution, reconciliation and document handling.

use crate::id::{ConditionId, PolicyId};
use crate::kind::ConditionKind;

/// Errors raised while resolving a policy or converging its conditions.
///
/// Every variant is fatal for the run that raised it. `PolicyNotFound` is
/// only recovered from inside policy upsert, where it triggers creation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// An explicit policy id was supplied but no such policy exists.
    #[error("Policy {id} does not exist")]
    StalePolicyIdentifier {
        /// The id that failed to resolve.
        id: PolicyId,
    },

    /// More than one policy carries exactly the requested name.
    #[error("{matches} policies are named '{name}'; pass an explicit policy id")]
    AmbiguousPolicyName {
        /// The name that was looked up.
        name: String,
        /// Number of exact matches.
        matches: usize,
    },

    /// A lookup by name or id found nothing.
    #[error("Policy not found: {lookup}")]
    PolicyNotFound {
        /// Human-readable description of the lookup key.
        lookup: String,
    },

    /// The service answered with a non-success status.
    #[error("{operation} failed: {method} {url} returned HTTP {status}: {body}")]
    Transport {
        /// Operation being performed (e.g. "create nrql_condition").
        operation: String,
        /// HTTP method.
        method: String,
        /// Request URL.
        url: String,
        /// Response status code.
        status: u16,
        /// Response body, as text.
        body: String,
    },

    /// The request never produced a response.
    #[error("{operation} failed: could not reach {url}: {message}")]
    Connection {
        operation: String,
        url: String,
        message: String,
    },

    /// The response arrived but could not be interpreted.
    #[error("{operation} failed: unexpected response: {message}")]
    Decode { operation: String, message: String },

    /// A request URL could not be built.
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// No adapter was registered for a condition kind.
    #[error("No adapter registered for {0}")]
    MissingAdapter(ConditionKind),
}

impl SyncError {
    /// Creates a `PolicyNotFound` error for a name lookup.
    #[must_use]
    pub fn policy_name_not_found(name: impl AsRef<str>) -> Self {
        Self::PolicyNotFound {
            lookup: format!("name '{}'", name.as_ref()),
        }
    }

    /// Creates a `PolicyNotFound` error for an id lookup.
    #[must_use]
    pub fn policy_id_not_found(id: &PolicyId) -> Self {
        Self::PolicyNotFound {
            lookup: format!("id {id}"),
        }
    }

    /// Creates a `Decode` error.
    #[must_use]
    pub fn decode(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns `true` for `PolicyNotFound`.
    #[must_use]
    pub fn is_policy_not_found(&self) -> bool {
        matches!(self, Self::PolicyNotFound { .. })
    }

    /// Returns `true` if the service reported the target as missing.
    #[must_use]
    pub fn is_remote_not_found(&self) -> bool {
        matches!(self, Self::Transport { status: 404, .. })
    }
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while reading or rendering a policy document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Template expansion failed: {0}")]
    Template(#[from] handlebars::RenderError),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Document is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Unknown condition section '{0}'")]
    UnknownSection(String),

    #[error("Invalid {section} entry: {message}")]
    InvalidSection { section: String, message: String },

    #[error("Duplicate condition id {id} in {kind}s")]
    DuplicateConditionId { kind: ConditionKind, id: ConditionId },
}

impl DocumentError {
    /// Creates a new `InvalidField` error.
    #[must_use]
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}
