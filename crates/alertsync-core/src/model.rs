//! Policy and condition records shared by the engine and the API adapters.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::DocumentError;
use crate::id::{ConditionId, PolicyId};

/// Payload field that ties a condition to its policy.
///
/// Policy association travels as an operation parameter, never as body
/// content, so the engine strips this field from every desired payload.
pub const POLICY_ASSOCIATION_FIELD: &str = "policy_id";

/// How the service groups violations into incidents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentPreference {
    PerPolicy,
    PerCondition,
    PerConditionAndTarget,
}

impl fmt::Display for IncidentPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentPreference::PerPolicy => write!(f, "PER_POLICY"),
            IncidentPreference::PerCondition => write!(f, "PER_CONDITION"),
            IncidentPreference::PerConditionAndTarget => write!(f, "PER_CONDITION_AND_TARGET"),
        }
    }
}

impl FromStr for IncidentPreference {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PER_POLICY" => Ok(IncidentPreference::PerPolicy),
            "PER_CONDITION" => Ok(IncidentPreference::PerCondition),
            "PER_CONDITION_AND_TARGET" => Ok(IncidentPreference::PerConditionAndTarget),
            other => Err(DocumentError::invalid_field(
                "incident_preference",
                format!("unknown incident preference '{other}'"),
            )),
        }
    }
}

/// A policy as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    pub name: String,
    pub incident_preference: IncidentPreference,
}

/// The policy half of a desired-state document: everything but the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDescriptor {
    pub name: String,
    pub incident_preference: IncidentPreference,
}

impl From<&Policy> for PolicyDescriptor {
    fn from(policy: &Policy) -> Self {
        Self {
            name: policy.name.clone(),
            incident_preference: policy.incident_preference,
        }
    }
}

/// A single alert condition.
///
/// Only `id` and `name` are interpreted. Every other field is carried in
/// `attributes` untouched and in its original order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ConditionId>,
    pub name: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Condition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<ConditionId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Removes the policy association field from the payload, if present.
    pub fn strip_policy_association(&mut self) {
        self.attributes.remove(POLICY_ASSOCIATION_FIELD);
    }
}

/// What a change does to the remote condition set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeAction::Create => write!(f, "create"),
            ChangeAction::Update => write!(f, "update"),
            ChangeAction::Delete => write!(f, "delete"),
        }
    }
}

/// One step toward converging remote state onto desired state.
///
/// At least one side is always present: `Create` has no current condition,
/// `Delete` has no desired one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Change {
    Create { desired: Condition },
    /// `desired.id` equals `current.id`.
    Update { current: Condition, desired: Condition },
    Delete { current: Condition },
}

impl Change {
    pub fn action(&self) -> ChangeAction {
        match self {
            Change::Create { .. } => ChangeAction::Create,
            Change::Update { .. } => ChangeAction::Update,
            Change::Delete { .. } => ChangeAction::Delete,
        }
    }

    pub fn current(&self) -> Option<&Condition> {
        match self {
            Change::Create { .. } => None,
            Change::Update { current, .. } | Change::Delete { current } => Some(current),
        }
    }

    pub fn desired(&self) -> Option<&Condition> {
        match self {
            Change::Create { desired } | Change::Update { desired, .. } => Some(desired),
            Change::Delete { .. } => None,
        }
    }

    /// Name of the condition the change acts on.
    pub fn name(&self) -> &str {
        match self {
            Change::Create { desired } | Change::Update { desired, .. } => &desired.name,
            Change::Delete { current } => &current.name,
        }
    }

    /// Remote id affected by the change; `None` for creations.
    pub fn target_id(&self) -> Option<&ConditionId> {
        self.current().and_then(|c| c.id.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_keeps_attribute_order() {
        let condition: Condition = serde_json::from_value(json!({
            "name": "cpu-high",
            "zeta": 1,
            "alpha": 2,
            "id": 7,
            "mid": {"nested": true}
        }))
        .unwrap();

        assert_eq!(condition.id, Some(ConditionId::Number(7)));
        let keys: Vec<&str> = condition.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_condition_without_id_omits_it() {
        let condition = Condition::new("mem-high").with_attribute("threshold", json!(80));
        let value = serde_json::to_value(&condition).unwrap();
        assert_eq!(value, json!({"name": "mem-high", "threshold": 80}));
    }

    #[test]
    fn test_strip_policy_association() {
        let mut condition = Condition::new("disk")
            .with_attribute("policy_id", json!(12))
            .with_attribute("type", json!("infra_metric"));
        condition.strip_policy_association();
        assert!(!condition.attributes.contains_key(POLICY_ASSOCIATION_FIELD));
        assert!(condition.attributes.contains_key("type"));
    }

    #[test]
    fn test_incident_preference_wire_strings() {
        let pref: IncidentPreference = serde_json::from_value(json!("PER_CONDITION_AND_TARGET")).unwrap();
        assert_eq!(pref, IncidentPreference::PerConditionAndTarget);
        assert_eq!(pref.to_string(), "PER_CONDITION_AND_TARGET");
        assert_eq!(
            "PER_POLICY".parse::<IncidentPreference>().unwrap(),
            IncidentPreference::PerPolicy
        );
        assert!("per_policy".parse::<IncidentPreference>().is_err());
    }

    #[test]
    fn test_change_accessors() {
        let current = Condition::new("a").with_id(1u64);
        let desired = Condition::new("a").with_id(1u64);
        let change = Change::Update {
            current: current.clone(),
            desired,
        };
        assert_eq!(change.action(), ChangeAction::Update);
        assert_eq!(change.target_id(), Some(&ConditionId::Number(1)));

        let create = Change::Create {
            desired: Condition::new("b"),
        };
        assert!(create.current().is_none());
        assert_eq!(create.name(), "b");

        let delete = Change::Delete { current };
        assert!(delete.desired().is_none());
        assert_eq!(delete.action().to_string(), "delete");
    }
}
