//! Desired-state documents.
//!
//! A document is a YAML mapping with the policy's `name` and
//! `incident_preference` at the top level, next to one sequence of
//! conditions per kind, keyed by the kind's plural name:
//!
//! ```yaml
//! name: "{{ team }} production"
//! incident_preference: PER_CONDITION
//! nrql_conditions:
//!   - name: error-rate
//!     enabled: true
//!     nrql:
//!       query: "SELECT count(*) FROM TransactionError"
//! ```
//!
//! The source text is expanded as a template before it is parsed, so the
//! same document can be reused across environments.

use handlebars::Handlebars;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

use crate::error::DocumentError;
use crate::kind::ConditionKind;
use crate::model::{Condition, IncidentPreference, PolicyDescriptor};

const NAME_FIELD: &str = "name";
const INCIDENT_PREFERENCE_FIELD: &str = "incident_preference";

/// Knobs for [`DesiredDocument::parse`].
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Values substituted for `{{ key }}` placeholders.
    pub vars: BTreeMap<String, String>,
    /// Drop every condition id so that matching falls back to names.
    pub ignore_condition_ids: bool,
}

/// Parsed desired state for one policy.
#[derive(Debug, Clone, PartialEq)]
pub struct DesiredDocument {
    pub policy: PolicyDescriptor,
    conditions: IndexMap<ConditionKind, Vec<Condition>>,
}

impl DesiredDocument {
    pub fn new(policy: PolicyDescriptor) -> Self {
        Self {
            policy,
            conditions: IndexMap::new(),
        }
    }

    pub fn with_conditions(mut self, kind: ConditionKind, conditions: Vec<Condition>) -> Self {
        self.set_conditions(kind, conditions);
        self
    }

    pub fn set_conditions(&mut self, kind: ConditionKind, conditions: Vec<Condition>) {
        self.conditions.insert(kind, conditions);
    }

    /// Desired conditions of one kind, in author order. Empty if the kind
    /// is absent from the document.
    pub fn conditions_for(&self, kind: ConditionKind) -> &[Condition] {
        self.conditions.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of desired conditions across all kinds.
    pub fn condition_count(&self) -> usize {
        self.conditions.values().map(Vec::len).sum()
    }

    /// Forgets every condition id.
    pub fn drop_condition_ids(&mut self) {
        for condition in self.conditions.values_mut().flatten() {
            condition.id = None;
        }
    }

    /// Expands `source` as a template, then parses the result.
    pub fn parse(source: &str, options: &ParseOptions) -> Result<Self, DocumentError> {
        let expanded = render_template(source, &options.vars)?;
        let mut document = Self::from_yaml(&expanded)?;
        if options.ignore_condition_ids {
            document.drop_condition_ids();
        } else {
            document.check_unique_ids()?;
        }
        Ok(document)
    }

    /// Parses an already expanded YAML document.
    pub fn from_yaml(text: &str) -> Result<Self, DocumentError> {
        let raw: IndexMap<String, serde_yaml::Value> = serde_yaml::from_str(text)?;

        let mut name = None;
        let mut incident_preference = None;
        let mut conditions = IndexMap::new();

        for (key, value) in raw {
            match key.as_str() {
                NAME_FIELD => name = Some(scalar_string(NAME_FIELD, value)?),
                INCIDENT_PREFERENCE_FIELD => {
                    let raw = scalar_string(INCIDENT_PREFERENCE_FIELD, value)?;
                    incident_preference = Some(raw.parse::<IncidentPreference>()?);
                }
                section => {
                    let kind = ConditionKind::from_plural(section)
                        .ok_or_else(|| DocumentError::UnknownSection(section.to_string()))?;
                    conditions.insert(kind, parse_section(section, value)?);
                }
            }
        }

        let policy = PolicyDescriptor {
            name: name.ok_or(DocumentError::MissingField(NAME_FIELD))?,
            incident_preference: incident_preference
                .ok_or(DocumentError::MissingField(INCIDENT_PREFERENCE_FIELD))?,
        };

        Ok(Self { policy, conditions })
    }

    fn check_unique_ids(&self) -> Result<(), DocumentError> {
        for (kind, conditions) in &self.conditions {
            let mut seen = HashSet::new();
            for id in conditions.iter().filter_map(|c| c.id.as_ref()) {
                if !seen.insert(id) {
                    return Err(DocumentError::DuplicateConditionId {
                        kind: *kind,
                        id: id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Builds the document as a JSON value: policy fields first, then every
    /// non-empty kind in sync order. Policy association is left out.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(NAME_FIELD.into(), Value::String(self.policy.name.clone()));
        root.insert(
            INCIDENT_PREFERENCE_FIELD.into(),
            Value::String(self.policy.incident_preference.to_string()),
        );

        for kind in ConditionKind::ALL {
            let conditions = self.conditions_for(kind);
            if conditions.is_empty() {
                continue;
            }
            let items = conditions
                .iter()
                .map(|condition| {
                    let mut condition = condition.clone();
                    condition.strip_policy_association();
                    serde_json::to_value(condition).unwrap_or(Value::Null)
                })
                .collect();
            root.insert(kind.plural().into(), Value::Array(items));
        }

        Value::Object(root)
    }

    /// Renders the document as YAML.
    pub fn to_yaml(&self) -> Result<String, DocumentError> {
        Ok(serde_yaml::to_string(&self.to_value())?)
    }
}

/// Expands `{{ var }}` placeholders. Unknown variables are an error and
/// values are inserted verbatim.
pub fn render_template(
    source: &str,
    vars: &BTreeMap<String, String>,
) -> Result<String, DocumentError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(true);
    handlebars.register_escape_fn(handlebars::no_escape);
    Ok(handlebars.render_template(source, vars)?)
}

fn scalar_string(field: &str, value: serde_yaml::Value) -> Result<String, DocumentError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        _ => Err(DocumentError::invalid_field(field, "expected a string")),
    }
}

fn parse_section(section: &str, value: serde_yaml::Value) -> Result<Vec<Condition>, DocumentError> {
    let entries = match value {
        serde_yaml::Value::Null => return Ok(Vec::new()),
        serde_yaml::Value::Sequence(entries) => entries,
        _ => {
            return Err(DocumentError::InvalidSection {
                section: section.to_string(),
                message: "expected a list of conditions".to_string(),
            });
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_yaml::from_value::<Condition>(entry).map_err(|e| DocumentError::InvalidSection {
                section: section.to_string(),
                message: format!("entry {index}: {e}"),
            })
        })
        .collect()
}
