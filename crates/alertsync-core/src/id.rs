//! Remote-assigned identifiers.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier assigned by the monitoring service.
///
/// The REST API hands out integers while some endpoints use strings.
/// Numeric strings are read as numbers, so a quoted `"101"` in a document
/// and `101` from the API are the same id. Anything else stays text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(u64),
    Text(String),
}

/// Identifier of an alert policy.
pub type PolicyId = ResourceId;

/// Identifier of a single alert condition.
pub type ConditionId = ResourceId;

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(n) => write!(f, "{n}"),
            ResourceId::Text(s) => f.write_str(s),
        }
    }
}

impl ResourceId {
    fn from_text(text: &str) -> Self {
        match text.parse::<u64>() {
            Ok(n) => ResourceId::Number(n),
            Err(_) => ResourceId::Text(text.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(u64),
            Text(String),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Number(n) => ResourceId::Number(n),
            Wire::Text(text) => ResourceId::from_text(&text),
        })
    }
}

impl From<u64> for ResourceId {
    fn from(value: u64) -> Self {
        ResourceId::Number(value)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        ResourceId::Text(value.to_string())
    }
}

impl FromStr for ResourceId {
    type Err = std::convert::Infallible;

    /// Numeric strings become [`ResourceId::Number`] so that ids typed on the
    /// command line compare equal to ids fetched from the API.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ResourceId::from_text(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_string_parses_as_number() {
        assert_eq!("42".parse::<ResourceId>().unwrap(), ResourceId::Number(42));
        assert_eq!(
            "abc-1".parse::<ResourceId>().unwrap(),
            ResourceId::Text("abc-1".to_string())
        );
    }

    #[test]
    fn test_serde_keeps_wire_form() {
        let n: ResourceId = serde_json::from_str("123").unwrap();
        assert_eq!(n, ResourceId::Number(123));
        assert_eq!(serde_json::to_string(&n).unwrap(), "123");

        let s: ResourceId = serde_json::from_str("\"x9\"").unwrap();
        assert_eq!(s, ResourceId::Text("x9".into()));
        assert_eq!(serde_json::to_string(&s).unwrap(), "\"x9\"");
    }

    #[test]
    fn test_quoted_numeric_id_matches_api_number() {
        let from_yaml: ResourceId = serde_yaml::from_str("\"101\"").unwrap();
        let from_api: ResourceId = serde_json::from_str("101").unwrap();
        assert_eq!(from_yaml, ResourceId::Number(101));
        assert_eq!(from_yaml, from_api);

        let text: ResourceId = serde_yaml::from_str("abc-101").unwrap();
        assert_eq!(text, ResourceId::Text("abc-101".into()));
    }
}
