use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Server-assigned person identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PersonId {
    Int(i64),
    Uuid(String),
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Uuid(s) => f.write_str(s),
        }
    }
}

/// One feature flag's evaluation for a person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagEvaluation {
    pub value: Value,
    pub reason: String,
    pub condition_index: Option<i64>,
}

/// One matched end-user profile.
///
/// Key order of `properties` and `feature_flags` is the server's.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonRecord {
    pub id: PersonId,
    pub distinct_id: String,
    pub properties: IndexMap<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_flags: Option<IndexMap<String, FlagEvaluation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl PersonRecord {
    /// Minimal record with no properties or flags.
    pub fn new(id: PersonId, distinct_id: impl Into<String>) -> Self {
        Self {
            id,
            distinct_id: distinct_id.into(),
            properties: IndexMap::new(),
            feature_flags: None,
            created_at: None,
        }
    }

    /// A string-valued property, if present.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    /// Best human label: email, then name, then distinct id, then id.
    pub fn display_name(&self) -> String {
        let present = |key| self.property_str(key).filter(|s| !s.is_empty());
        present("email")
            .or_else(|| present("name"))
            .map(str::to_owned)
            .or_else(|| (!self.distinct_id.is_empty()).then(|| self.distinct_id.clone()))
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Number of flags attached (0 when the server sent none).
    pub fn flag_count(&self) -> usize {
        self.feature_flags.as_ref().map_or(0, IndexMap::len)
    }
}

/// Render a JSON property value for a single-line cell.
pub fn property_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_name_prefers_email() {
        let mut p = PersonRecord::new(PersonId::Int(3), "dev-3");
        p.properties.insert("name".into(), json!("Carol"));
        assert_eq!(p.display_name(), "Carol");

        p.properties.insert("email".into(), json!("carol@example.com"));
        assert_eq!(p.display_name(), "carol@example.com");
    }

    #[test]
    fn blank_email_falls_back_to_name() {
        let mut p = PersonRecord::new(PersonId::Int(4), "dev-4");
        p.properties.insert("email".into(), json!(""));
        p.properties.insert("name".into(), json!("Dana"));
        assert_eq!(p.display_name(), "Dana");
    }

    #[test]
    fn display_name_falls_back_to_ids() {
        let p = PersonRecord::new(PersonId::Int(9), "anon-9");
        assert_eq!(p.display_name(), "anon-9");

        let p = PersonRecord::new(PersonId::Uuid("0190-x".into()), "");
        assert_eq!(p.display_name(), "0190-x");
    }

    #[test]
    fn property_text_unquotes_strings() {
        assert_eq!(property_text(&json!("Berlin")), "Berlin");
        assert_eq!(property_text(&json!(42)), "42");
        assert_eq!(property_text(&Value::Null), "");
    }
}
