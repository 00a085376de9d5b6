// Wire types for the persons API.
//
// Field shapes follow what the server sends; optional fields default so a
// sparse record still decodes. Maps use `IndexMap` to keep server key order.

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Paginated envelope returned by the persons list endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersonsPage {
    pub results: Vec<PersonResponse>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Person identifier: integer on older deployments, string (UUID) on newer ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PersonIdResponse {
    Int(i64),
    Str(String),
}

impl fmt::Display for PersonIdResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// A single person record.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PersonResponse {
    pub id: PersonIdResponse,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub distinct_id: Option<String>,
    #[serde(default)]
    pub distinct_ids: Vec<String>,
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
    #[serde(default)]
    pub feature_flags: Option<IndexMap<String, FlagEvaluationResponse>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Flag evaluation attached to a person.
///
/// Accepts both the flat shape (`reason` / `condition_index` beside `value`)
/// and the nested shape under `evaluation`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlagEvaluationResponse {
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub condition_index: Option<i64>,
    #[serde(default)]
    pub evaluation: Option<EvaluationDetail>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EvaluationDetail {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub condition_index: Option<i64>,
}

impl FlagEvaluationResponse {
    /// Evaluation reason, preferring the flat field.
    pub fn reason(&self) -> Option<&str> {
        self.reason
            .as_deref()
            .or_else(|| self.evaluation.as_ref()?.reason.as_deref())
    }

    /// Matched condition index, preferring the flat field.
    pub fn condition_index(&self) -> Option<i64> {
        self.condition_index
            .or_else(|| self.evaluation.as_ref()?.condition_index)
    }
}

/// The authenticated user, as returned by `/api/users/@me/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub team: Option<TeamSummary>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamSummary {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}
