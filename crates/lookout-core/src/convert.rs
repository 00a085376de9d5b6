// ── API-to-domain type conversions ──
//
// Bridges raw `lookout_api` response types into `lookout_core::model`.
// Normalizes the two flag shapes and the distinct-id fallback.

use lookout_api::types::{FlagEvaluationResponse, PersonIdResponse, PersonResponse};

use crate::model::{FlagEvaluation, PersonId, PersonRecord};

impl From<PersonIdResponse> for PersonId {
    fn from(id: PersonIdResponse) -> Self {
        match id {
            PersonIdResponse::Int(n) => PersonId::Int(n),
            PersonIdResponse::Str(s) => PersonId::Uuid(s),
        }
    }
}

impl From<FlagEvaluationResponse> for FlagEvaluation {
    fn from(flag: FlagEvaluationResponse) -> Self {
        let reason = flag.reason().unwrap_or_default().to_owned();
        let condition_index = flag.condition_index();
        FlagEvaluation {
            value: flag.value,
            reason,
            condition_index,
        }
    }
}

impl From<PersonResponse> for PersonRecord {
    fn from(p: PersonResponse) -> Self {
        let distinct_id = p
            .distinct_id
            .or_else(|| p.distinct_ids.into_iter().next())
            .unwrap_or_default();

        PersonRecord {
            id: p.id.into(),
            distinct_id,
            properties: p.properties,
            feature_flags: p
                .feature_flags
                .map(|flags| flags.into_iter().map(|(k, v)| (k, v.into())).collect()),
            created_at: p.created_at,
        }
    }
}
