// ── Domain model ──
//
// Canonical representations the panel works with. Wire types from
// `lookout_api` are converted into these in `crate::convert`.

pub mod identity;
pub mod person;

pub use identity::Identity;
pub use person::{FlagEvaluation, PersonId, PersonRecord};
