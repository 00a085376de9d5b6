// ── Result renderer decision table ──

use strum::{Display, EnumIter};

use crate::model::{FlagEvaluation, PersonRecord};

/// Maximum number of feature flags shown in the single-person detail view.
pub const FLAG_PREVIEW_LIMIT: usize = 5;

/// How the result area should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum RenderMode {
    /// A search is in flight; whatever `persons` holds is stale.
    Skeleton,
    /// Settled with no records (also shown after a failure).
    Empty,
    /// Exactly one record: full detail with a capped flag list.
    Single,
    /// Two or more records: one condensed row each, no flags.
    List,
}

/// Decide the render mode from loading state and result count.
///
/// | loading | count | mode     |
/// |---------|-------|----------|
/// | true    | any   | Skeleton |
/// | false   | 0     | Empty    |
/// | false   | 1     | Single   |
/// | false   | ≥2    | List     |
pub fn render_mode(loading: bool, persons: &[PersonRecord]) -> RenderMode {
    match (loading, persons.len()) {
        (true, _) => RenderMode::Skeleton,
        (false, 0) => RenderMode::Empty,
        (false, 1) => RenderMode::Single,
        (false, _) => RenderMode::List,
    }
}

/// The first [`FLAG_PREVIEW_LIMIT`] flags of a person, in insertion order.
pub fn flag_preview(person: &PersonRecord) -> impl Iterator<Item = (&str, &FlagEvaluation)> {
    person
        .feature_flags
        .iter()
        .flatten()
        .take(FLAG_PREVIEW_LIMIT)
        .map(|(key, flag)| (key.as_str(), flag))
}

/// How many flags the preview leaves out.
pub fn hidden_flag_count(person: &PersonRecord) -> usize {
    person.flag_count().saturating_sub(FLAG_PREVIEW_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PersonId;
    use serde_json::json;
    use strum::IntoEnumIterator;

    fn people(n: usize) -> Vec<PersonRecord> {
        (0..n)
            .map(|i| PersonRecord::new(PersonId::Int(i64::try_from(i).unwrap_or(0)), format!("d{i}")))
            .collect()
    }

    #[test]
    fn table_is_exhaustive() {
        let mut seen = Vec::new();
        for loading in [true, false] {
            for n in [0, 1, 2, 7] {
                let mode = render_mode(loading, &people(n));
                let expected = match (loading, n) {
                    (true, _) => RenderMode::Skeleton,
                    (false, 0) => RenderMode::Empty,
                    (false, 1) => RenderMode::Single,
                    _ => RenderMode::List,
                };
                assert_eq!(mode, expected, "loading={loading} n={n}");
                seen.push(mode);
            }
        }
        for mode in RenderMode::iter() {
            assert!(seen.contains(&mode), "{mode} never produced");
        }
    }

    #[test]
    fn preview_caps_at_five_in_order() {
        let mut person = PersonRecord::new(PersonId::Int(1), "d1");
        let flags = (0..8)
            .map(|i| {
                (
                    format!("flag-{i}"),
                    FlagEvaluation {
                        value: json!(true),
                        reason: "condition_match".into(),
                        condition_index: Some(0),
                    },
                )
            })
            .collect();
        person.feature_flags = Some(flags);

        let keys: Vec<&str> = flag_preview(&person).map(|(k, _)| k).collect();
        assert_eq!(keys, ["flag-0", "flag-1", "flag-2", "flag-3", "flag-4"]);
        assert_eq!(hidden_flag_count(&person), 3);
    }

    #[test]
    fn preview_of_flagless_person_is_empty() {
        let person = PersonRecord::new(PersonId::Int(1), "d1");
        assert_eq!(flag_preview(&person).count(), 0);
        assert_eq!(hidden_flag_count(&person), 0);
    }
}
