//! `lookout search`: one panel search, printed per render mode.
//!
//! Unlike the terminal panel, failures are reported (with an exit code)
//! instead of being shown as an empty result.

use std::fmt::Write as _;

use serde_json::Value;
use tabled::Tabled;
use tracing::debug;

use lookout_core::model::person::property_text;
use lookout_core::{
    HttpQueryClient, Identity, LaunchParams, Panel, PanelEvent, PersonRecord, QueryClient,
    QueryError, RenderMode, flag_preview, hidden_flag_count,
};

use crate::cli::{GlobalOpts, OutputFormat, SearchArgs};
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

pub const NO_RESULTS: &str = "No persons found";

/// Run a single search through the panel: the launch URL's email when
/// given, else the typed query (empty lists recent persons).
pub async fn run_search<C>(
    client: &C,
    identity: Identity,
    launch: LaunchParams,
    query: Option<String>,
) -> Result<Panel, QueryError>
where
    C: QueryClient + Sync,
{
    // No setup step on the command line: start on Main.
    let mut panel = Panel::new(Some(identity.with_person_props(true)), launch);

    let request = match panel.activate() {
        Some(request) => Some(request),
        None => {
            panel.dispatch(PanelEvent::QueryChanged(query.unwrap_or_default()));
            panel.dispatch(PanelEvent::Submit)
        }
    };
    let Some(request) = request else {
        return Err(QueryError::Config {
            message: "no search was issued".into(),
        });
    };

    debug!(seq = request.seq, query = %request.query, "running search");
    let persons = client.search(&request.identity, &request.query).await?;
    panel.settle(request.seq, Ok(persons));
    Ok(panel)
}

// ── Rendering ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct PersonRow {
    #[tabled(rename = "Person")]
    person: String,
    #[tabled(rename = "Distinct ID")]
    distinct_id: String,
    #[tabled(rename = "Properties")]
    pinned: String,
    #[tabled(rename = "Flags")]
    flags: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn pinned_properties(person: &PersonRecord, keys: &[String]) -> String {
    keys.iter()
        .filter(|k| !matches!(k.as_str(), "email" | "name"))
        .filter_map(|k| person.properties.get(k).map(|v| format!("{k}={}", property_text(v))))
        .collect::<Vec<_>>()
        .join(", ")
}

fn person_row(person: &PersonRecord, keys: &[String]) -> PersonRow {
    PersonRow {
        person: person.display_name(),
        distinct_id: person.distinct_id.clone(),
        pinned: pinned_properties(person, keys),
        flags: person
            .feature_flags
            .as_ref()
            .map_or_else(|| "-".into(), |f| f.len().to_string()),
        created: person
            .created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    }
}

fn flag_value(value: &Value, color: bool) -> String {
    match value {
        Value::Bool(true) => util::flag_state("on", true, color),
        Value::Bool(false) => util::flag_state("off", false, color),
        other => util::flag_state(&property_text(other), true, color),
    }
}

/// Detail view: identity, properties (pinned first), flag preview.
pub fn person_detail(person: &PersonRecord, keys: &[String], color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", util::heading(&person.display_name(), color));
    let _ = writeln!(out, "  {:<14}{}", "distinct id", person.distinct_id);
    let _ = writeln!(out, "  {:<14}{}", "id", person.id);
    if let Some(created) = person.created_at {
        let _ = writeln!(out, "  {:<14}{}", "created", created.format("%Y-%m-%d %H:%M UTC"));
    }

    let _ = writeln!(out, "\n{}", util::heading("Properties", color));
    if person.properties.is_empty() {
        let _ = writeln!(out, "  {}", util::muted("No properties", color));
    }
    let pinned = keys.iter().filter_map(|k| person.properties.get_key_value(k));
    let rest = person.properties.iter().filter(|(k, _)| !keys.contains(k));
    for (key, value) in pinned.chain(rest) {
        let _ = writeln!(out, "  {key:<14}{}", property_text(value));
    }

    if person.feature_flags.is_some() {
        let _ = writeln!(out, "\n{}", util::heading("Feature flags", color));
        for (key, flag) in flag_preview(person) {
            let reason = if flag.reason.is_empty() {
                String::new()
            } else {
                format!("  {}", util::muted(&flag.reason, color))
            };
            let _ = writeln!(out, "  {key:<24}{}{reason}", flag_value(&flag.value, color));
        }
        let hidden = hidden_flag_count(person);
        if hidden > 0 {
            let _ = writeln!(out, "  {}", util::muted(&format!("+{hidden} more"), color));
        }
    }

    out.trim_end().to_owned()
}

/// Render the settled panel in the chosen format.
pub fn render(
    panel: &Panel,
    format: OutputFormat,
    keys: &[String],
    color: bool,
) -> Result<String, CliError> {
    let persons = &panel.state().persons;
    let structured = matches!(
        format,
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml
    );

    match panel.render_mode() {
        // Structured output is always the full list, so scripts see one shape.
        _ if structured => output::render_list(
            format,
            persons,
            |p| person_row(p, keys),
            |p| p.distinct_id.clone(),
        ),
        RenderMode::Single => match persons.first() {
            Some(person) => output::render_single(
                format,
                person,
                |p| person_detail(p, keys, color),
                |p| p.distinct_id.clone(),
            ),
            None => Ok(NO_RESULTS.into()),
        },
        RenderMode::Empty | RenderMode::Skeleton => Ok(NO_RESULTS.into()),
        RenderMode::List => output::render_list(
            format,
            persons,
            |p| person_row(p, keys),
            |p| p.distinct_id.clone(),
        ),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: SearchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let launch = match args.launch_url {
        Some(ref raw) => LaunchParams::parse(raw).map_err(|e| CliError::Validation {
            field: "launch-url".into(),
            reason: e.to_string(),
        })?,
        None => LaunchParams::none(),
    };

    let client = HttpQueryClient::new(resolved.options.clone());
    let pb = util::spinner("Searching persons…", global.quiet);
    let outcome = run_search(&client, resolved.identity.clone(), launch, args.query).await;
    pb.finish_and_clear();

    let panel = outcome.map_err(|e| {
        CliError::from_query(e, resolved.identity.url.as_str(), &resolved.profile)
    })?;

    let rendered = render(
        &panel,
        global.output,
        &resolved.display_properties,
        output::should_color(global.color),
    )?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use lookout_core::{FlagEvaluation, PersonId};
    use secrecy::SecretString;
    use serde_json::json;
    use url::Url;

    #[derive(Default)]
    struct StubClient {
        answers: HashMap<String, Result<Vec<PersonRecord>, QueryError>>,
        calls: Mutex<Vec<String>>,
    }

    impl QueryClient for StubClient {
        async fn search(
            &self,
            _identity: &Identity,
            query: &str,
        ) -> Result<Vec<PersonRecord>, QueryError> {
            self.calls.lock().unwrap().push(query.to_owned());
            self.answers.get(query).cloned().unwrap_or(Ok(Vec::new()))
        }
    }

    fn identity() -> Identity {
        Identity::new(
            Url::parse("https://app.example.com").unwrap(),
            SecretString::from("phx_k".to_string()),
        )
    }

    fn person(id: i64, email: &str) -> PersonRecord {
        let mut p = PersonRecord::new(PersonId::Int(id), format!("d{id}"));
        p.properties.insert("email".into(), json!(email));
        p.properties.insert("plan".into(), json!("scale"));
        p
    }

    #[tokio::test]
    async fn launch_email_wins_and_runs_once() {
        let mut client = StubClient::default();
        client
            .answers
            .insert("ada@example.com".into(), Ok(vec![person(1, "ada@example.com")]));

        let panel = run_search(
            &client,
            identity(),
            LaunchParams::from_email("ada@example.com"),
            None,
        )
        .await
        .unwrap();

        assert_eq!(panel.render_mode(), RenderMode::Single);
        assert_eq!(*client.calls.lock().unwrap(), ["ada@example.com"]);
    }

    #[tokio::test]
    async fn failures_are_reported_not_normalized() {
        let mut client = StubClient::default();
        client.answers.insert(
            "x".into(),
            Err(QueryError::NetworkFailure {
                message: "HTTP 503: down".into(),
                status: Some(503),
            }),
        );
        let err = run_search(&client, identity(), LaunchParams::none(), Some("x".into()))
            .await
            .unwrap_err();
        assert!(err.is_network_failure());
    }

    #[tokio::test]
    async fn empty_prints_no_results_but_json_prints_empty_list() {
        let client = StubClient::default();
        let panel = run_search(&client, identity(), LaunchParams::none(), Some("zzz".into()))
            .await
            .unwrap();

        assert_eq!(render(&panel, OutputFormat::Table, &[], false).unwrap(), NO_RESULTS);
        assert_eq!(render(&panel, OutputFormat::JsonCompact, &[], false).unwrap(), "[]");
    }

    #[tokio::test]
    async fn list_renders_table_with_pinned_properties() {
        let mut client = StubClient::default();
        client.answers.insert(
            "example".into(),
            Ok(vec![person(1, "a@example.com"), person(2, "b@example.com")]),
        );
        let panel = run_search(&client, identity(), LaunchParams::none(), Some("example".into()))
            .await
            .unwrap();

        let out = render(&panel, OutputFormat::Table, &["email".into(), "plan".into()], false).unwrap();
        assert!(out.contains("a@example.com"));
        assert!(out.contains("b@example.com"));
        assert!(out.contains("plan=scale"));

        let plain = render(&panel, OutputFormat::Plain, &[], false).unwrap();
        assert_eq!(plain, "d1\nd2");
    }

    #[test]
    fn detail_caps_flags() {
        let mut p = person(1, "ada@example.com");
        p.feature_flags = Some(
            (0..8)
                .map(|i| {
                    (
                        format!("flag-{i}"),
                        FlagEvaluation {
                            value: json!(i % 2 == 0),
                            reason: "condition_match".into(),
                            condition_index: Some(0),
                        },
                    )
                })
                .collect(),
        );

        let out = person_detail(&p, &["plan".into()], false);
        assert!(out.starts_with("ada@example.com"));
        assert!(out.contains("flag-4"));
        assert!(!out.contains("flag-5"));
        assert!(out.contains("+3 more"));
        let plan = out.find("plan").unwrap();
        let email = out.find("email").unwrap();
        assert!(plan < email, "pinned property should come first:\n{out}");
    }
}
