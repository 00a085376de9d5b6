#![allow(clippy::unwrap_used)]
// Behavioural tests for the panel state machine against a stub query client.

use std::collections::HashMap;
use std::sync::Mutex;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;

use lookout_core::{
    FlagEvaluation, Identity, LaunchParams, Panel, PanelEvent, PersonId, PersonRecord,
    QueryClient, QueryError, RenderMode, Screen, flag_preview,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn identity(person_props: bool) -> Identity {
    Identity::new(
        Url::parse("https://app.example.com").unwrap(),
        SecretString::from("phx_test".to_string()),
    )
    .with_person_props(person_props)
}

fn person(id: i64, email: &str) -> PersonRecord {
    let mut p = PersonRecord::new(PersonId::Int(id), format!("distinct-{id}"));
    p.properties.insert("email".into(), json!(email));
    p
}

/// Answers from a fixed table and records every query it sees.
#[derive(Default)]
struct StubClient {
    answers: HashMap<String, Result<Vec<PersonRecord>, QueryError>>,
    calls: Mutex<Vec<String>>,
}

impl StubClient {
    fn with(mut self, query: &str, answer: Result<Vec<PersonRecord>, QueryError>) -> Self {
        self.answers.insert(query.to_owned(), answer);
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
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

// ── Deep link ───────────────────────────────────────────────────────

#[tokio::test]
async fn deep_link_bootstraps_single_result() {
    let launch =
        LaunchParams::parse("https://shop.example.com/panel?email=alice@example.com").unwrap();
    let client = StubClient::default().with(
        "alice@example.com",
        Ok(vec![person(1, "alice@example.com")]),
    );

    let mut panel = Panel::new(Some(identity(true)), launch);
    assert_eq!(panel.screen(), Screen::Main);

    let request = panel.activate().unwrap();
    assert_eq!(request.query, "alice@example.com");
    assert!(panel.state().loading);
    assert_eq!(panel.render_mode(), RenderMode::Skeleton);

    assert!(panel.search_with(&client, request).await);

    let state = panel.state();
    assert_eq!(state.query, "alice@example.com");
    assert!(!state.loading);
    assert_eq!(state.persons.len(), 1);
    assert_eq!(panel.render_mode(), RenderMode::Single);
    assert_eq!(client.calls(), ["alice@example.com"]);
}

#[test]
fn deep_link_without_identity_does_nothing() {
    let mut panel = Panel::new(None, LaunchParams::from_email("alice@example.com"));
    assert!(panel.activate().is_none());
    assert_eq!(panel.state().query, "");
    assert!(!panel.state().loading);
}

#[test]
fn deep_link_waits_for_setup_then_fires_once() {
    let mut panel = Panel::new(Some(identity(false)), LaunchParams::from_email("bob@example.com"));
    assert_eq!(panel.screen(), Screen::Configure);
    assert!(panel.activate().is_none());

    let request = panel
        .dispatch(PanelEvent::SetupCompleted(identity(true)))
        .unwrap();
    assert_eq!(panel.screen(), Screen::Main);
    assert_eq!(request.query, "bob@example.com");
    panel.settle(request.seq, Ok(Vec::new()));

    // Leaving and re-entering main does not replay the deep link.
    assert!(panel.dispatch(PanelEvent::SettingsRequested).is_none());
    assert_eq!(panel.screen(), Screen::Configure);
    assert!(panel
        .dispatch(PanelEvent::SetupCompleted(identity(true)))
        .is_none());
    assert_eq!(panel.last_issued(), 1);
}

#[test]
fn bootstrap_is_consumed_even_without_email() {
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());
    assert!(panel.activate().is_none());
    assert_eq!(panel.last_issued(), 0);
}

// ── Manual search ───────────────────────────────────────────────────

#[tokio::test]
async fn empty_query_submission_renders_empty() {
    let client = StubClient::default().with("", Ok(Vec::new()));
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());
    panel.activate();

    let request = panel.dispatch(PanelEvent::Submit).unwrap();
    assert_eq!(request.query, "");
    assert!(panel.search_with(&client, request).await);

    assert!(panel.state().persons.is_empty());
    assert!(panel.state().last_error.is_none());
    assert_eq!(panel.render_mode(), RenderMode::Empty);
    assert_eq!(client.calls(), [""]);
}

#[tokio::test]
async fn typed_query_is_what_gets_searched() {
    let client = StubClient::default().with(
        "carol",
        Ok(vec![person(3, "carol@example.com"), person(4, "carol@work.example")]),
    );
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());

    panel.dispatch(PanelEvent::QueryChanged("car".into()));
    panel.dispatch(PanelEvent::QueryChanged("carol".into()));
    let request = panel.dispatch(PanelEvent::Submit).unwrap();
    panel.search_with(&client, request).await;

    assert_eq!(panel.state().query, "carol");
    assert_eq!(panel.render_mode(), RenderMode::List);
    let ids: Vec<String> = panel
        .state()
        .persons
        .iter()
        .map(|p| p.id.to_string())
        .collect();
    assert_eq!(ids, ["3", "4"]);
}

#[test]
fn submit_without_identity_is_noop() {
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());
    panel.dispatch(PanelEvent::IdentityChanged(None));
    assert_eq!(panel.screen(), Screen::Main);

    assert!(panel.dispatch(PanelEvent::Submit).is_none());
    assert!(!panel.state().loading);
}

// ── Loading invariant and failures ──────────────────────────────────

#[test]
fn loading_brackets_issue_and_settlement() {
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());
    let request = panel.dispatch(PanelEvent::Submit).unwrap();

    assert!(panel.state().loading);
    assert!(panel.state().persons.is_empty());

    panel.settle(request.seq, Ok(vec![person(1, "a@example.com")]));
    assert!(!panel.state().loading);
    assert_eq!(panel.state().persons.len(), 1);
}

#[tokio::test]
async fn failure_clears_loading_and_results() {
    let client = StubClient::default()
        .with("dave", Ok(vec![person(5, "dave@example.com")]))
        .with(
            "eve",
            Err(QueryError::NetworkFailure {
                message: "connection refused".into(),
                status: None,
            }),
        );
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());

    panel.dispatch(PanelEvent::QueryChanged("dave".into()));
    let request = panel.dispatch(PanelEvent::Submit).unwrap();
    panel.search_with(&client, request).await;
    assert_eq!(panel.state().persons.len(), 1);

    panel.dispatch(PanelEvent::QueryChanged("eve".into()));
    let request = panel.dispatch(PanelEvent::Submit).unwrap();
    panel.search_with(&client, request).await;

    let state = panel.state();
    assert!(!state.loading);
    assert!(state.persons.is_empty());
    assert!(state.last_error.as_ref().unwrap().is_network_failure());
    assert_eq!(panel.render_mode(), RenderMode::Empty);
}

#[test]
fn auth_failure_does_not_redirect_to_login() {
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());
    let request = panel.dispatch(PanelEvent::Submit).unwrap();
    panel.settle(
        request.seq,
        Err(QueryError::AuthFailure {
            message: "HTTP 401".into(),
        }),
    );
    assert_eq!(panel.screen(), Screen::Main);
    assert_eq!(panel.render_mode(), RenderMode::Empty);
}

// ── Sequencing ──────────────────────────────────────────────────────

#[test]
fn stale_settlement_is_discarded() {
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());

    panel.dispatch(PanelEvent::QueryChanged("first".into()));
    let first = panel.dispatch(PanelEvent::Submit).unwrap();
    panel.dispatch(PanelEvent::QueryChanged("second".into()));
    let second = panel.dispatch(PanelEvent::Submit).unwrap();
    assert!(second.seq > first.seq);

    // The older response arrives first and must not be shown.
    assert!(!panel.settle(first.seq, Ok(vec![person(1, "first@example.com")])));
    assert!(panel.state().loading);
    assert_eq!(panel.render_mode(), RenderMode::Skeleton);

    assert!(panel.settle(second.seq, Ok(vec![person(2, "second@example.com")])));
    assert!(!panel.state().loading);
    assert_eq!(panel.state().persons[0].id, PersonId::Int(2));
}

#[test]
fn late_stale_settlement_after_latest_is_discarded() {
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());
    let first = panel.dispatch(PanelEvent::Submit).unwrap();
    let second = panel.dispatch(PanelEvent::Submit).unwrap();

    panel.settle(second.seq, Ok(vec![person(2, "b@example.com")]));
    assert!(!panel.settle(first.seq, Ok(Vec::new())));
    assert_eq!(panel.state().persons.len(), 1);
    assert!(!panel.state().loading);
}

// ── Screens ─────────────────────────────────────────────────────────

#[test]
fn forward_flow_login_configure_main() {
    let mut panel = Panel::new(None, LaunchParams::none());
    assert_eq!(panel.screen(), Screen::Login);

    panel.dispatch(PanelEvent::AuthSucceeded(identity(false)));
    assert_eq!(panel.screen(), Screen::Configure);
    assert!(panel.identity().is_some());

    panel.dispatch(PanelEvent::SetupCompleted(identity(true)));
    assert_eq!(panel.screen(), Screen::Main);
    assert!(panel.identity().unwrap().person_props);
}

#[test]
fn no_transition_returns_to_login() {
    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());
    panel.dispatch(PanelEvent::IdentityChanged(None));
    panel.dispatch(PanelEvent::AuthSucceeded(identity(false)));
    assert_eq!(panel.screen(), Screen::Main);

    panel.dispatch(PanelEvent::SettingsRequested);
    panel.dispatch(PanelEvent::AuthSucceeded(identity(false)));
    assert_eq!(panel.screen(), Screen::Configure);
}

#[test]
fn query_edits_ignored_outside_main() {
    let mut panel = Panel::new(Some(identity(false)), LaunchParams::none());
    panel.dispatch(PanelEvent::QueryChanged("ignored".into()));
    assert_eq!(panel.state().query, "");
}

// ── Rendering ───────────────────────────────────────────────────────

#[test]
fn single_person_with_eight_flags_previews_five() {
    let mut p = person(1, "flags@example.com");
    p.feature_flags = Some(
        (1..=8)
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

    let mut panel = Panel::new(Some(identity(true)), LaunchParams::none());
    let request = panel.dispatch(PanelEvent::Submit).unwrap();
    panel.settle(request.seq, Ok(vec![p]));
    assert_eq!(panel.render_mode(), RenderMode::Single);

    let shown: Vec<&str> = flag_preview(&panel.state().persons[0])
        .map(|(k, _)| k)
        .collect();
    assert_eq!(shown, ["flag-1", "flag-2", "flag-3", "flag-4", "flag-5"]);
}
