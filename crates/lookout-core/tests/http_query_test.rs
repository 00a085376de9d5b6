#![allow(clippy::unwrap_used)]
// `HttpQueryClient` against a mock instance: request shape and error
// classification as seen by the panel.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lookout_core::{
    ConnectionOptions, HttpQueryClient, Identity, LaunchParams, Panel, PersonRecord, QueryClient,
    QueryError, RenderMode,
};

const PERSONS: &str = "/api/projects/@current/persons";

fn identity_for(server: &MockServer) -> Identity {
    Identity::new(
        Url::parse(&server.uri()).unwrap(),
        SecretString::from("phx_core_key".to_string()),
    )
    .with_person_props(true)
}

#[tokio::test]
async fn search_converts_results_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PERSONS))
        .and(query_param("search", "example.com"))
        .and(header("Authorization", "Bearer phx_core_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "id": 2, "distinct_ids": ["b"], "properties": { "email": "b@example.com" } },
                { "id": 1, "distinct_ids": ["a"], "properties": { "email": "a@example.com" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpQueryClient::new(ConnectionOptions::default());
    let persons = client
        .search(&identity_for(&server), "example.com")
        .await
        .unwrap();

    let names: Vec<String> = persons.iter().map(PersonRecord::display_name).collect();
    assert_eq!(names, ["b@example.com", "a@example.com"]);
    assert_eq!(persons[0].distinct_id, "b");
}

#[tokio::test]
async fn unauthorized_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PERSONS))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = HttpQueryClient::default();
    let err = client.search(&identity_for(&server), "x").await.unwrap_err();
    assert!(err.is_auth_failure(), "got: {err:?}");
}

#[tokio::test]
async fn server_error_is_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PERSONS))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = HttpQueryClient::default();
    let err = client.search(&identity_for(&server), "x").await.unwrap_err();
    assert!(
        matches!(err, QueryError::NetworkFailure { status: Some(500), .. }),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PERSONS))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpQueryClient::default();
    let err = client.search(&identity_for(&server), "x").await.unwrap_err();
    assert!(matches!(err, QueryError::MalformedResponse { .. }), "got: {err:?}");
}

#[tokio::test]
async fn empty_results_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PERSONS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&server)
        .await;

    let client = HttpQueryClient::default();
    let persons = client.search(&identity_for(&server), "").await.unwrap();
    assert!(persons.is_empty());
}

#[tokio::test]
async fn panel_normalizes_http_failure_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PERSONS))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = HttpQueryClient::default();
    let mut panel = Panel::new(
        Some(identity_for(&server)),
        LaunchParams::from_email("z@example.com"),
    );
    let request = panel.activate().unwrap();
    panel.search_with(&client, request).await;

    assert!(!panel.state().loading);
    assert_eq!(panel.render_mode(), RenderMode::Empty);
    assert!(panel.state().last_error.is_some());
}

#[tokio::test]
async fn verify_returns_user_label() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/@me/"))
        .and(header("Authorization", "Bearer phx_core_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "operator@example.com"
        })))
        .mount(&server)
        .await;

    let client = HttpQueryClient::default();
    let label = client.verify(&identity_for(&server)).await.unwrap();
    assert_eq!(label, "operator@example.com");
}

#[tokio::test]
async fn verify_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/@me/"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = HttpQueryClient::default();
    let err = client.verify(&identity_for(&server)).await.unwrap_err();
    assert!(err.is_auth_failure());
}
