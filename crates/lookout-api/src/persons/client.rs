// Async HTTP client for the persons API.
//
// Base path: {instance}/api/
// Auth: `Authorization: Bearer {api_key}`

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use super::types::{CurrentUser, PersonsPage};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Path of the person search endpoint, relative to the instance root.
const PERSONS_PATH: &str = "api/projects/@current/persons";
const CURRENT_USER_PATH: &str = "api/users/@me/";

/// Maximum number of body bytes echoed into error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Async client for the persons API.
///
/// Every request is scoped to the credential's current project
/// (`@current`) and authenticated with a bearer token injected as a
/// default header.
pub struct PersonsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PersonsClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an instance URL, a personal API key, and transport config.
    ///
    /// Injects `Authorization: Bearer …` as a sensitive default header.
    pub fn from_api_key(
        base_url: &str,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = Self::normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Ensure the base path ends with `/` so relative joins append
    /// instead of replacing the last segment.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        url.set_query(None);
        Ok(url)
    }

    /// The normalized instance URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Search persons in the current project.
    ///
    /// The server matches `search` against identity fields (email,
    /// distinct ids, name). An empty term lists unfiltered. Results are
    /// returned in server order; only the first page is fetched.
    pub async fn search_persons(&self, search: &str) -> Result<PersonsPage, Error> {
        self.get_with_params(PERSONS_PATH, &[("search", search)])
            .await
    }

    /// Fetch the user owning the API key. Used to verify a credential.
    pub async fn current_user(&self) -> Result<CurrentUser, Error> {
        self.get_with_params(CURRENT_USER_PATH, &[]).await
    }

    // ── HTTP plumbing ────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        self.handle_response(resp).await
    }

    #[allow(clippy::unused_self)]
    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("HTTP {status}: {}", preview(&body)),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await?;
        trace!(len = body.len(), "response body received");

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// Truncate a body to [`BODY_PREVIEW_LEN`] bytes on a char boundary.
fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
