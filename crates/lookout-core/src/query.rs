// ── Query client ──
//
// The seam between the panel and the network. `HttpQueryClient` is the
// production implementation over `lookout_api::PersonsClient`; tests plug
// in stubs.

use std::future::Future;

use lookout_api::PersonsClient;
use secrecy::ExposeSecret;
use tracing::debug;

use crate::config::ConnectionOptions;
use crate::error::QueryError;
use crate::model::{Identity, PersonRecord};

/// Looks up persons matching a free-text term.
///
/// Implementations neither deduplicate nor cancel concurrent calls; the
/// panel sequences them. Zero matches is `Ok(vec![])`.
pub trait QueryClient {
    fn search(
        &self,
        identity: &Identity,
        query: &str,
    ) -> impl Future<Output = Result<Vec<PersonRecord>, QueryError>> + Send;
}

/// HTTP implementation scoped to the identity's current project.
#[derive(Debug, Clone, Default)]
pub struct HttpQueryClient {
    options: ConnectionOptions,
}

impl HttpQueryClient {
    pub fn new(options: ConnectionOptions) -> Self {
        Self { options }
    }

    fn client_for(&self, identity: &Identity) -> Result<PersonsClient, QueryError> {
        if identity.api_key.expose_secret().is_empty() {
            return Err(QueryError::Config {
                message: "API key is empty".into(),
            });
        }
        Ok(PersonsClient::from_api_key(
            identity.url.as_str(),
            &identity.api_key,
            &self.options.transport(),
        )?)
    }

    /// Check that the identity's credential is accepted.
    ///
    /// Returns a label for the authenticated user (email, else first name).
    pub async fn verify(&self, identity: &Identity) -> Result<String, QueryError> {
        let client = self.client_for(identity)?;
        let user = client.current_user().await?;
        let label = user
            .email
            .or(user.first_name)
            .unwrap_or_else(|| "unknown user".into());
        debug!(user = %label, "credential verified");
        Ok(label)
    }
}

impl QueryClient for HttpQueryClient {
    async fn search(
        &self,
        identity: &Identity,
        query: &str,
    ) -> Result<Vec<PersonRecord>, QueryError> {
        let client = self.client_for(identity)?;
        let page = client.search_persons(query).await?;
        debug!(
            query,
            count = page.results.len(),
            more = page.next.is_some(),
            "person search settled"
        );
        Ok(page.results.into_iter().map(PersonRecord::from).collect())
    }
}
