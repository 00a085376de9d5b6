use secrecy::SecretString;
use url::Url;

/// The authenticated context used to address the remote directory.
///
/// Read-only to the core. The session provider creates and replaces it;
/// the panel keeps whatever snapshot it was last handed.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Instance root, e.g. `https://app.example.com`.
    pub url: Url,
    /// Personal API key. Never printed by `Debug`.
    pub api_key: SecretString,
    /// Whether initial setup has been completed for this identity.
    pub person_props: bool,
}

impl Identity {
    pub fn new(url: Url, api_key: SecretString) -> Self {
        Self {
            url,
            api_key,
            person_props: false,
        }
    }

    /// Same identity with setup marked complete.
    #[must_use]
    pub fn with_person_props(mut self, person_props: bool) -> Self {
        self.person_props = person_props;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_api_key() {
        let id = Identity::new(
            Url::parse("https://app.example.com").unwrap(),
            SecretString::from("phx_very_secret".to_string()),
        );
        let dbg = format!("{id:?}");
        assert!(!dbg.contains("phx_very_secret"));
        assert!(dbg.contains("app.example.com"));
    }
}
