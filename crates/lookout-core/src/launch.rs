// Launch parameters: the deep link the panel was opened with.

use url::Url;

/// Values carried by the launch URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchParams {
    /// Pre-seeded search term from the `email` query parameter.
    pub email: Option<String>,
}

impl LaunchParams {
    /// No deep link.
    pub fn none() -> Self {
        Self::default()
    }

    /// Seed directly with an email address.
    pub fn from_email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
        }
    }

    /// Extract `email` from a launch URL's query string (percent-decoded).
    ///
    /// The first occurrence wins. A present-but-empty parameter still counts.
    pub fn from_url(url: &Url) -> Self {
        let email = url
            .query_pairs()
            .find(|(k, _)| k == "email")
            .map(|(_, v)| v.into_owned());
        Self { email }
    }

    /// Parse a raw launch URL string.
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Ok(Self::from_url(&Url::parse(raw)?))
    }
}
