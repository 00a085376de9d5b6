// ── Query error types ──
//
// What a search can fail with, as seen by the panel and its hosts.
// Consumers never see reqwest or serde errors directly; the
// `From<lookout_api::Error>` impl classifies them.

use thiserror::Error;

/// Failure of a single person search.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// Credential rejected (HTTP 401 or 403).
    #[error("Authentication failed: {message}")]
    AuthFailure { message: String },

    /// Connect, DNS, TLS, or timeout failure, or a non-success status.
    #[error("Network failure: {message}")]
    NetworkFailure {
        message: String,
        /// HTTP status when the server answered.
        status: Option<u16>,
    },

    /// Body was not JSON or lacked a `results` array.
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// The identity could not be turned into a request (bad URL, bad key).
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl QueryError {
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailure { .. })
    }

    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<lookout_api::Error> for QueryError {
    fn from(err: lookout_api::Error) -> Self {
        match err {
            lookout_api::Error::Authentication { message } => QueryError::AuthFailure { message },
            lookout_api::Error::Transport(ref e) => {
                let message = if e.is_timeout() {
                    format!("request timed out: {e}")
                } else if e.is_connect() {
                    format!("cannot connect: {e}")
                } else {
                    e.to_string()
                };
                QueryError::NetworkFailure {
                    message,
                    status: e.status().map(|s| s.as_u16()),
                }
            }
            lookout_api::Error::Tls(message) => QueryError::NetworkFailure {
                message: format!("TLS: {message}"),
                status: None,
            },
            lookout_api::Error::Api { status, message } => {
                if status == 401 || status == 403 {
                    QueryError::AuthFailure { message }
                } else {
                    QueryError::NetworkFailure {
                        message: format!("HTTP {status}: {message}"),
                        status: Some(status),
                    }
                }
            }
            lookout_api::Error::Deserialization { message, .. } => {
                QueryError::MalformedResponse { message }
            }
            lookout_api::Error::InvalidUrl(e) => QueryError::Config {
                message: format!("invalid instance URL: {e}"),
            },
        }
    }
}
