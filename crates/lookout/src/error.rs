//! CLI error types with miette diagnostics.
//!
//! Maps `QueryError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use lookout_config::ConfigError;
use lookout_core::QueryError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach {url}: {message}")]
    #[diagnostic(
        code(lookout::connection_failed),
        help(
            "Check the instance URL and your network.\n\
             Self-signed certificate? Use --insecure (-k) or set ca_cert in the profile."
        )
    )]
    ConnectionFailed { url: String, message: String },

    #[error("Unexpected response from {url}: {message}")]
    #[diagnostic(
        code(lookout::malformed_response),
        help("The URL may not point at an analytics instance. Check the profile's url.")
    )]
    MalformedResponse { url: String, message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(lookout::auth_failed),
        help(
            "Verify your personal API key and its scopes.\n\
             Run: lookout config set-key --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(lookout::no_credentials),
        help(
            "Configure credentials with: lookout config init\n\
             Or set the LOOKOUT_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lookout::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(lookout::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: lookout config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(lookout::no_config),
        help(
            "Create one with: lookout config init\n\
             Or pass --url and --api-key.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Could not load configuration: {message}")]
    #[diagnostic(code(lookout::config))]
    Config { message: String },

    #[error("System keyring unavailable: {message}")]
    #[diagnostic(
        code(lookout::keyring),
        help("Store the key in the config file instead: lookout config set-key --plaintext")
    )]
    Keyring { message: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {message}")]
    #[diagnostic(code(lookout::render))]
    Render { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Attach the instance and profile a query failure happened against.
    pub fn from_query(err: QueryError, url: &str, profile: &str) -> Self {
        match err {
            QueryError::AuthFailure { message } => Self::AuthFailed {
                profile: profile.into(),
                message,
            },
            QueryError::NetworkFailure { message, .. } => Self::ConnectionFailed {
                url: url.into(),
                message,
            },
            QueryError::MalformedResponse { message } => Self::MalformedResponse {
                url: url.into(),
                message,
            },
            QueryError::Config { message } => Self::Validation {
                field: "connection".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::ProfileNotFound { profile } => Self::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Keyring(e) => Self::Keyring {
                message: e.to_string(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other @ (ConfigError::Serialization(_) | ConfigError::Figment(_)) => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
