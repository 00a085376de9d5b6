// ── Runtime connection options ──
//
// How to reach the analytics instance beyond what an `Identity` carries.
// Built by the CLI/TUI from configuration; core never reads config files.

use std::time::Duration;

use lookout_api::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-hosted instances with self-signed certs).
    DangerAcceptInvalid,
}

/// Transport tuning handed to [`HttpQueryClient`](crate::HttpQueryClient).
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ConnectionOptions {
    /// Map into the api-level transport config.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
