//! Shared configuration for the lookout CLI and TUI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and the [`ProfileSession`] that hands an [`Identity`] to the panel and
//! persists login and setup completion.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use lookout_core::{ConnectionOptions, Identity, SessionProvider, TlsVerification};

/// Keyring service name under which API keys are stored.
pub const KEYRING_SERVICE: &str = "lookout";

/// Env var that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "LOOKOUT_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' not found")]
    ProfileNotFound { profile: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named instance profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Resolve the active profile name: explicit, then `default_profile`,
    /// then `"default"`.
    pub fn profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named instance profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Instance base URL (e.g., "https://app.example.com").
    pub url: String,

    /// API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Setup has been completed for this profile.
    #[serde(default)]
    pub person_props: bool,

    /// Person property keys shown in list rows and detail headers.
    #[serde(default)]
    pub display_properties: Vec<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `LOOKOUT_CONFIG`, else XDG / platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "lookout", "lookout").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("lookout");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, layered under `LOOKOUT_*` env overrides
/// (`__` separates nesting, e.g. `LOOKOUT_DEFAULTS__TIMEOUT`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LOOKOUT_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
}

/// Resolve an API key from the credential chain.
///
/// A plaintext `api_key` is only present when the last save chose the
/// file, so it wins over whatever the keyring still holds.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_api_key_with(profile, profile_name, |name| {
        keyring_entry(name).and_then(|entry| entry.get_password()).ok()
    })
}

fn resolve_api_key_with(
    profile: &Profile,
    profile_name: &str,
    keyring_lookup: impl FnOnce(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    // 3. System keyring
    if let Some(secret) = keyring_lookup(profile_name) {
        return Ok(SecretString::from(secret));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an API key in the system keyring.
pub fn store_api_key(profile_name: &str, api_key: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(api_key.expose_secret())?;
    Ok(())
}

/// Remove the keyring entry for a profile. A missing entry is not an error.
pub fn clear_api_key(profile_name: &str) -> Result<(), ConfigError> {
    match keyring_entry(profile_name)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Point `default_profile` at `name` unless it already names a profile
/// that exists.
fn claim_default(cfg: &mut Config, name: &str) {
    let dangling = cfg
        .default_profile
        .as_ref()
        .is_none_or(|d| d != name && !cfg.profiles.contains_key(d));
    if dangling {
        cfg.default_profile = Some(name.to_owned());
    }
}

/// Split a comma-separated list of display property keys, dropping
/// blanks and repeats.
pub fn parse_display_properties(raw: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_owned());
        }
    }
    keys
}

/// Parse and validate an instance URL.
pub fn parse_instance_url(raw: &str) -> Result<Url, ConfigError> {
    let url: Url = raw.trim().parse().map_err(|e| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build the panel identity from a profile.
pub fn profile_to_identity(profile: &Profile, profile_name: &str) -> Result<Identity, ConfigError> {
    let url = parse_instance_url(&profile.url)?;
    let api_key = resolve_api_key(profile, profile_name)?;
    Ok(Identity {
        url,
        api_key,
        person_props: profile.person_props,
    })
}

/// Transport options for a profile, falling back to global defaults.
pub fn profile_connection_options(profile: &Profile, defaults: &Defaults) -> ConnectionOptions {
    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    ConnectionOptions {
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    }
}

// ── Session provider ────────────────────────────────────────────────

/// File-backed session: one profile in one config file.
#[derive(Debug, Clone)]
pub struct ProfileSession {
    path: PathBuf,
    profile: Option<String>,
}

impl ProfileSession {
    /// Session over the canonical config file.
    pub fn new(profile: Option<String>) -> Self {
        Self::at(config_path(), profile)
    }

    /// Session over an explicit config file.
    pub fn at(path: impl Into<PathBuf>, profile: Option<String>) -> Self {
        Self {
            path: path.into(),
            profile,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        load_config_from(&self.path)
    }

    /// The resolved profile name for the current file contents.
    pub fn profile_name(&self) -> String {
        match self.load() {
            Ok(cfg) => cfg.profile_name(self.profile.as_deref()),
            Err(_) => self.profile.clone().unwrap_or_else(|| "default".into()),
        }
    }

    fn active_profile(&self) -> Result<(Config, String, Profile), ConfigError> {
        let cfg = self.load()?;
        let name = cfg.profile_name(self.profile.as_deref());
        let profile = cfg
            .profiles
            .get(&name)
            .cloned()
            .ok_or_else(|| ConfigError::ProfileNotFound {
                profile: name.clone(),
            })?;
        Ok((cfg, name, profile))
    }

    /// Identity for the active profile, or why there is none.
    pub fn identity(&self) -> Result<Identity, ConfigError> {
        let (_, name, profile) = self.active_profile()?;
        profile_to_identity(&profile, &name)
    }

    /// Transport options for the active profile (defaults when absent).
    pub fn connection_options(&self) -> ConnectionOptions {
        match self.active_profile() {
            Ok((cfg, _, profile)) => profile_connection_options(&profile, &cfg.defaults),
            Err(_) => ConnectionOptions::default(),
        }
    }

    /// Display property keys chosen during setup.
    pub fn display_properties(&self) -> Vec<String> {
        self.active_profile()
            .map(|(_, _, p)| p.display_properties)
            .unwrap_or_default()
    }

    /// Persist a verified login. Setup is marked pending.
    ///
    /// With `store_in_keyring`, the key goes to the system keyring and the
    /// plaintext field is cleared; otherwise it is written to the file and
    /// any keyring entry for the profile is removed.
    pub fn save_login(
        &self,
        url: &Url,
        api_key: &SecretString,
        store_in_keyring: bool,
    ) -> Result<Identity, ConfigError> {
        let mut cfg = self.load_or_default()?;
        let name = cfg.profile_name(self.profile.as_deref());

        let plaintext = if store_in_keyring {
            store_api_key(&name, api_key)?;
            None
        } else {
            // Unreachable keyring: nothing stale can be read back either.
            if let Err(e) = clear_api_key(&name) {
                warn!(profile = %name, error = %e, "could not remove keyring entry");
            }
            Some(api_key.expose_secret().to_owned())
        };

        claim_default(&mut cfg, &name);
        let profile = cfg.profiles.entry(name.clone()).or_default();
        profile.url = url.to_string();
        profile.api_key = plaintext;
        profile.person_props = false;

        save_config_to(&cfg, &self.path)?;
        info!(profile = %name, keyring = store_in_keyring, "login saved");

        Ok(Identity {
            url: url.clone(),
            api_key: api_key.clone(),
            person_props: false,
        })
    }

    /// Persist setup completion for `current` and return it with setup
    /// marked done.
    ///
    /// The returned identity keeps `current`'s URL and key, which may come
    /// from command-line flags rather than the profile. A missing profile
    /// is created from `current.url` without a stored key.
    pub fn complete_setup(
        &self,
        current: &Identity,
        display_properties: Vec<String>,
    ) -> Result<Identity, ConfigError> {
        let mut cfg = self.load_or_default()?;
        let name = cfg.profile_name(self.profile.as_deref());

        claim_default(&mut cfg, &name);
        let profile = cfg.profiles.entry(name.clone()).or_insert_with(|| Profile {
            url: current.url.to_string(),
            ..Profile::default()
        });
        profile.person_props = true;
        profile.display_properties = display_properties;

        save_config_to(&cfg, &self.path)?;
        info!(profile = %name, "setup completed");
        Ok(current.clone().with_person_props(true))
    }

    fn load_or_default(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            self.load()
        } else {
            Ok(Config::default())
        }
    }
}

impl SessionProvider for ProfileSession {
    fn current_identity(&self) -> Option<Identity> {
        match self.identity() {
            Ok(identity) => Some(identity),
            Err(e) => {
                debug!(error = %e, "no identity for session");
                None
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn profile_name_resolution_order() {
        let mut cfg = Config::default();
        assert_eq!(cfg.profile_name(Some("work")), "work");
        assert_eq!(cfg.profile_name(None), "default");
        cfg.default_profile = Some("home".into());
        assert_eq!(cfg.profile_name(None), "home");
        cfg.default_profile = None;
        assert_eq!(cfg.profile_name(None), "default");
    }

    #[test]
    fn display_properties_drop_blanks_and_repeats() {
        assert_eq!(
            parse_display_properties(" email, ,plan,email ,  org"),
            ["email", "plan", "org"]
        );
        assert!(parse_display_properties(" , ").is_empty());
    }

    #[test]
    fn plaintext_key_wins_over_stale_keyring_entry() {
        let profile = Profile {
            url: "https://app.example.com".into(),
            api_key: Some("phx_new".into()),
            ..Profile::default()
        };
        let key = resolve_api_key_with(&profile, "work", |_| Some("phx_old".into())).unwrap();
        assert_eq!(key.expose_secret(), "phx_new");

        let keyring_only = Profile {
            api_key: None,
            ..profile
        };
        let key = resolve_api_key_with(&keyring_only, "work", |_| Some("phx_old".into())).unwrap();
        assert_eq!(key.expose_secret(), "phx_old");
        assert!(matches!(
            resolve_api_key_with(&keyring_only, "work", |_| None),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn claim_default_replaces_dangling_default() {
        let mut cfg = Config::default();
        claim_default(&mut cfg, "work");
        assert_eq!(cfg.default_profile.as_deref(), Some("work"));

        cfg.profiles.insert("work".into(), Profile::default());
        claim_default(&mut cfg, "home");
        assert_eq!(cfg.default_profile.as_deref(), Some("work"));
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(parse_instance_url("https://app.example.com").is_ok());
        assert!(matches!(
            parse_instance_url("ftp://app.example.com"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(parse_instance_url("not a url").is_err());
    }

    #[test]
    fn connection_options_prefer_profile_overrides() {
        let defaults = Defaults::default();
        let profile = Profile {
            url: "https://a.example".into(),
            timeout: Some(7),
            ca_cert: Some(PathBuf::from("/etc/ca.pem")),
            ..Profile::default()
        };
        let opts = profile_connection_options(&profile, &defaults);
        assert_eq!(opts.timeout, Duration::from_secs(7));
        assert_eq!(opts.tls, TlsVerification::CustomCa(PathBuf::from("/etc/ca.pem")));

        let insecure = Profile {
            insecure: Some(true),
            ..profile
        };
        assert_eq!(
            profile_connection_options(&insecure, &defaults).tls,
            TlsVerification::DangerAcceptInvalid
        );
    }
}
