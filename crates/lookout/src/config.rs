//! Identity resolution for one CLI invocation.
//!
//! Priority: `--url` / `--api-key` flags, then the selected profile. A
//! profile's TLS and timeout settings can be overridden with `--insecure`
//! and `--timeout`.

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;

use lookout_config::{Config, Profile};
use lookout_core::{ConnectionOptions, Identity, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a command needs to talk to the instance.
#[derive(Debug)]
pub struct Resolved {
    pub profile: String,
    pub identity: Identity,
    pub options: ConnectionOptions,
    pub display_properties: Vec<String>,
}

/// Load the config file if present; a missing file is an empty config.
pub fn load(path: &Path) -> Result<Option<Config>, CliError> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(lookout_config::load_config_from(path)?))
}

pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let path = lookout_config::config_path();
    let cfg = load(&path)?;
    resolve_from(global, cfg.as_ref(), &path)
}

fn resolve_from(global: &GlobalOpts, cfg: Option<&Config>, path: &Path) -> Result<Resolved, CliError> {
    let defaults = cfg.map(|c| c.defaults.clone()).unwrap_or_default();
    let name = cfg.map_or_else(
        || global.profile.clone().unwrap_or_else(|| "default".into()),
        |c| c.profile_name(global.profile.as_deref()),
    );

    if let Some(profile) = cfg.and_then(|c| c.profiles.get(&name)) {
        return from_profile(global, profile, &defaults, name);
    }

    // No profile: build from flags alone.
    let Some(raw_url) = global.url.as_deref() else {
        return Err(match cfg {
            Some(c) => CliError::ProfileNotFound {
                name,
                available: available_profiles(c),
            },
            None => CliError::NoConfig {
                path: path.display().to_string(),
            },
        });
    };
    let url = lookout_config::parse_instance_url(raw_url)?;
    let api_key = global
        .api_key
        .clone()
        .ok_or_else(|| CliError::NoCredentials {
            profile: name.clone(),
        })?;

    let mut options = ConnectionOptions {
        timeout: Duration::from_secs(defaults.timeout),
        ..ConnectionOptions::default()
    };
    if defaults.insecure {
        options.tls = TlsVerification::DangerAcceptInvalid;
    }
    apply_overrides(global, &mut options);

    Ok(Resolved {
        profile: name,
        identity: Identity::new(url, SecretString::from(api_key)).with_person_props(true),
        options,
        display_properties: Vec::new(),
    })
}

fn from_profile(
    global: &GlobalOpts,
    profile: &Profile,
    defaults: &lookout_config::Defaults,
    name: String,
) -> Result<Resolved, CliError> {
    let url = lookout_config::parse_instance_url(global.url.as_deref().unwrap_or(&profile.url))?;
    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => lookout_config::resolve_api_key(profile, &name)?,
    };

    let mut options = lookout_config::profile_connection_options(profile, defaults);
    apply_overrides(global, &mut options);

    Ok(Resolved {
        identity: Identity::new(url, api_key).with_person_props(profile.person_props),
        options,
        display_properties: profile.display_properties.clone(),
        profile: name,
    })
}

fn apply_overrides(global: &GlobalOpts, options: &mut ConnectionOptions) {
    if global.insecure {
        options.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        options.timeout = Duration::from_secs(secs);
    }
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::{ColorMode, OutputFormat};
    use secrecy::ExposeSecret;

    fn opts() -> GlobalOpts {
        GlobalOpts {
            profile: None,
            url: None,
            api_key: None,
            output: OutputFormat::Table,
            color: ColorMode::Never,
            verbose: 0,
            quiet: false,
            insecure: false,
            timeout: None,
        }
    }

    fn config_with_work() -> Config {
        let mut cfg = Config::default();
        cfg.default_profile = Some("work".into());
        cfg.profiles.insert(
            "work".into(),
            Profile {
                url: "https://eu.example.com".into(),
                api_key: Some("phx_file".into()),
                person_props: true,
                display_properties: vec!["plan".into()],
                timeout: Some(5),
                ..Profile::default()
            },
        );
        cfg
    }

    #[test]
    fn missing_file_without_flags_is_no_config() {
        let err = resolve_from(&opts(), None, Path::new("/x/config.toml")).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let cfg = config_with_work();
        let mut global = opts();
        global.profile = Some("staging".into());
        let err = resolve_from(&global, Some(&cfg), Path::new("/x")).unwrap_err();
        let CliError::ProfileNotFound { available, .. } = err else {
            panic!("expected ProfileNotFound");
        };
        assert_eq!(available, "work");
    }

    #[test]
    fn flags_override_profile() {
        let cfg = config_with_work();
        let mut global = opts();
        global.api_key = Some("phx_flag".into());
        global.timeout = Some(60);
        global.insecure = true;

        let resolved = resolve_from(&global, Some(&cfg), Path::new("/x")).unwrap();
        assert_eq!(resolved.profile, "work");
        assert_eq!(resolved.identity.api_key.expose_secret(), "phx_flag");
        assert_eq!(resolved.identity.url.host_str(), Some("eu.example.com"));
        assert_eq!(resolved.options.timeout, Duration::from_secs(60));
        assert!(matches!(resolved.options.tls, TlsVerification::DangerAcceptInvalid));
        assert_eq!(resolved.display_properties, ["plan"]);
    }

    #[test]
    fn flags_alone_need_a_key() {
        let mut global = opts();
        global.url = Some("https://app.example.com".into());
        let err = resolve_from(&global, None, Path::new("/x")).unwrap_err();
        assert!(matches!(err, CliError::NoCredentials { .. }));

        global.api_key = Some("phx_k".into());
        let resolved = resolve_from(&global, None, Path::new("/x")).unwrap();
        assert!(resolved.identity.person_props);
        assert_eq!(resolved.options.timeout, Duration::from_secs(30));
    }
}
