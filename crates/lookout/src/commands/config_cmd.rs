//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Confirm, Input, Select};
use secrecy::SecretString;
use tracing::warn;

use lookout_config::{Config, ConfigError, ProfileSession};
use lookout_core::{HttpQueryClient, Identity};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::util::{self, prompt_err};
use crate::config;
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Copy of the config with plaintext keys masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some(MASK.into());
        }
    }
    cfg
}

/// TOML-like listing for `config show`.
fn format_config(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if let Some(ref key) = p.api_key {
            let _ = writeln!(out, "api_key = \"{key}\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        let _ = writeln!(out, "person_props = {}", p.person_props);
        if !p.display_properties.is_empty() {
            let keys: Vec<String> = p.display_properties.iter().map(|k| format!("\"{k}\"")).collect();
            let _ = writeln!(out, "display_properties = [{}]", keys.join(", "));
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out.trim_end().to_owned()
}

fn load_or_default() -> Result<Config, CliError> {
    Ok(config::load(&lookout_config::config_path())?.unwrap_or_default())
}

fn prompt_api_key() -> Result<SecretString, CliError> {
    let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }
    Ok(SecretString::from(key.to_owned()))
}

/// Save the login, falling back to plaintext if the keyring is unavailable.
fn save_login(
    session: &ProfileSession,
    url: &url::Url,
    api_key: &SecretString,
    use_keyring: bool,
) -> Result<Identity, CliError> {
    match session.save_login(url, api_key, use_keyring) {
        Err(ConfigError::Keyring(e)) => {
            warn!(error = %e, "keyring unavailable");
            eprintln!("   ! System keyring unavailable ({e}); saving to config file");
            Ok(session.save_login(url, api_key, false)?)
        }
        other => Ok(other?),
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

async fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = lookout_config::config_path();
    eprintln!("lookout: configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Instance URL
    let raw_url: String = Input::new()
        .with_prompt("Instance URL")
        .validate_with(|s: &String| {
            lookout_config::parse_instance_url(s)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;
    let url = lookout_config::parse_instance_url(&raw_url)?;

    // 3. API key, verified before anything is written
    let api_key = prompt_api_key()?;
    let client = HttpQueryClient::new(lookout_core::ConnectionOptions::default());
    let pb = util::spinner("Verifying API key…", global.quiet);
    let outcome = client.verify(&Identity::new(url.clone(), api_key.clone())).await;
    pb.finish_and_clear();
    let user = outcome.map_err(|e| CliError::from_query(e, url.as_str(), &profile_name))?;
    eprintln!("   ✓ Authenticated as {user}");

    // 4. Storage
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let storage = Select::new()
        .with_prompt("Where to store the API key?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    let session = ProfileSession::at(&config_path, Some(profile_name.clone()));
    let identity = save_login(&session, &url, &api_key, storage == 0)?;

    // 5. Display properties (completes setup)
    let raw_keys: String = Input::new()
        .with_prompt("Display properties (comma separated)")
        .default("email, name".into())
        .interact_text()
        .map_err(prompt_err)?;
    let keys = lookout_config::parse_display_properties(&raw_keys);
    session.complete_setup(&identity, keys)?;

    // 6. Default profile
    let mut cfg = load_or_default()?;
    if cfg.default_profile.as_deref() != Some(profile_name.as_str())
        && Confirm::new()
            .with_prompt(format!("Make '{profile_name}' the default profile?"))
            .default(true)
            .interact()
            .map_err(prompt_err)?
    {
        cfg.default_profile = Some(profile_name.clone());
        lookout_config::save_config_to(&cfg, &config_path)?;
    }

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Profile: {profile_name}");
    eprintln!("\n  Try it: lookout search you@example.com");
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global).await,

        ConfigCommand::Show => {
            let cfg = redacted(&load_or_default()?);
            let out = output::render_single(global.output, &cfg, format_config, |_| {
                lookout_config::config_path().display().to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = load_or_default()?;
            let default = cfg.profile_name(None);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: lookout config init");
            } else {
                let lines: Vec<String> = cfg
                    .profiles
                    .keys()
                    .map(|name| {
                        let marker = if *name == default { " *" } else { "" };
                        format!("{name}{marker}")
                    })
                    .collect();
                output::print_output(&lines.join("\n"), global.quiet);
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let path = lookout_config::config_path();
            let mut cfg = load_or_default()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            lookout_config::save_config_to(&cfg, &path)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetKey { plaintext } => {
            let path = lookout_config::config_path();
            let mut cfg = load_or_default()?;
            let name = cfg.profile_name(global.profile.as_deref());
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }

            let api_key = prompt_api_key()?;
            if plaintext {
                // The file copy wins over the keyring; the entry is only tidied up.
                if let Err(e) = lookout_config::clear_api_key(&name) {
                    warn!(profile = %name, error = %e, "could not remove keyring entry");
                }
            } else {
                lookout_config::store_api_key(&name, &api_key)?;
            }
            if let Some(profile) = cfg.profiles.get_mut(&name) {
                profile.api_key = if plaintext {
                    Some(secrecy::ExposeSecret::expose_secret(&api_key).to_owned())
                } else {
                    None
                };
            }
            lookout_config::save_config_to(&cfg, &path)?;

            let place = if plaintext { "config file" } else { "system keyring" };
            eprintln!("✓ API key for '{name}' stored in {place}");
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", lookout_config::config_path().display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookout_config::Profile;

    #[test]
    fn show_masks_plaintext_keys() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                url: "https://app.example.com".into(),
                api_key: Some("phx_secret_value".into()),
                display_properties: vec!["email".into(), "plan".into()],
                ..Profile::default()
            },
        );

        let out = format_config(&redacted(&cfg));
        assert!(!out.contains("phx_secret_value"));
        assert!(out.contains("api_key = \"****\""));
        assert!(out.contains("display_properties = [\"email\", \"plan\"]"));
    }
}
