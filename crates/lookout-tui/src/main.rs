//! `lookout-tui`: terminal panel for looking up persons in an analytics
//! project.
//!
//! Three screens driven by `lookout_core::Panel`: Login (instance URL and
//! API key), Configure (display properties), and Main (search and
//! results). A launch URL carrying `email` pre-seeds the first search.
//!
//! Logs go to a file (default `/tmp/lookout-tui.log`) so they never
//! corrupt the terminal.

mod action;
mod app;
mod component;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lookout_config::ProfileSession;
use lookout_core::{HttpQueryClient, Identity, LaunchParams, SessionProvider};

use crate::app::App;

/// Terminal panel for looking up persons in an analytics project.
#[derive(Parser, Debug)]
#[command(name = "lookout-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "LOOKOUT_PROFILE")]
    profile: Option<String>,

    /// Instance URL (e.g., https://app.example.com)
    #[arg(short = 'u', long, env = "LOOKOUT_URL")]
    url: Option<String>,

    /// Personal API key
    #[arg(short = 'k', long, env = "LOOKOUT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Launch URL whose `email` query parameter seeds the first search
    #[arg(long, conflicts_with = "email")]
    launch_url: Option<String>,

    /// Email address to search for on startup
    #[arg(short = 'e', long)]
    email: Option<String>,

    /// Log file path
    #[arg(long, default_value = "/tmp/lookout-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing; stdout/stderr belong to the terminal UI. The guard
/// must live as long as the app so buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "lookout_tui={log_level},lookout_core={log_level},lookout_config={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(std::path::Path::new("."));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("lookout-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Identity from `--url` and `--api-key`, if both were given.
///
/// Flag identities are ad hoc: they skip setup unless the selected
/// profile records it as pending.
fn identity_from_flags(cli: &Cli, session: &ProfileSession) -> Result<Option<Identity>> {
    let (Some(url), Some(key)) = (cli.url.as_deref(), cli.api_key.as_deref()) else {
        return Ok(None);
    };
    let url = lookout_config::parse_instance_url(url).wrap_err("invalid --url")?;
    let person_props = session.current_identity().is_none_or(|id| id.person_props);
    Ok(Some(Identity {
        url,
        api_key: SecretString::from(key.to_owned()),
        person_props,
    }))
}

fn launch_params(cli: &Cli) -> Result<LaunchParams> {
    if let Some(ref raw) = cli.launch_url {
        return LaunchParams::parse(raw).wrap_err("invalid --launch-url");
    }
    Ok(cli
        .email
        .clone()
        .map_or_else(LaunchParams::none, LaunchParams::from_email))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks first so a panic during init still restores the terminal.
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let session = ProfileSession::new(cli.profile.clone());
    let launch = launch_params(&cli)?;

    // Priority: CLI flags > config profile > login screen
    let identity = match identity_from_flags(&cli, &session)? {
        Some(identity) => Some(identity),
        None => session.current_identity(),
    };

    info!(
        profile = %session.profile_name(),
        has_identity = identity.is_some(),
        deep_link = launch.email.is_some(),
        "starting lookout-tui"
    );

    let client = HttpQueryClient::new(session.connection_options());
    let mut app = App::new(session, client, identity, launch);
    app.run().await?;

    Ok(())
}
