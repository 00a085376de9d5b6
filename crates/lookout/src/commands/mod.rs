//! Command dispatch: bridges CLI args to handlers and output formatting.

pub mod config_cmd;
pub mod search;
pub mod util;
pub mod whoami;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a parsed command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Search(args) => search::handle(args, global).await,
        Command::Whoami => whoami::handle(global).await,
        Command::Config(args) => config_cmd::handle(args, global).await,
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = crate::cli::Cli::command();
            generate(args.shell, &mut cmd, "lookout", &mut std::io::stdout());
            Ok(())
        }
    }
}
