//! `lookout whoami`: verify the resolved key against the instance.

use lookout_core::HttpQueryClient;

use crate::cli::GlobalOpts;
use crate::commands::util;
use crate::config;
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let client = HttpQueryClient::new(resolved.options.clone());

    let pb = util::spinner("Checking API key…", global.quiet);
    let outcome = client.verify(&resolved.identity).await;
    pb.finish_and_clear();

    let user = outcome.map_err(|e| {
        CliError::from_query(e, resolved.identity.url.as_str(), &resolved.profile)
    })?;
    let host = resolved.identity.url.host_str().unwrap_or("(unknown host)");

    output::print_output(
        &format!("{user} on {host} (profile '{}')", resolved.profile),
        global.quiet,
    );
    Ok(())
}
