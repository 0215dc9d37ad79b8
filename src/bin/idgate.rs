use anyhow::Result;
use idgate::cli::{actions, start};
use std::process::ExitCode;

// Main function
#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse args, install tracing, load the config
    let (action, globals) = start()?;

    // Handle the action, failures were already reported by the notifier
    if actions::handle(action, &globals).await.is_err() {
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
