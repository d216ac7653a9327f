use color_eyre::Result;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `LMCHAT_LOG=lmchat=debug`
pub const LOG_ENV_VAR: &str = "LMCHAT_LOG";

/// Sends `tracing` output to `path`; the terminal belongs to the UI
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| color_eyre::eyre::eyre!("Could not start logging: {error}"))?;

    tracing::debug!(path = %path.display(), "logging started");
    Ok(())
}
