use std::fs;
use std::sync::Arc;
use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

/// Logs go to a file under the config directory; the TUI owns the
/// terminal, so a stderr subscriber would draw over the alternate screen.
pub fn init() -> Result<()> {
    let log_dir = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join("timesheet-cli");
    fs::create_dir_all(&log_dir)?;

    let log_file = fs::File::create(log_dir.join("timesheet-cli.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Arc::new(log_file))
        .init();

    Ok(())
}
