use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "APPLYTRACK_LOG";

/// Installs a compact stderr subscriber. `APPLYTRACK_LOG` takes precedence
/// over the configured level.
pub fn init(default_level: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)
            .map_err(|e| anyhow!("invalid log level/filter '{}': {}", default_level, e))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {}", e))
}
