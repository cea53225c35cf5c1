use anyhow::{Result, anyhow};
use pimwalk_common::{LogFormat, config::LoggingConfig};

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn setup_logging(config: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    let level = level_override.unwrap_or(&config.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Json => subscriber.json().with_timer(tracing_subscriber::fmt::time::uptime()).try_init(),
        LogFormat::Compact => subscriber.compact().try_init(),
        LogFormat::Pretty => subscriber.pretty().try_init(),
    };
    installed.map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}
