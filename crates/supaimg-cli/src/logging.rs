use anyhow::{Result, anyhow};
use supaimg_core::config::{Config, LogFormat};
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

/// Install a global subscriber writing to stderr. `RUST_LOG` wins over the
/// configured level.
pub fn init(config: &Config) -> Result<()> {
    let default_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|err| anyhow!("invalid log level `{}`: {err}", config.log_level))?;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(default_filter);

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))
}
