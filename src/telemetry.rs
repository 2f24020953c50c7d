use crate::config::LogConfig;
use color_eyre::Result;
use std::{fs::create_dir_all, io};
use tracing_appender::rolling;
#[cfg(feature = "bunyan")]
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Log to a file under `config.dir` and echo warnings and errors to stderr.
///
/// The file filter comes from `RUST_LOG` and defaults to `info`.
///
/// # Errors
///
/// Fails if the log directory cannot be created or a global subscriber is
/// already set.
pub fn setup_logger(config: &LogConfig) -> Result<()> {
    create_dir_all(&config.dir)?;

    let logfile = if cfg!(debug_assertions) {
        rolling::daily(&config.dir, &config.file_name)
    } else {
        rolling::never(&config.dir, &config.file_name)
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(feature = "bunyan")]
    let file_layer = JsonStorageLayer
        .and_then(BunyanFormattingLayer::new("dom-relay".into(), logfile))
        .with_filter(env_filter);
    #[cfg(not(feature = "bunyan"))]
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(logfile)
        .with_filter(env_filter);

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(LevelFilter::WARN);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(())
}
