use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::rolling;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

pub fn init_logging(log_level: &str, log_dir: Option<&Path>) -> Result<()> {
    let default_directive = log_level
        .parse::<Directive>()
        .with_context(|| format!("invalid log level {log_level:?}"))?;
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(default_directive)
                .from_env_lossy(),
        );

    let file_layer = log_dir.map(|dir| {
        fmt::layer()
            .with_writer(rolling::hourly(dir, "axis-camera"))
            .with_ansi(false)
            .with_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::DEBUG.into())
                    .from_env_lossy(),
            )
    });

    Registry::default()
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("logging init failed")
}
