use std::fs;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::config::LogConfig;

/// Installs the global subscriber: a human-readable stderr layer plus, when
/// `config.dir` is set, a daily-rolling file layer (JSON lines by default).
///
/// `RUST_LOG` overrides `config.level`. With `quiet` the console only shows
/// warnings and errors; the file layer is unaffected.
///
/// Keep the returned guard alive until exit or buffered file lines are lost.
pub fn init_logging(config: &LogConfig, quiet: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("invalid log level {:?}", config.level))?,
    };

    let console_level = if quiet { LevelFilter::WARN } else { LevelFilter::TRACE };
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_level);

    let mut guard = None;
    let (json_layer, plain_layer) = match &config.dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, &config.file_prefix);
            let (writer, g) = tracing_appender::non_blocking(appender);
            guard = Some(g);
            if config.json {
                (Some(fmt::layer().json().with_writer(writer)), None)
            } else {
                (None, Some(fmt::layer().with_ansi(false).with_writer(writer)))
            }
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(plain_layer)
        .try_init()
        .context("install tracing subscriber")?;

    Ok(guard)
}
