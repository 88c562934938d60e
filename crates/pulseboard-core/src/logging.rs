use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants::env;

/// Where log lines go when `PULSEBOARD_LOG_FILE` is not set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Nothing is written; the terminal belongs to the UI
    Silent,
    Stderr,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(env::LOG_FILTER).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init_logging(service_name: &str, fallback: LogTarget) {
    let file_logging = std::env::var(env::LOG_FILE).ok();

    let file_layer = file_logging.as_deref().and_then(|log_path| {
        match OpenOptions::new().create(true).append(true).open(log_path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_filter(env_filter()),
            ),
            Err(e) => {
                eprintln!("Could not open log file {}: {}", log_path, e);
                None
            }
        }
    });

    let stderr_layer = (file_layer.is_none() && fallback == LogTarget::Stderr).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(env_filter())
    });

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(service = service_name, "logging initialized");
    }
}
