use crate::models::LoggingSettings;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Level filter: `RUST_LOG` when set, otherwise debug or info.
pub fn build_env_filter(debug_mode: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if debug_mode { "debug" } else { "info" }))
}

/// Setup logging with a daily rotating file and optional console output.
///
/// # Returns
/// A guard that must be held for the duration of the program to keep logging active
pub fn init_logging(settings: &LoggingSettings) -> Result<WorkerGuard> {
    let log_path = Utf8PathBuf::from(&settings.directory);
    if !log_path.exists() {
        fs::create_dir_all(&log_path)
            .with_context(|| format!("Failed to create log directory: {}", log_path))?;
    }

    let file_appender = rolling::daily(&log_path, &settings.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);
    if settings.json {
        layers.push(file_layer.json().boxed());
    } else {
        layers.push(file_layer.boxed());
    }

    if settings.console {
        layers.push(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_target(false)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(build_env_filter(settings.debug))
        .try_init()
        .context("Failed to install the tracing subscriber")?;

    tracing::info!(
        "Logging initialized: dir={}, prefix={}, debug={}, console={}, json={}",
        settings.directory,
        settings.file_prefix,
        settings.debug,
        settings.console,
        settings.json
    );

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    #[allow(unused_variables)]
    fn test_init_logging_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_dir = temp_dir.path().join("logs");
        let settings = LoggingSettings {
            directory: log_dir.to_str().unwrap().to_string(),
            file_prefix: "test".to_string(),
            ..LoggingSettings::default()
        };

        // Only one subscriber can be installed per process, so the result is
        // not checked, but the directory is created first either way
        let result = init_logging(&settings);

        assert!(log_dir.exists());
    }

    #[test]
    fn test_env_filter_levels() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert_eq!(build_env_filter(true).to_string(), "debug");
        assert_eq!(build_env_filter(false).to_string(), "info");
    }
}
