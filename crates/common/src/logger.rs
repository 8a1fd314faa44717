use crate::config::AppConfig;
use crate::error::TheoryExplorerError;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Per-store log file: `theory-explorer-<store stem>.log`
pub fn log_file_path(log_dir: &Path, store_path: &Path) -> PathBuf {
    let stem = store_path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("store");
    log_dir.join(format!("theory-explorer-{}.log", stem))
}

/// Filter used when `RUST_LOG` is unset. HTTP client internals stay at warn.
fn default_directives(log_level: &str) -> String {
    format!("{},hyper=warn,reqwest=warn", log_level.trim().to_lowercase())
}

/// Install stderr and per-store file logging.
///
/// Stdout is left to command output. `RUST_LOG` overrides `config.log_level`.
pub fn setup_logging(config: &AppConfig) -> Result<(), TheoryExplorerError> {
    std::fs::create_dir_all(&config.log_dir).map_err(|e| {
        TheoryExplorerError::config(format!(
            "Failed to create log directory {}: {}",
            config.log_dir.display(),
            e
        ))
    })?;

    let log_file_path = log_file_path(&config.log_dir, &config.store_path);
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
        .map_err(|e| {
            TheoryExplorerError::config(format!(
                "Failed to open log file {}: {}",
                log_file_path.display(),
                e
            ))
        })?;

    let directives = default_directives(&config.log_level);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter.clone());

    let file_layer = fmt::layer()
        .with_writer(log_file)
        .with_target(true)
        .with_ansi(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| TheoryExplorerError::config(format!("Failed to install logger: {}", e)))?;

    tracing::debug!(
        "Logging to {} ({}) for store {}",
        log_file_path.display(),
        directives,
        config.store_path.display()
    );

    Ok(())
}
