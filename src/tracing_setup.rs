//! Tracing subscriber setup
//!
//! Stdout belongs to the TUI, so diagnostics go to a file. The filter comes
//! from `RUST_LOG` and defaults to `info`.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Default diagnostics file: `riveflow.log` in the system temp directory.
pub fn default_log_path() -> PathBuf {
    std::env::temp_dir().join("riveflow.log")
}

/// Initialize the global tracing subscriber writing to `log_file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be created or a global subscriber
/// is already installed.
pub fn init_global(log_file_path: &Path) -> anyhow::Result<()> {
    let log_file = File::create(log_file_path)?;
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    build_subscriber(log_file, env_filter(&directives)).try_init()?;
    Ok(())
}

/// Parse `RUST_LOG`-style directives, falling back to `info` when none
/// set a global level. Invalid directives are skipped.
pub fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

/// Build a subscriber writing to `log_file`.
///
/// This is the subscriber configuration shared between the binary and tests.
pub fn build_subscriber(log_file: File, env_filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .with_thread_names(true);

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn capture(filter: EnvFilter, emit: impl FnOnce()) -> String {
        let log_file = NamedTempFile::new().unwrap();
        let subscriber = build_subscriber(log_file.reopen().unwrap(), filter);
        tracing::subscriber::with_default(subscriber, emit);
        std::fs::read_to_string(log_file.path()).unwrap()
    }

    #[test]
    fn test_default_filter_keeps_info_drops_debug() {
        let contents = capture(env_filter(""), || {
            tracing::info!("process started");
            tracing::debug!("mode change");
        });
        assert!(contents.contains("process started"));
        assert!(contents.contains("INFO"));
        assert!(!contents.contains("mode change"));
    }

    #[test]
    fn test_explicit_filter_enables_debug() {
        let contents = capture(env_filter("debug"), || {
            tracing::debug!("mode change");
        });
        assert!(contents.contains("mode change"));
    }

    #[test]
    fn test_log_has_no_color_codes() {
        let contents = capture(env_filter(""), || {
            tracing::warn!("spawn failed");
        });
        assert!(contents.contains("WARN"));
        assert!(!contents.contains('\x1b'));
    }

    #[test]
    fn test_default_log_path_is_in_temp_dir() {
        let path = default_log_path();
        assert!(path.starts_with(std::env::temp_dir()));
        assert_eq!(path.file_name().unwrap(), "riveflow.log");
    }
}
