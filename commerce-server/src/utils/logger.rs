//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and
//! production environments.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialize the logger with defaults (`RUST_LOG` or info)
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional level and file output
///
/// When `log_dir` points at an existing directory, output goes to a
/// daily-rolling file there instead of stderr.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.unwrap_or("info")));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    if let Some(dir) = log_dir {
        if Path::new(dir).exists() {
            let file_appender = tracing_appender::rolling::daily(dir, "commerce-server");
            subscriber.with_writer(file_appender).with_ansi(false).init();
            return;
        }
    }

    subscriber.init();
}
