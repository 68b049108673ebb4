//! Logging Infrastructure
//!
//! Structured logging with `RUST_LOG` filtering and optional daily rolling files.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Default filter when neither RUST_LOG nor LOG_LEVEL narrows it
const DEFAULT_FILTER: &str = "reservation_server=info,tower_http=info";

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None);
}

/// Initialize the logger with optional file output
///
/// `RUST_LOG` wins when set. Otherwise `log_level` applies to this crate and
/// tower-http. With `log_dir` pointing at an existing directory, output goes
/// to a daily rolling `reservation-server.YYYY-MM-DD` file instead of stdout.
pub fn init_logger_with_file(log_level: Option<&str>, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match log_level {
        Some(level) => EnvFilter::new(format!(
            "reservation_server={level},tower_http={level}"
        )),
        None => EnvFilter::new(DEFAULT_FILTER),
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.is_dir() {
            let file_appender = tracing_appender::rolling::daily(log_path, "reservation-server");
            subscriber.with_ansi(false).with_writer(file_appender).init();
            return;
        }
        eprintln!("LOG_DIR {dir} does not exist, logging to stdout");
    }

    subscriber.init();
}
