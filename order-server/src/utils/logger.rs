//! Logging Infrastructure
//!
//! Console output by default; a daily rolling file under the log dir when
//! it exists. `RUST_LOG` overrides the configured level.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional JSON lines and file output
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_dir = log_dir
        .map(Path::new)
        .filter(|path| path.exists())
        .and_then(Path::to_str);

    // try_init: tests may initialize more than once
    let result = match (file_dir, json.unwrap_or(false)) {
        (Some(dir), true) => {
            let appender = tracing_appender::rolling::daily(dir, "order-server");
            builder.json().with_writer(appender).try_init()
        }
        (Some(dir), false) => {
            let appender = tracing_appender::rolling::daily(dir, "order-server");
            builder.with_ansi(false).with_writer(appender).try_init()
        }
        (None, true) => builder.json().try_init(),
        (None, false) => builder.try_init(),
    };

    if let Err(e) = result {
        eprintln!("Logger already initialized: {e}");
    }
}
