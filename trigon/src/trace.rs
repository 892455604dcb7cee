//! Log output for the `trigon` binary.

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "trigon.log";

/// Flushes buffered log lines to `logs/trigon.log` when dropped. Hold it for the life of `main`.
#[allow(missing_copy_implementations)]
#[derive(Debug)]
#[must_use]
pub(crate) struct LogGuard {
    _file: WorkerGuard,
}

/// Send engine and binary events to a daily log file, and to stderr in debug builds.
///
/// `RUST_LOG` selects what is recorded; without it only `info` and above are kept.
pub(crate) fn initialize() -> LogGuard {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let (file_writer, file_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(LOG_DIR, LOG_FILE));
    let file_layer = fmt::Layer::new()
        .compact()
        .with_ansi(false)
        .with_line_number(true)
        .with_writer(file_writer);

    let subscriber = tracing_subscriber::registry().with(filter).with(file_layer);

    #[cfg(debug_assertions)]
    let subscriber = subscriber.with(
        fmt::Layer::new()
            .compact()
            .without_time()
            .with_target(false)
            .with_writer(std::io::stderr),
    );

    if let Err(err) = subscriber.try_init() {
        eprintln!("logging already initialized: {err}");
    }
    LogGuard { _file: file_guard }
}
