//! CaptionKit Core Library
//!
//! Turns timed word cues and a visual style into an ASS subtitle document,
//! keeps an on-screen preview in sync with the source video, and coordinates
//! burned-in exports through an external transcoder.

pub mod core;

use std::path::Path;
use std::sync::OnceLock;

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
static LOG_INIT: OnceLock<()> = OnceLock::new();

/// Installs the global tracing subscriber.
///
/// Logs go to stdout and, when `log_dir` is given, to a daily-rolling file.
/// `RUST_LOG` overrides the default `info` level. Later calls are no-ops.
pub fn init_logging(log_dir: Option<&Path>) {
    LOG_INIT.get_or_init(|| {
        use tracing_subscriber::prelude::*;

        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

        let stdout_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(cfg!(debug_assertions));

        // Log to file when a directory is available (best effort).
        let file_layer = log_dir
            .and_then(|dir| match std::fs::create_dir_all(dir) {
                Ok(()) => Some(dir),
                Err(e) => {
                    eprintln!("Failed to create log directory {}: {}", dir.display(), e);
                    None
                }
            })
            .map(|dir| {
                let file_appender = tracing_appender::rolling::daily(dir, "captionkit.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let _ = LOG_GUARD.set(guard);

                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
            });

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(stdout_layer)
            .with(file_layer);

        // Another subscriber may already be installed (tests, embedding hosts).
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
