// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured logging setup: `tracing` + `tracing-subscriber` (`env-filter`,
//! `fmt`) + `tracing-appender` for the rotating daemon log file.
//! `SET_LOG_LEVEL` mutates the returned `reload::Handle` rather than
//! restarting the process.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter};

pub type LogReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

/// Initializes the global subscriber, writing to `log_path` (daily-rotated)
/// and returning a handle for runtime level changes plus the appender's
/// flush guard, which must be held for the daemon's lifetime.
pub fn init(log_path: &Path, initial_level: &str) -> (LogReloadHandle, WorkerGuard) {
    let directory = log_path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = log_path.file_name().map(|n| n.to_owned()).unwrap_or_else(|| "daemon.log".into());
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_new(initial_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    (handle, guard)
}

/// `SET_LOG_LEVEL(int)`: maps the control protocol's integer level onto a
/// `tracing` filter directive (0=error .. 4=trace).
pub fn level_from_int(level: i32) -> LevelFilter {
    match level {
        i32::MIN..=0 => LevelFilter::ERROR,
        1 => LevelFilter::WARN,
        2 => LevelFilter::INFO,
        3 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn set_level(handle: &LogReloadHandle, level: i32) -> Result<(), reload::Error> {
    let filter = level_from_int(level);
    handle.modify(|f| *f = EnvFilter::new(filter.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_control_protocol_levels_to_tracing_filters() {
        assert_eq!(level_from_int(0), LevelFilter::ERROR);
        assert_eq!(level_from_int(2), LevelFilter::INFO);
        assert_eq!(level_from_int(99), LevelFilter::TRACE);
    }
}
