// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate: small pure
//! accessors rather than a parsed-once struct - kernel command-line and CLI
//! flag parsing are explicitly out of scope.

use crate::lifecycle::LifecycleError;
use devmand_scheduler::ports::KillSignal;
use nix::sys::signal::Signal;
use std::path::PathBuf;
use std::time::Duration;

/// Protocol/daemon version reported in `Hello` responses.
pub const PROTOCOL_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// `DEVMAND_STATE_DIR`: home of the control socket, PID/version files,
/// queue marker, and log file. Falls back to `$XDG_STATE_HOME/devmand`,
/// then `~/.local/state/devmand`.
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("DEVMAND_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("devmand"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/devmand"))
}

/// `DEVMAND_CHILDREN_MAX` (default 8): initial `children_max`.
pub fn children_max() -> u32 {
    std::env::var("DEVMAND_CHILDREN_MAX").ok().and_then(|s| s.parse().ok()).unwrap_or(8)
}

/// `DEVMAND_EVENT_TIMEOUT_MS` (default 30000): `event_timeout`.
pub fn event_timeout() -> Duration {
    std::env::var("DEVMAND_EVENT_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// `DEVMAND_TIMEOUT_SIGNAL` (default `SIGKILL`): `timeout_signal`.
pub fn timeout_signal() -> KillSignal {
    KillSignal::Timeout
}

/// The concrete OS signal `KillSignal::Timeout` maps to, parsed from
/// `DEVMAND_TIMEOUT_SIGNAL` (a bare name like `SIGKILL`/`SIGTERM`, or a
/// signal number). Defaults to `SIGKILL`.
pub fn timeout_signal_value() -> Signal {
    match std::env::var("DEVMAND_TIMEOUT_SIGNAL") {
        Ok(raw) => parse_signal(&raw).unwrap_or(Signal::SIGKILL),
        Err(_) => Signal::SIGKILL,
    }
}

fn parse_signal(raw: &str) -> Option<Signal> {
    if let Ok(n) = raw.parse::<i32>() {
        return Signal::try_from(n).ok();
    }
    let name = raw.trim_start_matches("SIG").to_uppercase();
    match name.as_str() {
        "KILL" => Some(Signal::SIGKILL),
        "TERM" => Some(Signal::SIGTERM),
        "INT" => Some(Signal::SIGINT),
        "HUP" => Some(Signal::SIGHUP),
        "QUIT" => Some(Signal::SIGQUIT),
        "USR1" => Some(Signal::SIGUSR1),
        "USR2" => Some(Signal::SIGUSR2),
        _ => None,
    }
}

/// `DEVMAND_EXEC_DELAY_MS` (default 0): `exec_delay`.
pub fn exec_delay() -> Duration {
    std::env::var("DEVMAND_EXEC_DELAY_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_default()
}

/// `DEVMAND_BLOCKDEV_READ_ONLY` (default false): `blockdev_read_only`.
pub fn blockdev_read_only() -> bool {
    std::env::var("DEVMAND_BLOCKDEV_READ_ONLY")
        .ok()
        .map(|s| matches!(s.as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// `DEVMAND_LOG_LEVEL` (default `info`): initial `log_level`.
pub fn log_level() -> String {
    std::env::var("DEVMAND_LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

/// `DEVMAND_RULES_DIR` (default `/etc/devmand/rules.d`): rule-file
/// freshness polling root, checked every >=3s.
pub fn rules_dir() -> PathBuf {
    std::env::var("DEVMAND_RULES_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/devmand/rules.d"))
}

/// Warning-timer fraction of `event_timeout` at which the watchdog's soft
/// warning fires. Not independently configurable; fixed at the midpoint.
pub fn warning_fraction() -> f64 {
    0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signal_names_case_insensitively() {
        assert_eq!(parse_signal("SIGTERM"), Some(Signal::SIGTERM));
        assert_eq!(parse_signal("term"), Some(Signal::SIGTERM));
        assert_eq!(parse_signal("9"), Some(Signal::SIGKILL));
    }

    #[test]
    fn unknown_signal_name_is_none() {
        assert_eq!(parse_signal("NOTASIGNAL"), None);
    }
}
