// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand implementations, one function per `devmandctl` verb.

use std::io::BufRead;

use crate::client::DaemonClient;
use crate::env;
use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};

async fn connect() -> Result<DaemonClient, ExitError> {
    DaemonClient::connect().await.map_err(|e| {
        if e.is_not_running() {
            ExitError::new(1, "daemon not running")
        } else {
            ExitError::new(2, format!("failed to connect to daemon: {e}"))
        }
    })
}

fn wire_err(e: impl std::fmt::Display) -> ExitError {
    ExitError::new(2, e.to_string())
}

pub async fn hello(format: OutputFormat) -> Result<(), ExitError> {
    let mut client = connect().await?;
    let version = client.hello().await.map_err(wire_err)?;
    format_or_json(format, serde_json::json!({ "version": version }), || println!("{version}")).map_err(wire_err)
}

pub async fn ping(format: OutputFormat) -> Result<(), ExitError> {
    let mut client = connect().await?;
    client.ping().await.map_err(wire_err)?;
    format_or_json(format, serde_json::json!({ "pong": true }), || println!("pong")).map_err(wire_err)
}

pub async fn status(format: OutputFormat) -> Result<(), ExitError> {
    let mut client = connect().await?;
    let s = client.status().await.map_err(wire_err)?;
    let obj = serde_json::json!({
        "workers": s.workers,
        "children_max": s.children_max,
        "queued_events": s.queued_events,
        "stop_exec_queue": s.stop_exec_queue,
        "uptime_secs": s.uptime_secs,
    });
    format_or_json(format, obj, || {
        println!("Workers: {}/{}", s.workers, s.children_max);
        println!("Queued events: {}", s.queued_events);
        println!("Exec queue: {}", if s.stop_exec_queue { "stopped" } else { "running" });
        println!("Uptime: {}s", s.uptime_secs);
    })
    .map_err(wire_err)
}

pub async fn reload() -> Result<(), ExitError> {
    let mut client = connect().await?;
    client.reload().await.map_err(wire_err)?;
    println!("Reload requested");
    Ok(())
}

pub async fn set_log_level(level: i32) -> Result<(), ExitError> {
    let mut client = connect().await?;
    client.set_log_level(level).await.map_err(wire_err)?;
    println!("Log level set to {level}");
    Ok(())
}

pub async fn set_env(entry: String) -> Result<(), ExitError> {
    let mut client = connect().await?;
    client.set_env(entry.clone()).await.map_err(wire_err)?;
    println!("{entry}");
    Ok(())
}

pub async fn set_children_max(value: i32) -> Result<(), ExitError> {
    let mut client = connect().await?;
    client.set_children_max(value).await.map_err(wire_err)?;
    println!("children_max set to {value}");
    Ok(())
}

pub async fn start_exec_queue() -> Result<(), ExitError> {
    let mut client = connect().await?;
    client.start_exec_queue().await.map_err(wire_err)?;
    println!("Exec queue started");
    Ok(())
}

pub async fn stop_exec_queue() -> Result<(), ExitError> {
    let mut client = connect().await?;
    client.stop_exec_queue().await.map_err(wire_err)?;
    println!("Exec queue stopped");
    Ok(())
}

pub async fn exit_daemon() -> Result<(), ExitError> {
    let mut client = connect().await?;
    client.exit().await.map_err(wire_err)?;
    println!("Exit requested");
    Ok(())
}

pub async fn logs(limit: usize, no_limit: bool, follow: bool, format: OutputFormat) -> Result<(), ExitError> {
    let state_dir = env::state_dir().ok_or_else(|| ExitError::new(2, "could not determine state directory"))?;
    let log_path = state_dir.join("daemon.log");

    if !log_path.exists() {
        return format_or_json(
            format,
            serde_json::json!({ "log_path": log_path.to_string_lossy(), "lines": Vec::<String>::new() }),
            || println!("No log file found at {}", log_path.display()),
        )
        .map_err(wire_err);
    }

    let content = if no_limit {
        std::fs::read_to_string(&log_path).map_err(wire_err)?
    } else {
        read_last_lines(&log_path, limit).map_err(wire_err)?
    };

    match format {
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "log_path": log_path.to_string_lossy(),
                "lines": content.lines().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&obj).map_err(wire_err)?);
        }
        OutputFormat::Text => {
            if content.is_empty() {
                eprintln!("No log entries found");
            } else {
                print!("{content}");
                if !content.ends_with('\n') {
                    println!();
                }
            }
        }
    }

    if follow {
        tail_follow(&log_path).await.map_err(wire_err)?;
    }

    Ok(())
}

fn read_last_lines(path: &std::path::Path, n: usize) -> std::io::Result<String> {
    let file = std::fs::File::open(path)?;
    let lines: Vec<String> = std::io::BufReader::new(file).lines().collect::<std::io::Result<_>>()?;
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].join("\n"))
}

/// Poll-based tail: re-reads new bytes from the last offset on a short
/// interval until Ctrl-C. A `notify`-backed filesystem watcher would work
/// too, but this CLI has nothing else that needs one, so pulling in that
/// dependency for one command isn't worth it.
async fn tail_follow(path: &std::path::Path) -> std::io::Result<()> {
    use std::io::{Read, Seek, SeekFrom};

    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::End(0))?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = tokio::time::sleep(std::time::Duration::from_millis(500)) => {
                let mut buf = String::new();
                file.read_to_string(&mut buf)?;
                if !buf.is_empty() {
                    print!("{buf}");
                }
            }
            _ = &mut ctrl_c => return Ok(()),
        }
    }
}
