// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `devmandctl` - operator CLI for `devmand`, talking to the control socket
//! defined in `devmand-wire`.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod env;
mod exit_error;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use exit_error::ExitError;
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "devmandctl",
    version = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH")),
    about = "Operator control for the devmand device-event daemon"
)]
struct Cli {
    /// Query the running daemon's protocol/version handshake instead of
    /// running a subcommand.
    #[arg(long = "daemon-version")]
    daemon_version: bool,

    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Low-priority liveness check
    Ping,
    /// Worker pool / queue depth snapshot
    Status,
    /// Soft-kill all workers so the next respawn re-reads rule files
    Reload,
    /// Mutate the running log-filter level without restarting
    SetLogLevel { level: i32 },
    /// `KEY=value` to set, or `KEY=` to remove an operator property override
    SetEnv { entry: String },
    /// Raise or lower the worker pool's capacity
    SetChildrenMax { value: i32 },
    /// Resume dispatching queued events to workers
    Start,
    /// Stop dispatching queued events to workers (events keep queuing)
    Stop,
    /// Begin a graceful drain and shut the daemon down
    Exit,
    /// Tail the daemon's log file
    Logs {
        #[arg(short = 'n', long, default_value_t = 200)]
        limit: usize,
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
        #[arg(long, short)]
        follow: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("devmandctl: failed to start async runtime: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        eprintln!("devmandctl: {e}");
        std::process::exit(e.code);
    }
}

async fn run(cli: Cli) -> Result<(), ExitError> {
    if cli.daemon_version {
        return commands::hello(cli.output).await;
    }

    match cli.command {
        Some(Command::Ping) => commands::ping(cli.output).await,
        Some(Command::Status) => commands::status(cli.output).await,
        Some(Command::Reload) => commands::reload().await,
        Some(Command::SetLogLevel { level }) => commands::set_log_level(level).await,
        Some(Command::SetEnv { entry }) => commands::set_env(entry).await,
        Some(Command::SetChildrenMax { value }) => commands::set_children_max(value).await,
        Some(Command::Start) => commands::start_exec_queue().await,
        Some(Command::Stop) => commands::stop_exec_queue().await,
        Some(Command::Exit) => commands::exit_daemon().await,
        Some(Command::Logs { limit, no_limit, follow }) => {
            commands::logs(limit, no_limit, follow, cli.output).await
        }
        None => {
            Cli::command().print_help().map_err(|e| ExitError::new(2, e.to_string()))?;
            println!();
            Ok(())
        }
    }
}
