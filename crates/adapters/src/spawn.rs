// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker process lifecycle: spawn, device handoff, signal delivery.
//!
//! `unsafe_code = "forbid"` rules out calling `fork(2)` directly, so this
//! re-execs the daemon binary itself in worker mode, adapted to
//! `std::process::Command` plus a dedicated OS thread instead of
//! `tokio::process::Command` plus a `tokio::spawn` reaper:
//! `devmand-scheduler`'s `ProcessSpawner`/`WorkerChannel` ports are
//! synchronous by design (`Manager` stays pure and IO-free), so the
//! spawn/reap/read calls here can't themselves be `.await`ed - they run on
//! blocking threads and forward results into the async Supervisor loop
//! over an unbounded channel instead.
//!
//! The worker's private IPC channel is substituted too: rather than a
//! `SOCK_SEQPACKET` pair (which needs raw fd construction - `unsafe` - to
//! hand the receiving half to the child), each worker gets its own piped
//! stdin (device handoff, length-prefixed JSON written by the Supervisor)
//! and stdout (completion signal, one line per completion). One pipe per
//! worker in place of one shared socket with peer-credential lookup.

use devmand_core::Device;
use devmand_scheduler::ports::{KillSignal, ProcessSpawner, SpawnedWorker, WorkerChannel};
use devmand_scheduler::worker::Pid;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;
use parking_lot::Mutex;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use tokio::sync::mpsc;

/// Something a worker's background threads observed, forwarded to the
/// Supervisor loop for `Manager::complete`/`Manager::reap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerNotification {
    /// A completion line arrived on the worker's stdout.
    Completed { pid: Pid },
    /// The worker process exited (reaped via `wait(2)`).
    Exited { pid: Pid },
}

/// Spawns worker processes by re-executing the current binary with
/// `--worker` (the daemon's `main.rs` dispatches on that flag).
pub struct ChildProcessSpawner {
    exe: PathBuf,
    timeout_signal: Signal,
    notify_tx: mpsc::UnboundedSender<WorkerNotification>,
}

impl ChildProcessSpawner {
    pub fn new(
        exe: PathBuf,
        timeout_signal: Signal,
        notify_tx: mpsc::UnboundedSender<WorkerNotification>,
    ) -> Self {
        Self { exe, timeout_signal, notify_tx }
    }
}

impl ProcessSpawner for ChildProcessSpawner {
    fn spawn(&self) -> Result<SpawnedWorker, io::Error> {
        let mut child = Command::new(&self.exe)
            .arg("--worker")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let pid = Pid(child.id());
        let stdin = child.stdin.take().ok_or_else(|| io::Error::other("child stdin not piped"))?;
        let stdout = child.stdout.take().ok_or_else(|| io::Error::other("child stdout not piped"))?;

        let completion_tx = self.notify_tx.clone();
        thread::spawn(move || {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line) {
                    Ok(0) => break,
                    Ok(_) => {
                        if completion_tx.send(WorkerNotification::Completed { pid }).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        let exit_tx = self.notify_tx.clone();
        thread::spawn(move || {
            let _ = child.wait();
            let _ = exit_tx.send(WorkerNotification::Exited { pid });
        });

        let channel = PipeChannel { stdin: Mutex::new(stdin), pid, timeout_signal: self.timeout_signal };
        Ok(SpawnedWorker { pid, channel: Box::new(channel) })
    }
}

struct PipeChannel {
    stdin: Mutex<std::process::ChildStdin>,
    pid: Pid,
    timeout_signal: Signal,
}

impl WorkerChannel for PipeChannel {
    fn send_device(&self, device: &Device) -> Result<(), io::Error> {
        let payload = serde_json::to_vec(device)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let len = u32::try_from(payload.len())
            .map_err(|_| io::Error::other("device record too large to frame"))?;
        let mut stdin = self.stdin.lock();
        stdin.write_all(&len.to_be_bytes())?;
        stdin.write_all(&payload)?;
        stdin.flush()
    }

    fn signal(&self, sig: KillSignal) -> Result<(), io::Error> {
        let signal = match sig {
            KillSignal::Term => Signal::SIGTERM,
            KillSignal::Timeout => self.timeout_signal,
        };
        signal::kill(NixPid::from_raw(self.pid.0 as i32), signal)
            .map_err(|e| io::Error::from_raw_os_error(e as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_notification_carries_the_right_pid() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(WorkerNotification::Completed { pid: Pid(42) }).unwrap();
        assert_eq!(rx.try_recv().unwrap(), WorkerNotification::Completed { pid: Pid(42) });
    }
}
