// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-mode entry point: after fork the child discards the Supervisor's
//! event loop entirely. `main.rs` dispatches here when re-exec'd with
//! `--worker`; this never runs inside the Supervisor process.
//!
//! Protocol with the parent (see `devmand_adapters::spawn`'s module docs):
//! one length-prefixed JSON [`Device`] read off stdin per event, one line
//! written to stdout on completion - the worker never reports lock
//! contention back over this channel. A busy lock is instead resolved
//! entirely within the worker: it blocks on its own private inotify watch
//! for `IN_CLOSE_WRITE`, then echoes `change` into the device's sysfs
//! `uevent` trigger file so the kernel re-emits a fresh uevent through the
//! normal netlink path - the same retrigger mechanism `udevadm trigger`
//! uses, which sidesteps having to mint a synthetic seqnum the event
//! queue's single monotonic counter would have to reconcile against real
//! kernel seqnums.

use devmand_adapters::flock::FsFlock;
use devmand_adapters::inotify_source::BlockingInotifySource;
use devmand_adapters::partition::{self, SysfsPartitionProbe};
use devmand_adapters::publish::NetlinkEventSink;
use devmand_adapters::rules::BuiltinRuleEngine;
use devmand_core::{Action, Device};
use devmand_scheduler::inotify_watcher::InotifyWatcher;
use devmand_scheduler::locker::DeviceLocker;
use devmand_scheduler::ports::WatchId;
use devmand_scheduler::worker_loop::{process_device, ProcessOutcome};
use std::collections::HashSet;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread;
use tracing::warn;

use crate::env;

type Watcher = InotifyWatcher<BlockingInotifySource, SysfsPartitionProbe>;

/// Drives the worker's device loop until stdin closes (the Supervisor
/// dropped the pipe - normal exit on a soft-kill or a forced signal).
pub fn run() {
    let rules = BuiltinRuleEngine::new(env::rules_dir());
    let inotify = Arc::new(match BlockingInotifySource::new() {
        Ok(inotify) => Watcher::new(inotify, SysfsPartitionProbe::new()),
        Err(e) => {
            eprintln!("worker: failed to initialize inotify: {e}");
            std::process::exit(1);
        }
    });
    let locker = DeviceLocker::new(FsFlock::new(), Arc::clone(&inotify));
    let sink = match NetlinkEventSink::bind() {
        Ok(sink) => sink,
        Err(e) => {
            eprintln!("worker: failed to bind publish socket: {e}");
            std::process::exit(1);
        }
    };

    let read_only = env::blockdev_read_only();
    let mut marked_read_only: HashSet<String> = HashSet::new();
    let mut stdin = io::stdin();

    loop {
        let device = match read_device(&mut stdin) {
            Ok(Some(device)) => device,
            Ok(None) => break,
            Err(e) => {
                eprintln!("worker: malformed device frame: {e}");
                break;
            }
        };

        if read_only && device.action == Action::Add && device.is_block() {
            enforce_read_only(&device, &mut marked_read_only);
        }

        let outcome = process_device(&locker, &rules, &sink, device, resolve_node);

        match outcome {
            ProcessOutcome::Applied => {}
            ProcessOutcome::Fatal(msg) => {
                eprintln!("worker: rule application failed: {msg}");
            }
            ProcessOutcome::Busy { watch: Some(watch) } => {
                spawn_retrigger_wait(Arc::clone(&inotify), watch);
            }
            ProcessOutcome::Busy { watch: None } => {}
        }

        report_completion();
    }
}

/// Dereferences a block device's node to its whole-disk node before
/// locking - partitions are dereferenced to their parent; non-block devices
/// never reach this (`DeviceLocker::applies_to` gates it).
fn resolve_node(device: &Device) -> Option<String> {
    device.devname.as_deref().and_then(partition::whole_disk_node)
}

fn enforce_read_only(device: &Device, marked: &mut HashSet<String>) {
    let Some(node) = resolve_node(device) else { return };
    if !marked.insert(node.clone()) {
        return;
    }
    if let Err(e) = partition::set_read_only(&node, true) {
        warn!(node = %node, error = %e, "failed to set block device read-only");
    }
}

/// Blocks (on a dedicated thread, so the worker's main loop keeps servicing
/// further devices) on the watch `DeviceLocker::acquire` installed. Once
/// `IN_CLOSE_WRITE` fires, asks the watcher which nodes need a synthesized
/// `change`: a bare node for a plain lock-release retrigger, or the whole
/// disk plus its partitions when a partition-table reread on a watched
/// whole disk failed.
fn spawn_retrigger_wait(watcher: Arc<Watcher>, watch: WatchId) {
    thread::spawn(move || match watcher.source().wait_close_write(watch) {
        Ok(true) => {
            for node in watcher.on_close_write(watch) {
                if let Err(e) = partition::trigger_change(&node) {
                    warn!(node = %node, error = %e, "failed to retrigger device after lock release");
                }
            }
        }
        Ok(false) => watcher.on_ignored(watch),
        Err(e) => warn!(error = %e, "inotify wait failed while waiting to retrigger a locked device"),
    });
}

fn report_completion() {
    let mut out = io::stdout();
    let _ = writeln!(out, "OK");
    let _ = out.flush();
}

/// Reads one length-prefixed JSON device record, or `Ok(None)` on a clean
/// EOF between frames (the Supervisor closed its end of the pipe).
fn read_device(stdin: &mut io::Stdin) -> io::Result<Option<Device>> {
    let mut len_buf = [0u8; 4];
    match stdin.read_exact(&mut len_buf) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    stdin.read_exact(&mut payload)?;
    let device = serde_json::from_slice(&payload)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(Some(device))
}
