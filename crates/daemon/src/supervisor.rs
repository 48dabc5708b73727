// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Supervisor main loop: owns every timer and signal and drives every
//! other component's transitions from a single `tokio::select!`. `Manager`
//! itself stays synchronous and IO-free; this module is where the real
//! sockets, the re-exec'd worker notifications, and the OS signals get
//! turned into `Manager` calls.
//!
//! The worker-owned inotify substitution (see `worker_main`'s module docs)
//! means this loop never itself waits on an inotify fd: each worker resolves
//! its own lock-retry/retrigger wait privately, so the sources left here are
//! netlink, control, worker notifications, signals, and timers.

use devmand_adapters::netlink::NetlinkEventSource;
use devmand_adapters::publish::NetlinkEventSink;
use devmand_adapters::rules::BuiltinRuleEngine;
use devmand_adapters::spawn::{ChildProcessSpawner, WorkerNotification};
use devmand_core::Device;
use devmand_scheduler::ports::EventSource;
use devmand_scheduler::{EventQueue, Manager, ManagerEvent, TimerEvent, WorkerPool};
use devmand_wire::{Request, Response};
use std::time::{Duration, Instant};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::control::{ControlMessage, ControlServer};
use crate::lifecycle::{self, Config};
use crate::logging::{self, LogReloadHandle};
use crate::queue_marker::FsQueueMarker;
use crate::env;

/// Rule-directory freshness is polled at most this often: before each
/// dispatch pass, if more than this long has elapsed since the last check.
const RULE_CHECK_PERIOD: Duration = Duration::from_secs(3);

type Supervisor = Manager<ChildProcessSpawner, FsQueueMarker, NetlinkEventSink>;

/// Runs the daemon to completion, returning the process exit code.
pub async fn run() -> i32 {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("devmand: {e}");
            return 1;
        }
    };

    let (log_handle, _guard) = logging::init(&config.log_path, &env::log_level());

    let startup = match lifecycle::startup(&config).await {
        Ok(startup) => startup,
        Err(e) => {
            error!(error = %e, "startup failed");
            return 1;
        }
    };

    let exit_code = run_with(config.clone(), startup.listener, log_handle).await;
    lifecycle::shutdown(&config);
    drop(startup.lock_file);
    exit_code
}

async fn run_with(config: Config, listener: tokio::net::UnixListener, log_handle: LogReloadHandle) -> i32 {
    let sink = match NetlinkEventSink::bind() {
        Ok(sink) => sink,
        Err(e) => {
            error!(error = %e, "failed to bind publish socket");
            return 1;
        }
    };

    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<WorkerNotification>();
    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => {
            error!(error = %e, "failed to resolve current executable path");
            return 1;
        }
    };
    let spawner = ChildProcessSpawner::new(exe, env::timeout_signal_value(), notify_tx);

    let queue = EventQueue::new(FsQueueMarker::new(config.marker_path.clone()));
    let pool = WorkerPool::new(
        spawner,
        env::children_max(),
        env::event_timeout(),
        env::warning_fraction(),
        env::timeout_signal(),
    );
    let mut manager: Supervisor = Manager::new(queue, pool, sink, devmand_scheduler::ports::NoopDb);

    let (uevent_tx, mut uevent_rx) = mpsc::unbounded_channel::<Device>();
    spawn_netlink_thread(uevent_tx);

    let (control_tx, mut control_rx) = mpsc::channel::<ControlMessage>(32);
    tokio::spawn(ControlServer::new(listener, control_tx).run());

    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGINT handler");
            return 1;
        }
    };
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler");
            return 1;
        }
    };
    let mut sighup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to install SIGHUP handler");
            return 1;
        }
    };

    let rule_freshness = BuiltinRuleEngine::new(env::rules_dir());
    let mut last_rule_check = Instant::now();
    let started_at = Instant::now();

    loop {
        let deadline = manager.next_deadline().unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
        let sleep = tokio::time::sleep_until(tokio::time::Instant::from_std(deadline));
        tokio::pin!(sleep);

        tokio::select! {
            biased;

            device = uevent_rx.recv() => {
                match device {
                    Some(device) => {
                        if let Err(e) = manager.enqueue(device) {
                            warn!(error = %e, "failed to enqueue uevent");
                        }
                    }
                    None => {
                        error!("netlink source thread died; exiting");
                        manager.begin_exit();
                    }
                }
            }
            msg = control_rx.recv() => {
                // Idle priority: a control request only acks once every
                // uevent that raced it onto the channel is already queued.
                while let Ok(device) = uevent_rx.try_recv() {
                    if let Err(e) = manager.enqueue(device) {
                        warn!(error = %e, "failed to enqueue uevent");
                    }
                }
                if let Some(ControlMessage { request, respond_to }) = msg {
                    let response = handle_request(&mut manager, &log_handle, started_at, request);
                    let _ = respond_to.send(response);
                }
            }
            note = notify_rx.recv() => {
                match note {
                    Some(WorkerNotification::Completed { pid }) => {
                        manager.complete(pid);
                    }
                    Some(WorkerNotification::Exited { pid }) => {
                        if let Some(event) = manager.reap(pid) {
                            log_manager_event(event);
                        }
                    }
                    None => {}
                }
            }
            _ = &mut sleep => {
                for event in manager.check_timers(Instant::now()) {
                    log_manager_event(event);
                }
            }
            _ = sigint.recv() => {
                info!("SIGINT received, draining");
                manager.begin_exit();
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, draining");
                manager.begin_exit();
            }
            _ = sighup.recv() => {
                info!("SIGHUP received, reloading");
                manager.kill_workers(false);
                last_rule_check = Instant::now();
            }
        }

        if last_rule_check.elapsed() >= RULE_CHECK_PERIOD {
            if !rule_freshness.validate() {
                debug!("rule directory changed, soft-killing workers for reload");
                manager.kill_workers(false);
            }
            last_rule_check = Instant::now();
        }

        manager.pool_mut().drop_killed();
        for event in manager.dispatch(Instant::now()) {
            log_manager_event(event);
        }
        manager.update_idle_sweep(Instant::now());

        if manager.is_exiting() && manager.pool().is_empty() {
            break;
        }
    }

    0
}

/// Reads kernel uevents off the blocking netlink socket on a dedicated OS
/// thread and forwards each to the async loop.
fn spawn_netlink_thread(tx: mpsc::UnboundedSender<Device>) {
    std::thread::spawn(move || {
        let source = match NetlinkEventSource::bind() {
            Ok(source) => source,
            Err(e) => {
                error!(error = %e, "failed to bind netlink event source");
                return;
            }
        };
        loop {
            match source.recv() {
                Ok(device) => {
                    if tx.send(device).is_err() {
                        return;
                    }
                }
                Err(e) => warn!(error = %e, "malformed or unreadable uevent, dropped"),
            }
        }
    });
}

fn handle_request(
    manager: &mut Supervisor,
    log_handle: &LogReloadHandle,
    started_at: Instant,
    request: Request,
) -> Response {
    debug!(request = ?request, "handling control request");
    match request {
        Request::Hello => Response::Hello { version: env::PROTOCOL_VERSION.to_string() },
        Request::Ping => Response::Pong,
        Request::SetLogLevel { level } => match logging::set_level(log_handle, level) {
            Ok(()) => {
                manager.kill_workers(false);
                Response::Ack
            }
            Err(e) => Response::Error { message: format!("failed to set log level: {e}") },
        },
        Request::StopExecQueue => {
            manager.stop_exec_queue();
            Response::Ack
        }
        Request::StartExecQueue => {
            manager.start_exec_queue();
            Response::Ack
        }
        Request::Reload => {
            manager.kill_workers(false);
            Response::Ack
        }
        Request::SetEnv { entry } => {
            if manager.set_env(&entry) {
                manager.kill_workers(false);
                Response::Ack
            } else {
                Response::Error { message: format!("malformed SET_ENV entry: {entry:?}") }
            }
        }
        Request::SetChildrenMax { value } => match u32::try_from(value) {
            Ok(max) => {
                manager.set_children_max(max);
                Response::Ack
            }
            Err(_) => Response::Error { message: format!("invalid children_max: {value}") },
        },
        Request::Exit => {
            manager.begin_exit();
            Response::Ack
        }
        Request::Status => Response::Status {
            workers: manager.pool().len(),
            children_max: manager.pool().children_max(),
            queued_events: manager.queue().len(),
            stop_exec_queue: manager.is_stopped(),
            uptime_secs: started_at.elapsed().as_secs(),
        },
        Request::Unknown => {
            warn!("unknown control request type, ignored");
            Response::Error { message: "unknown request type".to_string() }
        }
    }
}

fn log_manager_event(event: ManagerEvent) {
    match event {
        ManagerEvent::Dispatched { worker, seqnum } => {
            info!(?worker, ?seqnum, "dispatched event to worker")
        }
        ManagerEvent::DispatchDeferred { seqnum } => debug!(?seqnum, "dispatch deferred, no capacity"),
        ManagerEvent::PoolSaturated => warn!("worker pool saturated at children_max"),
        ManagerEvent::WorkerSendFailed { worker } => {
            warn!(?worker, "failed to send device to worker, killed and retrying")
        }
        ManagerEvent::Timer(TimerEvent::Warning { worker, seqnum }) => {
            warn!(?worker, ?seqnum, "worker event warning timer fired")
        }
        ManagerEvent::Timer(TimerEvent::Killed { worker, seqnum }) => {
            warn!(?worker, ?seqnum, "worker event kill timer fired, signaled")
        }
        ManagerEvent::IdleSweepFired => info!("idle worker sweep fired"),
        ManagerEvent::ReapedWithForward { worker, seqnum } => {
            warn!(?worker, ?seqnum, "worker exited mid-event, forwarded frozen kernel record")
        }
        ManagerEvent::Reaped { worker } => info!(?worker, "worker reaped"),
    }
}
