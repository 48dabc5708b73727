// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties the event queue and worker pool together into the Supervisor's
//! pure decision core: control operations and the post-iteration hook.
//!
//! Every method here is synchronous: the only blocking calls in the real
//! system (`flock`, `recvmsg`) happen inside the worker process or at the
//! `EventSource`/`EventSink` boundary, never in `Manager` itself.
//! `devmand-daemon`'s async Supervisor loop calls these methods from inside
//! a `tokio::select!` and does the actual I/O.

use crate::ports::{DeviceDb, EventSink, KillSignal, ProcessSpawner};
use crate::pool::{SpawnRefusal, TimerEvent, WorkerPool};
use crate::queue::{CleanupMatch, EventQueue, QueueError};
use crate::worker::Pid;
use devmand_core::{Device, Seqnum, WorkerId};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// One-shot period for the idle-worker reaper sweep.
pub const IDLE_SWEEP_PERIOD: Duration = Duration::from_secs(3);

/// Something worth logging that fell out of a `Manager` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    Dispatched { worker: WorkerId, seqnum: Seqnum },
    /// No idle worker and the pool is at capacity; dispatch deferred.
    DispatchDeferred { seqnum: Seqnum },
    /// `children_max` was reached for the first time since it last had
    /// spare capacity.
    PoolSaturated,
    /// Sending the device to a worker failed; it was force-killed and a
    /// different candidate (or a fresh spawn) was tried.
    WorkerSendFailed { worker: WorkerId },
    Timer(TimerEvent),
    IdleSweepFired,
    /// A worker exited while still attached to `seqnum`; its frozen
    /// kernel-side record was forwarded downstream.
    ReapedWithForward { worker: WorkerId, seqnum: Seqnum },
    Reaped { worker: WorkerId },
}

pub struct Manager<S: ProcessSpawner, M: crate::ports::QueueMarker, K: EventSink, D: DeviceDb = crate::ports::NoopDb> {
    queue: EventQueue<M>,
    pool: WorkerPool<S>,
    sink: K,
    db: D,
    properties: BTreeMap<String, String>,
    stop_exec_queue: bool,
    exit: bool,
    idle_sweep_deadline: Option<Instant>,
}

impl<S: ProcessSpawner, M: crate::ports::QueueMarker, K: EventSink, D: DeviceDb> Manager<S, M, K, D> {
    pub fn new(queue: EventQueue<M>, pool: WorkerPool<S>, sink: K, db: D) -> Self {
        Self {
            queue,
            pool,
            sink,
            db,
            properties: BTreeMap::new(),
            stop_exec_queue: false,
            exit: false,
            idle_sweep_deadline: None,
        }
    }

    pub fn queue(&self) -> &EventQueue<M> {
        &self.queue
    }

    pub fn pool(&self) -> &WorkerPool<S> {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut WorkerPool<S> {
        &mut self.pool
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// `SET_ENV("k=v" | "k=")`: insert or remove a property override.
    /// Malformed entries (no `=`) are rejected. Returns whether
    /// the entry was accepted; callers soft-kill workers on success so the
    /// next respawn picks up the new override set.
    pub fn set_env(&mut self, entry: &str) -> bool {
        let Some((key, value)) = entry.split_once('=') else {
            return false;
        };
        if value.is_empty() {
            self.properties.remove(key);
        } else {
            self.properties.insert(key.to_string(), value.to_string());
        }
        true
    }

    pub fn is_exiting(&self) -> bool {
        self.exit
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_exec_queue
    }

    /// `STOP_EXEC_QUEUE`/`START_EXEC_QUEUE`.
    pub fn stop_exec_queue(&mut self) {
        self.stop_exec_queue = true;
    }

    pub fn start_exec_queue(&mut self) {
        self.stop_exec_queue = false;
    }

    /// `EXIT`: stop accepting new dispatches, drop every still-`Queued`
    /// (never-dispatched) event, and force-kill every worker. The
    /// Supervisor loop terminates once the queue and pool both drain.
    pub fn begin_exit(&mut self) {
        self.exit = true;
        self.stop_exec_queue = true;
        self.queue.cleanup(CleanupMatch::State(crate::event::EventState::Queued));
        self.pool.kill_workers(true);
    }

    pub fn set_children_max(&mut self, max: u32) {
        self.pool.set_children_max(max);
    }

    /// Enqueues `device` plus the marker side effect.
    pub fn enqueue(&mut self, device: Device) -> Result<Seqnum, QueueError> {
        let seqnum = self.queue.enqueue(device)?;
        self.idle_sweep_deadline = None;
        Ok(seqnum)
    }

    /// Drive as many runnable events onto idle/fresh workers as capacity
    /// allows. No-ops while `stop_exec_queue` is set or the Supervisor is
    /// exiting.
    pub fn dispatch(&mut self, now: Instant) -> Vec<ManagerEvent> {
        let mut events = Vec::new();
        if self.stop_exec_queue || self.exit {
            return events;
        }
        while let Some(seqnum) = self.queue.next_runnable() {
            if !self.dispatch_one(seqnum, now, &mut events) {
                break;
            }
        }
        events
    }

    /// Attempt to hand `seqnum` to a worker, trying every idle worker
    /// before falling back to spawning; a send failure kills the offending
    /// worker and tries the next one. Returns whether the overall
    /// `dispatch` loop should keep going.
    fn dispatch_one(&mut self, seqnum: Seqnum, now: Instant, events: &mut Vec<ManagerEvent>) -> bool {
        loop {
            let worker = match self.pool.idle_worker() {
                Some(id) => id,
                None => match self.pool.spawn() {
                    Ok(Ok(id)) => id,
                    Ok(Err(SpawnRefusal::AtCapacity { first })) => {
                        events.push(if first {
                            ManagerEvent::PoolSaturated
                        } else {
                            ManagerEvent::DispatchDeferred { seqnum }
                        });
                        return false;
                    }
                    Err(_) => {
                        events.push(ManagerEvent::DispatchDeferred { seqnum });
                        return false;
                    }
                },
            };
            let mut device = match self.queue.get(seqnum) {
                Some(e) => e.device.clone(),
                None => return true,
            };
            for (key, value) in &self.properties {
                device.properties.insert(key.clone(), value.clone());
            }
            let sent = self.pool.channel(worker).map(|ch| ch.send_device(&device));
            match sent {
                Some(Ok(())) => {
                    self.pool.attach(worker, seqnum, now);
                    if let Some(e) = self.queue.get_mut(seqnum) {
                        e.attach(worker);
                    }
                    events.push(ManagerEvent::Dispatched { worker, seqnum });
                    return true;
                }
                _ => {
                    self.pool.kill_worker(worker);
                    events.push(ManagerEvent::WorkerSendFailed { worker });
                }
            }
        }
    }

    /// A completion datagram arrived; `pid` is the peer credential used to
    /// identify the worker.
    pub fn complete(&mut self, pid: Pid) -> Option<Seqnum> {
        let worker = self.pool.worker_for_pid(pid)?;
        let seqnum = self.pool.complete(worker)?;
        self.queue.detach_and_free(seqnum);
        Some(seqnum)
    }

    /// `SIGCHLD` reap for `pid`. If the worker was still attached to an
    /// event, its frozen kernel-side clone is published downstream and the
    /// event is freed - the worker never got to finish it.
    pub fn reap(&mut self, pid: Pid) -> Option<ManagerEvent> {
        let (worker, seqnum) = self.pool.reap(pid)?;
        match seqnum {
            Some(seqnum) => {
                if let Some(event) = self.queue.detach_and_free(seqnum) {
                    self.db.delete(&event.device_kernel);
                    let _ = self.sink.send(&event.device_kernel);
                }
                Some(ManagerEvent::ReapedWithForward { worker, seqnum })
            }
            None => Some(ManagerEvent::Reaped { worker }),
        }
    }

    pub fn kill_workers(&mut self, force: bool) {
        self.pool.kill_workers(force);
    }

    /// Post-iteration hook: arm or disarm the idle-worker reaper depending
    /// on current queue/pool occupancy.
    pub fn update_idle_sweep(&mut self, now: Instant) {
        let should_arm = self.queue.is_empty() && !self.pool.is_empty();
        if should_arm && self.idle_sweep_deadline.is_none() {
            self.idle_sweep_deadline = Some(now + IDLE_SWEEP_PERIOD);
        } else if !should_arm {
            self.idle_sweep_deadline = None;
        }
    }

    /// The soonest of the idle sweep and every worker's warning/kill
    /// timers - what the Supervisor sizes its `select!` sleep against.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.idle_sweep_deadline, self.pool.next_deadline()].into_iter().flatten().min()
    }

    /// Drive every timer (per-worker warning/kill, idle sweep) forward to
    /// `now`, acting on whichever fired.
    pub fn check_timers(&mut self, now: Instant) -> Vec<ManagerEvent> {
        let mut events: Vec<ManagerEvent> =
            self.pool.check_timers(now).into_iter().map(ManagerEvent::Timer).collect();
        if let Some(deadline) = self.idle_sweep_deadline {
            if now >= deadline {
                self.pool.kill_workers(false);
                self.idle_sweep_deadline = None;
                events.push(ManagerEvent::IdleSweepFired);
            }
        }
        events
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
