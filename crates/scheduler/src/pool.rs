// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bounded worker pool.
//!
//! Pure bookkeeping over `Worker` records plus their private IPC channels.
//! All of the actual syscalls (spawning, sending bytes, signaling) are
//! pushed behind [`ProcessSpawner`]/[`WorkerChannel`] so this type stays
//! synchronous and unit-testable with fakes; the only state it can't fake
//! away - wall-clock time - comes in through [`devmand_core::Clock`].

use crate::ports::{KillSignal, ProcessSpawner, WorkerChannel};
use crate::worker::{Pid, Worker};
use devmand_core::{Seqnum, WorkerId};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A per-event watchdog timer firing, surfaced to the caller for logging.
/// The pool has already acted on it by the time it's returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// The warning timer fired; the worker is still running.
    Warning { worker: WorkerId, seqnum: Seqnum },
    /// The kill timer fired; `timeout_signal` has been sent and the worker
    /// is now `Killing`.
    Killed { worker: WorkerId, seqnum: Seqnum },
}

/// Why [`WorkerPool::spawn`] could not add a new worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRefusal {
    /// `children_max` is already reached. `first` is true the first time
    /// this happens since the pool last had spare capacity, so the caller
    /// can log the saturation warning exactly once.
    AtCapacity { first: bool },
}

pub struct WorkerPool<S: ProcessSpawner> {
    spawner: S,
    workers: HashMap<WorkerId, Worker>,
    channels: HashMap<WorkerId, Box<dyn WorkerChannel>>,
    pid_index: HashMap<Pid, WorkerId>,
    children_max: u32,
    warning_fraction: f64,
    event_timeout: Duration,
    timeout_signal: KillSignal,
    /// Set once capacity is hit so the saturation warning logs only once
    /// per saturation episode.
    saturated_logged: bool,
}

impl<S: ProcessSpawner> WorkerPool<S> {
    pub fn new(
        spawner: S,
        children_max: u32,
        event_timeout: Duration,
        warning_fraction: f64,
        timeout_signal: KillSignal,
    ) -> Self {
        Self {
            spawner,
            workers: HashMap::new(),
            channels: HashMap::new(),
            pid_index: HashMap::new(),
            children_max,
            warning_fraction,
            event_timeout,
            timeout_signal,
            saturated_logged: false,
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn children_max(&self) -> u32 {
        self.children_max
    }

    /// Raise or lower the cap at runtime (`SET_CHILDREN_MAX`). Lowering
    /// below the current worker count is allowed; it only takes
    /// effect as workers complete and the pool stops backfilling.
    pub fn set_children_max(&mut self, max: u32) {
        self.children_max = max;
        if (self.workers.len() as u32) < self.children_max {
            self.saturated_logged = false;
        }
    }

    pub fn at_capacity(&self) -> bool {
        self.workers.len() as u32 >= self.children_max
    }

    pub fn get(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.get(&id)
    }

    pub fn worker_for_pid(&self, pid: Pid) -> Option<WorkerId> {
        self.pid_index.get(&pid).copied()
    }

    pub fn channel(&self, id: WorkerId) -> Option<&dyn WorkerChannel> {
        self.channels.get(&id).map(|c| c.as_ref())
    }

    /// An idle worker available to take the next event, if any.
    pub fn idle_worker(&self) -> Option<WorkerId> {
        self.workers
            .iter()
            .find(|(_, w)| w.state() == devmand_core::WorkerState::Idle)
            .map(|(id, _)| *id)
    }

    /// Spawn a fresh (idle) worker, provided the pool has room.
    pub fn spawn(&mut self) -> Result<Result<WorkerId, SpawnRefusal>, std::io::Error> {
        if self.at_capacity() {
            let first = !self.saturated_logged;
            self.saturated_logged = true;
            return Ok(Err(SpawnRefusal::AtCapacity { first }));
        }
        let spawned = self.spawner.spawn()?;
        let id = WorkerId::new();
        self.workers.insert(id, Worker::new(id, spawned.pid));
        self.channels.insert(id, spawned.channel);
        self.pid_index.insert(spawned.pid, id);
        Ok(Ok(id))
    }

    /// Hand `seqnum` to `worker`, arming its warning/kill timers.
    pub fn attach(&mut self, worker: WorkerId, seqnum: Seqnum, now: Instant) {
        if let Some(w) = self.workers.get_mut(&worker) {
            let warning_at = self.event_timeout.mul_f64(self.warning_fraction);
            w.attach(seqnum, now, warning_at, self.event_timeout);
        }
    }

    /// Completion datagram arrived for `worker`. Detaches its event and
    /// either idles it (normal) or finalizes the kill (deferred soft-kill).
    /// Returns the seqnum it was attached to, if any.
    pub fn complete(&mut self, worker: WorkerId) -> Option<Seqnum> {
        let w = self.workers.get_mut(&worker)?;
        let seqnum = w.event();
        w.detach();
        if w.state() == devmand_core::WorkerState::Killing {
            w.mark_killed();
        } else {
            w.mark_idle();
        }
        seqnum
    }

    /// The OS process exited (reaped via `waitpid`/`Child::wait`). Removes
    /// all bookkeeping for it and returns the seqnum it had been running,
    /// if any - the caller forwards the frozen kernel-side clone downstream
    /// for that seqnum.
    pub fn reap(&mut self, pid: Pid) -> Option<(WorkerId, Option<Seqnum>)> {
        let id = self.pid_index.remove(&pid)?;
        let w = self.workers.remove(&id)?;
        self.channels.remove(&id);
        Some((id, w.event()))
    }

    /// Force-kill a single worker regardless of its state: used on a send
    /// failure, to kill that worker and let the caller try the next
    /// candidate.
    pub fn kill_worker(&mut self, id: WorkerId) {
        if let Some(ch) = self.channels.get(&id) {
            let _ = ch.signal(KillSignal::Term);
        }
        if let Some(w) = self.workers.get_mut(&id) {
            w.mark_killed();
        }
    }

    /// Defer-kill (soft) or force-kill every worker, for `EXIT`/shutdown or
    /// a reload. `force = true` sends `Term` immediately regardless of
    /// state; `force = false` only marks running workers `Killing` and lets
    /// them finish their current event.
    pub fn kill_workers(&mut self, force: bool) {
        for (id, w) in self.workers.iter_mut() {
            match w.state() {
                devmand_core::WorkerState::Running if !force => w.mark_killing(),
                devmand_core::WorkerState::Running | devmand_core::WorkerState::Idle => {
                    if let Some(ch) = self.channels.get(id) {
                        let _ = ch.signal(KillSignal::Term);
                    }
                    w.mark_killed();
                }
                devmand_core::WorkerState::Killing if force => {
                    if let Some(ch) = self.channels.get(id) {
                        let _ = ch.signal(KillSignal::Term);
                    }
                    w.mark_killed();
                }
                _ => {}
            }
        }
    }

    /// Drive the per-worker warning/kill timers forward to `now`. Sends
    /// `timeout_signal` and marks the worker `Killing` on a kill firing.
    pub fn check_timers(&mut self, now: Instant) -> Vec<TimerEvent> {
        let mut fired = Vec::new();
        for (id, w) in self.workers.iter_mut() {
            if let Some(seqnum) = w.event() {
                if w.warning_deadline().is_some_and(|d| now >= d) {
                    w.mark_warned();
                    fired.push(TimerEvent::Warning { worker: *id, seqnum });
                }
                if w.kill_deadline().is_some_and(|d| now >= d) {
                    if let Some(ch) = self.channels.get(id) {
                        let _ = ch.signal(self.timeout_signal);
                    }
                    w.mark_killing();
                    w.mark_kill_timer_fired();
                    fired.push(TimerEvent::Killed { worker: *id, seqnum });
                }
            }
        }
        fired
    }

    /// The soonest deadline across every running worker's timers, used by
    /// the Supervisor to size its next `select!` sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.workers
            .values()
            .filter_map(|w| {
                [w.warning_deadline(), w.kill_deadline()].into_iter().flatten().min()
            })
            .min()
    }

    /// Remove every `Killed` worker whose channel has gone quiet - called
    /// after `reap` has already cleared the pid index for exited children,
    /// so this only trims workers the reaper hasn't caught up with yet.
    pub fn drop_killed(&mut self) {
        let dead: Vec<WorkerId> = self
            .workers
            .iter()
            .filter(|(_, w)| w.state() == devmand_core::WorkerState::Killed)
            .map(|(id, _)| *id)
            .collect();
        for id in dead {
            self.workers.remove(&id);
            self.channels.remove(&id);
            self.pid_index.retain(|_, v| *v != id);
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
