// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker-side half of the Worker/Event cyclic reference.
//!
//! `Worker` and `Event` each hold the other's id rather than an owning
//! pointer; detachment is a single assignment clearing both sides.

use devmand_core::{Seqnum, WorkerId, WorkerState};
use std::time::{Duration, Instant};

/// OS process id of a forked/spawned worker. Opaque beyond equality and the
/// signal/credential plumbing in `devmand-adapters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pid(pub u32);

impl std::fmt::Display for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A forked worker process.
///
/// The `warning`/`kill` deadlines are a pair of scoped timers: armed
/// together in [`Worker::attach`], cleared together in
/// [`Worker::detach`], so release happens on every code path including the
/// forced-kill one.
#[derive(Debug, Clone)]
pub struct Worker {
    pub id: WorkerId,
    pub pid: Pid,
    state: WorkerState,
    event: Option<Seqnum>,
    warning_deadline: Option<Instant>,
    kill_deadline: Option<Instant>,
    warned: bool,
    killed_fired: bool,
}

impl Worker {
    /// A freshly spawned worker is `Idle` until the pool hands it a device.
    pub fn new(id: WorkerId, pid: Pid) -> Self {
        Self {
            id,
            pid,
            state: WorkerState::Idle,
            event: None,
            warning_deadline: None,
            kill_deadline: None,
            warned: false,
            killed_fired: false,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn event(&self) -> Option<Seqnum> {
        self.event
    }

    pub fn kill_deadline(&self) -> Option<Instant> {
        if self.killed_fired {
            None
        } else {
            self.kill_deadline
        }
    }

    pub fn warning_deadline(&self) -> Option<Instant> {
        if self.warned {
            None
        } else {
            self.warning_deadline
        }
    }

    /// Attach this worker to an event, transitioning to `Running` and
    /// arming its per-event timers relative to `now`.
    pub fn attach(&mut self, seqnum: Seqnum, now: Instant, warning_at: Duration, kill_at: Duration) {
        self.event = Some(seqnum);
        self.state = WorkerState::Running;
        self.warning_deadline = Some(now + warning_at);
        self.kill_deadline = Some(now + kill_at);
        self.warned = false;
        self.killed_fired = false;
    }

    /// Clear the event back-reference and disarm both timers - the other
    /// half of detaching, on every path (completion, reap, forced kill).
    pub fn detach(&mut self) {
        self.event = None;
        self.warning_deadline = None;
        self.kill_deadline = None;
        self.warned = false;
        self.killed_fired = false;
    }

    pub fn mark_warned(&mut self) {
        self.warned = true;
    }

    /// The kill deadline fired; `kill_deadline()` stops returning `Some`
    /// until the next `attach`, mirroring `mark_warned`.
    pub fn mark_kill_timer_fired(&mut self) {
        self.killed_fired = true;
    }

    /// `Running -> Idle` on the child's completion datagram.
    pub fn mark_idle(&mut self) {
        debug_assert!(self.event.is_none(), "idle worker must have no attached event");
        self.state = WorkerState::Idle;
    }

    /// `Running -> Killing`: deferred kill after the current event finishes
    /// (soft kill / reload).
    pub fn mark_killing(&mut self) {
        if self.state == WorkerState::Running {
            self.state = WorkerState::Killing;
        }
    }

    /// Force this worker into `Killed` regardless of its prior state.
    pub fn mark_killed(&mut self) {
        self.state = WorkerState::Killed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_worker_starts_idle_with_no_event() {
        let w = Worker::new(WorkerId::new(), Pid(123));
        assert_eq!(w.state(), WorkerState::Idle);
        assert!(w.event().is_none());
    }

    #[test]
    fn mark_killing_is_a_noop_unless_running() {
        let w = Worker::new(WorkerId::new(), Pid(1));
        let mut w = w;
        w.mark_killing();
        assert_eq!(w.state(), WorkerState::Idle, "only Running workers defer to Killing");
    }

    #[test]
    fn attach_detach_round_trip_clears_timers() {
        let mut w = Worker::new(WorkerId::new(), Pid(1));
        let now = Instant::now();
        w.attach(Seqnum(9), now, Duration::from_secs(2), Duration::from_secs(5));
        assert_eq!(w.event(), Some(Seqnum(9)));
        assert_eq!(w.state(), WorkerState::Running);
        assert!(w.kill_deadline().is_some());
        assert!(w.warning_deadline().is_some());
        w.detach();
        assert!(w.event().is_none());
        assert!(w.kill_deadline().is_none());
        assert!(w.warning_deadline().is_none());
    }

    #[test]
    fn warning_deadline_hides_once_warned() {
        let mut w = Worker::new(WorkerId::new(), Pid(1));
        w.attach(Seqnum(1), Instant::now(), Duration::from_secs(1), Duration::from_secs(5));
        assert!(w.warning_deadline().is_some());
        w.mark_warned();
        assert!(w.warning_deadline().is_none(), "warned workers don't re-fire the warning timer");
        assert!(w.kill_deadline().is_some(), "kill deadline is independent of the warning flag");
    }

    #[test]
    fn kill_deadline_hides_once_fired() {
        let mut w = Worker::new(WorkerId::new(), Pid(1));
        w.attach(Seqnum(1), Instant::now(), Duration::from_secs(1), Duration::from_secs(5));
        assert!(w.kill_deadline().is_some());
        w.mark_kill_timer_fired();
        assert!(w.kill_deadline().is_none(), "a fired kill timer doesn't re-fire until the next attach");
        w.attach(Seqnum(2), Instant::now(), Duration::from_secs(1), Duration::from_secs(5));
        assert!(w.kill_deadline().is_some(), "attach re-arms the kill deadline");
    }
}
