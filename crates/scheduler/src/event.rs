// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A queued unit of work.

use devmand_core::{Device, Seqnum, WorkerId};

/// Lifecycle state of an [`Event`]. A completed event is removed from the
/// queue outright rather than marked; there is no terminal variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    Queued,
    Running,
}

devmand_core::simple_display! {
    EventState {
        Queued => "queued",
        Running => "running",
    }
}

/// A device-change record awaiting rule application.
///
/// `state == Running` iff `worker.is_some()`. The scheduler
/// never marks an event "done" - a completed event is removed from the
/// [`crate::EventQueue`] entirely (see [`crate::queue::EventQueue::detach`]).
#[derive(Debug, Clone)]
pub struct Event {
    pub seqnum: Seqnum,
    state: EventState,
    /// Enriched, locally-mutated device record. Rule application may add
    /// properties to this copy; nothing else in the scheduler mutates it.
    pub device: Device,
    /// Verbatim clone of the kernel-side record, forwarded downstream
    /// unmodified if the worker processing this event fails.
    pub device_kernel: Device,
    worker: Option<WorkerId>,
    /// Memoized seqnum of the most recent event found to block this one;
    /// short-circuits the dependency scan while still present.
    pub delaying_seqnum: Option<Seqnum>,
}

impl Event {
    /// Construct a freshly queued event from a device record. Both the
    /// enriched copy and the frozen kernel clone start out identical.
    pub fn new(device: Device) -> Self {
        let device_kernel = device.clone();
        Self {
            seqnum: Seqnum(device.seqnum),
            state: EventState::Queued,
            device,
            device_kernel,
            worker: None,
            delaying_seqnum: None,
        }
    }

    pub fn state(&self) -> EventState {
        self.state
    }

    pub fn worker(&self) -> Option<WorkerId> {
        self.worker
    }

    pub fn is_queued(&self) -> bool {
        self.state == EventState::Queued
    }

    pub fn is_running(&self) -> bool {
        self.state == EventState::Running
    }

    /// Attach this event to a worker, transitioning `Queued -> Running`.
    ///
    /// Caller (the [`crate::WorkerPool`]) is responsible for the symmetric
    /// `worker.event = Some(self.seqnum)` half of this invariant.
    pub fn attach(&mut self, worker: WorkerId) {
        self.worker = Some(worker);
        self.state = EventState::Running;
    }

    /// Detach this event from its worker. Does not transition back to
    /// `Queued` - a detached event is removed from the queue by the caller.
    pub fn detach(&mut self) {
        self.worker = None;
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
