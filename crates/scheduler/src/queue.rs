// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ordered event queue and its dependency-serialization predicate.

use crate::event::{Event, EventState};
use crate::ports::QueueMarker;
use devmand_core::{Device, Seqnum};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("device record has no seqnum")]
    MissingSeqnum,
}

/// Which events a [`EventQueue::cleanup`] call should remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMatch {
    Any,
    State(EventState),
}

/// Ordered, append-only-on-the-tail list of [`Event`]s with arbitrary
/// mid-list removal.
pub struct EventQueue<M: QueueMarker> {
    events: Vec<Event>,
    marker: M,
}

impl<M: QueueMarker> EventQueue<M> {
    pub fn new(marker: M) -> Self {
        Self { events: Vec::new(), marker }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, seqnum: Seqnum) -> Option<&Event> {
        self.events.iter().find(|e| e.seqnum == seqnum)
    }

    pub fn get_mut(&mut self, seqnum: Seqnum) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.seqnum == seqnum)
    }

    /// Append a fresh event to the tail.
    ///
    /// Creates the on-disk marker if the queue was empty. Fails only if the
    /// record has no seqnum (0 is the reserved/invalid sentinel).
    pub fn enqueue(&mut self, device: Device) -> Result<Seqnum, QueueError> {
        if device.seqnum == 0 {
            return Err(QueueError::MissingSeqnum);
        }
        let was_empty = self.events.is_empty();
        let seqnum = Seqnum(device.seqnum);
        self.events.push(Event::new(device));
        if was_empty {
            self.marker.create();
        }
        Ok(seqnum)
    }

    /// The §4.1 dependency predicate, evaluated for the event at `idx`
    /// against every strictly-earlier event. Updates `delaying_seqnum` as a
    /// side effect so the next call can short-circuit.
    fn is_busy(&mut self, idx: usize) -> bool {
        if let Some(delaying) = self.events[idx].delaying_seqnum {
            if self.events.iter().any(|e| e.seqnum == delaying) {
                return true;
            }
            // The event we were waiting on is gone; the memo is stale.
            self.events[idx].delaying_seqnum = None;
        }

        let mut blocker = None;
        for earlier in &self.events[..idx] {
            if dependency_conflict(&self.events[idx].device, &earlier.device) {
                blocker = Some(earlier.seqnum);
                break;
            }
        }
        self.events[idx].delaying_seqnum = blocker;
        blocker.is_some()
    }

    /// The first queued event (head to tail) whose predicate is false, or
    /// `None` if every queued event is blocked or the queue has no queued
    /// events left.
    pub fn next_runnable(&mut self) -> Option<Seqnum> {
        for idx in 0..self.events.len() {
            if self.events[idx].is_queued() && !self.is_busy(idx) {
                return Some(self.events[idx].seqnum);
            }
        }
        None
    }

    /// Remove an event by seqnum (normal completion or worker-fatal path).
    /// Removes the on-disk marker if the queue becomes empty.
    pub fn detach_and_free(&mut self, seqnum: Seqnum) -> Option<Event> {
        let idx = self.events.iter().position(|e| e.seqnum == seqnum)?;
        let removed = self.events.remove(idx);
        if self.events.is_empty() {
            self.marker.remove();
        }
        Some(removed)
    }

    /// Remove every event matching `m`. Returns the
    /// removed events so the caller can detach their workers.
    pub fn cleanup(&mut self, m: CleanupMatch) -> Vec<Event> {
        let (keep, removed): (Vec<_>, Vec<_>) = std::mem::take(&mut self.events)
            .into_iter()
            .partition(|e| !matches(m, e));
        self.events = keep;
        if self.events.is_empty() && !removed.is_empty() {
            self.marker.remove();
        }
        removed
    }
}

fn matches(m: CleanupMatch, e: &Event) -> bool {
    match m {
        CleanupMatch::Any => true,
        CleanupMatch::State(s) => e.state() == s,
    }
}

/// True if `e` must not start while `earlier` is still present.
fn dependency_conflict(e: &Device, earlier: &Device) -> bool {
    if let (Some(a), Some(b)) = (e.devnum, earlier.devnum) {
        if a == b && e.is_block() == earlier.is_block() {
            return true;
        }
    }
    if let Some(ifindex) = e.ifindex {
        if ifindex > 0 && Some(ifindex) == earlier.ifindex {
            return true;
        }
    }
    if let Some(old) = &e.devpath_old {
        if *old == earlier.devpath {
            return true;
        }
    }
    if e.devpath == earlier.devpath {
        return true;
    }
    if is_ancestor(&e.devpath, &earlier.devpath) {
        return true;
    }
    if is_ancestor(&earlier.devpath, &e.devpath) {
        return true;
    }
    false
}

/// True if `ancestor` is a strict prefix of `descendant` ending at a path
/// separator.
fn is_ancestor(ancestor: &str, descendant: &str) -> bool {
    ancestor.len() < descendant.len()
        && descendant.starts_with(ancestor)
        && descendant.as_bytes()[ancestor.len()] == b'/'
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
