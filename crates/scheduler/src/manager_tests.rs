// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::ports::{NoopDb, NoopMarker, SpawnedWorker};
use devmand_core::{Action, Device};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct FakeSpawner {
    next_pid: AtomicU32,
}

struct FakeChannel;

impl crate::ports::WorkerChannel for FakeChannel {
    fn send_device(&self, _device: &Device) -> Result<(), std::io::Error> {
        Ok(())
    }

    fn signal(&self, _sig: KillSignal) -> Result<(), std::io::Error> {
        Ok(())
    }
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&self) -> Result<SpawnedWorker, std::io::Error> {
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SpawnedWorker { pid: Pid(pid), channel: Box::new(FakeChannel) })
    }
}

#[derive(Default, Clone)]
struct FakeSink {
    sent: Arc<Mutex<Vec<Device>>>,
}

impl EventSink for FakeSink {
    fn send(&self, device: &Device) -> Result<(), std::io::Error> {
        self.sent.lock().push(device.clone());
        Ok(())
    }
}

fn device(seqnum: u64, devpath: &str) -> Device {
    Device {
        seqnum,
        devpath: devpath.into(),
        subsystem: "net".into(),
        devname: None,
        devnum: None,
        ifindex: None,
        devpath_old: None,
        action: Action::Add,
        properties: BTreeMap::new(),
    }
}

fn manager(children_max: u32) -> Manager<FakeSpawner, NoopMarker, FakeSink> {
    let queue = EventQueue::new(NoopMarker);
    let pool = WorkerPool::new(
        FakeSpawner::default(),
        children_max,
        Duration::from_secs(10),
        0.5,
        KillSignal::Timeout,
    );
    Manager::new(queue, pool, FakeSink::default(), NoopDb)
}

/// Dispatch seqnum 1 on `m` and return the worker it landed on.
fn dispatch_first(m: &mut Manager<FakeSpawner, NoopMarker, FakeSink>) -> WorkerId {
    m.dispatch(Instant::now());
    m.queue().get(Seqnum(1)).unwrap().worker().unwrap()
}

#[test]
fn dispatch_spawns_a_worker_for_a_runnable_event() {
    let mut m = manager(4);
    m.enqueue(device(1, "/x")).unwrap();
    let events = m.dispatch(Instant::now());
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ManagerEvent::Dispatched { seqnum: Seqnum(1), .. }));
    assert_eq!(m.pool().len(), 1);
}

#[test]
fn dispatch_defers_when_blocked_by_an_earlier_event() {
    let mut m = manager(4);
    m.enqueue(device(1, "/x")).unwrap();
    m.enqueue(device(2, "/x")).unwrap();
    let events = m.dispatch(Instant::now());
    assert_eq!(events.len(), 1, "the blocked event never reaches dispatch_one");
    assert!(matches!(events[0], ManagerEvent::Dispatched { seqnum: Seqnum(1), .. }));
    assert_eq!(m.pool().len(), 1);
}

#[test]
fn dispatch_reports_saturation_once() {
    let mut m = manager(1);
    m.enqueue(device(1, "/a")).unwrap();
    m.enqueue(device(2, "/b")).unwrap();
    let events = m.dispatch(Instant::now());
    assert!(events.iter().any(|e| matches!(e, ManagerEvent::Dispatched { .. })));
    assert!(events.iter().any(|e| matches!(e, ManagerEvent::PoolSaturated)));
}

#[test]
fn complete_detaches_and_frees_the_event() {
    let mut m = manager(4);
    m.enqueue(device(1, "/x")).unwrap();
    let worker_id = dispatch_first(&mut m);
    let pid = m.pool().get(worker_id).unwrap().pid;

    let freed = m.complete(pid);
    assert_eq!(freed, Some(Seqnum(1)));
    assert!(m.queue().get(Seqnum(1)).is_none());
    assert_eq!(m.pool().get(worker_id).unwrap().state(), devmand_core::WorkerState::Idle);
}

#[test]
fn reap_with_attached_event_forwards_frozen_kernel_clone() {
    let sink = FakeSink::default();
    let queue = EventQueue::new(NoopMarker);
    let pool =
        WorkerPool::new(FakeSpawner::default(), 4, Duration::from_secs(10), 0.5, KillSignal::Timeout);
    let mut m = Manager::new(queue, pool, sink.clone(), NoopDb);
    m.enqueue(device(1, "/x")).unwrap();
    let worker_id = dispatch_first(&mut m);
    let pid = m.pool().get(worker_id).unwrap().pid;

    let outcome = m.reap(pid);
    assert_eq!(outcome, Some(ManagerEvent::ReapedWithForward { worker: worker_id, seqnum: Seqnum(1) }));
    assert_eq!(sink.sent.lock().len(), 1);
    assert!(m.queue().get(Seqnum(1)).is_none());
}

#[test]
fn reap_without_an_attached_event_does_not_touch_the_sink() {
    let sink = FakeSink::default();
    let queue = EventQueue::new(NoopMarker);
    let pool =
        WorkerPool::new(FakeSpawner::default(), 4, Duration::from_secs(10), 0.5, KillSignal::Timeout);
    let mut m = Manager::new(queue, pool, sink.clone(), NoopDb);
    m.enqueue(device(1, "/x")).unwrap();
    let worker_id = dispatch_first(&mut m);
    let pid = m.pool().get(worker_id).unwrap().pid;
    m.complete(pid);

    let outcome = m.reap(pid);
    assert_eq!(outcome, Some(ManagerEvent::Reaped { worker: worker_id }));
    assert!(sink.sent.lock().is_empty());
}

#[test]
fn begin_exit_stops_dispatch_and_force_kills() {
    let mut m = manager(4);
    m.enqueue(device(1, "/x")).unwrap();
    let worker_id = dispatch_first(&mut m);
    m.begin_exit();
    assert!(m.is_exiting());
    assert_eq!(m.pool().get(worker_id).unwrap().state(), devmand_core::WorkerState::Killed);

    m.enqueue(device(2, "/y")).unwrap();
    assert!(m.dispatch(Instant::now()).is_empty(), "dispatch is a no-op once exiting");
}

#[test]
fn idle_sweep_arms_when_queue_drains_and_fires_after_period() {
    let mut m = manager(4);
    m.enqueue(device(1, "/x")).unwrap();
    let worker_id = dispatch_first(&mut m);
    let pid = m.pool().get(worker_id).unwrap().pid;
    m.complete(pid);

    let now = Instant::now();
    m.update_idle_sweep(now);
    assert!(m.next_deadline().is_some());
    let fired = m.check_timers(now + IDLE_SWEEP_PERIOD);
    assert!(fired.contains(&ManagerEvent::IdleSweepFired));
    assert_eq!(m.pool().get(worker_id).unwrap().state(), devmand_core::WorkerState::Killed);
}

#[test]
fn idle_sweep_disarms_once_queue_is_non_empty_again() {
    let mut m = manager(4);
    m.enqueue(device(1, "/x")).unwrap();
    let worker_id = dispatch_first(&mut m);
    let pid = m.pool().get(worker_id).unwrap().pid;
    m.complete(pid);
    m.update_idle_sweep(Instant::now());

    m.enqueue(device(2, "/y")).unwrap();
    m.update_idle_sweep(Instant::now());
    assert!(m.next_deadline().is_none(), "idle sweep disarmed once work is queued again");
}

#[test]
fn set_env_rejects_malformed_entries() {
    let mut m = manager(4);
    assert!(!m.set_env("no-equals-sign"));
    assert!(m.properties().is_empty());
}

#[test]
fn set_env_insert_and_remove_round_trips_l3() {
    let mut m = manager(4);
    assert!(m.set_env("FOO=bar"));
    assert_eq!(m.properties().get("FOO"), Some(&"bar".to_string()));
    assert!(m.set_env("FOO="));
    assert!(m.properties().get("FOO").is_none(), "empty value removes the override (L3)");
}

#[derive(Default, Clone)]
struct SpyChannel {
    sent: Arc<Mutex<Vec<Device>>>,
}

impl crate::ports::WorkerChannel for SpyChannel {
    fn send_device(&self, device: &Device) -> Result<(), std::io::Error> {
        self.sent.lock().push(device.clone());
        Ok(())
    }

    fn signal(&self, _sig: KillSignal) -> Result<(), std::io::Error> {
        Ok(())
    }
}

#[derive(Default)]
struct SpySpawner {
    next_pid: AtomicU32,
    sent: Arc<Mutex<Vec<Device>>>,
}

impl ProcessSpawner for SpySpawner {
    fn spawn(&self) -> Result<SpawnedWorker, std::io::Error> {
        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SpawnedWorker { pid: Pid(pid), channel: Box::new(SpyChannel { sent: self.sent.clone() }) })
    }
}

#[test]
fn dispatch_merges_property_overrides_into_the_dispatched_device() {
    let sent = Arc::new(Mutex::new(Vec::new()));
    let queue = EventQueue::new(NoopMarker);
    let pool = WorkerPool::new(
        SpySpawner { next_pid: AtomicU32::new(0), sent: sent.clone() },
        4,
        Duration::from_secs(10),
        0.5,
        KillSignal::Timeout,
    );
    let mut m = Manager::new(queue, pool, FakeSink::default(), NoopDb);
    m.set_env("ID_FOO=bar");
    m.enqueue(device(1, "/x")).unwrap();
    m.dispatch(Instant::now());

    let sent = sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].properties.get("ID_FOO"), Some(&"bar".to_string()));
}
