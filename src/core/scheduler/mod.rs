//! Scheduler (C9): owns the priority queue and the pause/stop signaling that
//! Workers (C8) poll cooperatively. Mirrors the teacher's
//! `Inner { state: Mutex<...>, cv: Condvar }` shape so dispatch and
//! wake-on-enqueue/wake-on-shutdown read the same way as the engine's own
//! scheduler (§4.9.1 of SPEC_FULL.md).
//!
//! The per-task-paused set is a second, separate `Mutex<HashSet<u64>>`
//! (§4.9.1): pausing/resuming one task must never block on, or be blocked
//! by, the queue lock a dispatching worker is holding.

mod state;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

use crate::core::domain::{Metadata, Settings};
use crate::core::downloader::ControlSignal;
use crate::sync_ext::{CondvarExt, MutexExt};

pub use state::{QueueEntry, SchedulerState, PRIORITY_FRESH, PRIORITY_RESUME, PRIORITY_SHUTDOWN};

/// Narrow capability handed to a Worker so it can poll for pause/stop
/// without holding a back-reference to the whole Scheduler (§9 design note:
/// "a narrow capability interface... rather than a full back-pointer").
pub trait TaskGate: Send + Sync {
    fn poll(&self, task_id: u64) -> ControlSignal;
}

pub struct Scheduler {
    state: Mutex<SchedulerState>,
    cv: Condvar,
    paused_tasks: Mutex<HashSet<u64>>,
    globally_paused: AtomicBool,
    stopped: AtomicBool,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            state: Mutex::new(SchedulerState::default()),
            cv: Condvar::new(),
            paused_tasks: Mutex::new(HashSet::new()),
            globally_paused: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        }
    }

    /// Records that `count` worker threads have been spawned, for
    /// `adjust_worker_count` bookkeeping (§4.9).
    pub fn initialize(&self, count: usize) {
        let mut state = self.state.lock_unpoisoned();
        state.spawned_workers = count;
    }

    pub fn spawned_worker_count(&self) -> usize {
        self.state.lock_unpoisoned().spawned_workers
    }

    /// Adds a fresh (priority 3) or resumed (priority 1) entry to the queue
    /// and wakes one waiting worker (§4.9).
    pub fn enqueue(&self, priority: u8, task_id: Option<u64>, url: String, settings: Settings, metadata: Metadata) {
        let mut state = self.state.lock_unpoisoned();
        state.push(priority, task_id, url, settings, metadata);
        self.cv.notify_one();
    }

    /// Blocks until an entry is available or the scheduler has been told to
    /// shut down, in which case `None` is returned and the caller (a
    /// worker's main loop) should exit without being replaced.
    pub fn dequeue(&self) -> Option<QueueEntry> {
        let mut state = self.state.lock_unpoisoned();
        loop {
            if let Some(entry) = state.queue.pop() {
                if entry.task_id.is_none() {
                    // Shutdown sentinel: wake the next worker too, then exit.
                    self.cv.notify_one();
                    return None;
                }
                return Some(entry);
            }
            if self.stopped.load(Ordering::SeqCst) {
                return None;
            }
            state = self.cv.wait_unpoisoned(state);
        }
    }

    pub fn pause_all(&self) {
        let _guard = self.state.lock_unpoisoned();
        self.globally_paused.store(true, Ordering::SeqCst);
    }

    pub fn resume_all(&self) {
        {
            let _guard = self.state.lock_unpoisoned();
            self.globally_paused.store(false, Ordering::SeqCst);
        }
        self.cv.notify_all();
    }

    pub fn is_globally_paused(&self) -> bool {
        self.globally_paused.load(Ordering::SeqCst)
    }

    /// Blocks until the run-gate is open (not globally paused) or the
    /// scheduler is stopped (§4.8 step 1, §5 "run-gate wait").
    pub fn wait_until_run_gate_open(&self) {
        let state = self.state.lock_unpoisoned();
        let _state = self.cv.wait_while_unpoisoned(state, |_| {
            self.globally_paused.load(Ordering::SeqCst) && !self.stopped.load(Ordering::SeqCst)
        });
    }

    pub fn pause_task(&self, task_id: u64) {
        self.paused_tasks.lock_unpoisoned().insert(task_id);
    }

    pub fn resume_task(&self, task_id: u64) {
        self.paused_tasks.lock_unpoisoned().remove(&task_id);
    }

    pub fn is_task_paused(&self, task_id: u64) -> bool {
        self.paused_tasks.lock_unpoisoned().contains(&task_id)
    }

    /// Grows or shrinks the logical worker count. Growing is the caller's
    /// job (spawn more threads that call `dequeue`); shrinking is recorded
    /// here as a retirement count a worker consults between tasks so it can
    /// exit gracefully instead of being killed mid-download (§4.9).
    pub fn adjust_worker_count(&self, target: usize) -> AdjustOutcome {
        let mut state = self.state.lock_unpoisoned();
        if target > state.spawned_workers {
            let to_spawn = target - state.spawned_workers;
            state.spawned_workers = target;
            AdjustOutcome::Spawn(to_spawn)
        } else if target < state.spawned_workers {
            let to_retire = state.spawned_workers - target;
            state.retiring += to_retire;
            AdjustOutcome::Retire(to_retire)
        } else {
            AdjustOutcome::Unchanged
        }
    }

    /// Called by a worker between tasks to claim one pending retirement
    /// slot, if any. Returns `true` if this worker should exit now.
    pub fn claim_retirement(&self) -> bool {
        let mut state = self.state.lock_unpoisoned();
        if state.retiring > 0 {
            state.retiring -= 1;
            state.spawned_workers = state.spawned_workers.saturating_sub(1);
            true
        } else {
            false
        }
    }

    /// Pushes one shutdown sentinel per currently spawned worker and wakes
    /// them all, then marks the scheduler stopped so any worker that is
    /// still blocked in `dequeue` with an empty queue exits too (§4.9).
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let mut state = self.state.lock_unpoisoned();
        let sentinels = state.spawned_workers.max(1);
        for _ in 0..sentinels {
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            state.queue.push(QueueEntry::shutdown_sentinel(sequence));
        }
        self.cv.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustOutcome {
    Spawn(usize),
    Retire(usize),
    Unchanged,
}

impl TaskGate for Scheduler {
    /// §4.8 step 7's progress-hook poll: `Stop` wins over `Pause`, global
    /// pause wins over per-task pause (either is sufficient to pause).
    fn poll(&self, task_id: u64) -> ControlSignal {
        if self.stopped.load(Ordering::SeqCst) {
            return ControlSignal::Stop;
        }
        if self.globally_paused.load(Ordering::SeqCst) || self.is_task_paused(task_id) {
            return ControlSignal::Pause;
        }
        ControlSignal::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings { download_folder: "/tmp".to_string(), ..Settings::default() }
    }

    #[test]
    fn enqueue_then_dequeue_round_trips() {
        let scheduler = Scheduler::new();
        scheduler.enqueue(PRIORITY_FRESH, Some(1), "u".to_string(), settings(), Metadata::default());
        let entry = scheduler.dequeue().unwrap();
        assert_eq!(entry.task_id, Some(1));
    }

    #[test]
    fn resume_priority_dispatches_before_fresh() {
        let scheduler = Scheduler::new();
        scheduler.enqueue(PRIORITY_FRESH, Some(1), "u1".to_string(), settings(), Metadata::default());
        scheduler.enqueue(PRIORITY_RESUME, Some(2), "u2".to_string(), settings(), Metadata::default());
        assert_eq!(scheduler.dequeue().unwrap().task_id, Some(2));
        assert_eq!(scheduler.dequeue().unwrap().task_id, Some(1));
    }

    #[test]
    fn shutdown_unblocks_waiting_dequeue() {
        let scheduler = std::sync::Arc::new(Scheduler::new());
        scheduler.initialize(1);
        let waiter = {
            let scheduler = scheduler.clone();
            std::thread::spawn(move || scheduler.dequeue())
        };
        std::thread::sleep(std::time::Duration::from_millis(20));
        scheduler.shutdown();
        assert_eq!(waiter.join().unwrap(), None);
    }

    #[test]
    fn task_gate_reports_stop_over_pause() {
        let scheduler = Scheduler::new();
        scheduler.pause_task(1);
        scheduler.shutdown();
        assert_eq!(scheduler.poll(1), ControlSignal::Stop);
    }

    #[test]
    fn task_gate_reports_pause_for_paused_task_only() {
        let scheduler = Scheduler::new();
        scheduler.pause_task(1);
        assert_eq!(scheduler.poll(1), ControlSignal::Pause);
        assert_eq!(scheduler.poll(2), ControlSignal::Continue);
    }

    #[test]
    fn adjust_worker_count_reports_spawn_and_retire() {
        let scheduler = Scheduler::new();
        scheduler.initialize(2);
        assert_eq!(scheduler.adjust_worker_count(4), AdjustOutcome::Spawn(2));
        assert_eq!(scheduler.adjust_worker_count(1), AdjustOutcome::Retire(3));
        assert!(scheduler.claim_retirement());
    }
}
