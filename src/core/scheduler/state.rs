//! Priority queue and shared mutable state for the Scheduler (C9), matching
//! the teacher's `Inner { state: Mutex<...>, cv: Condvar, ... }` shape
//! (§4.9.1 of SPEC_FULL.md).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::domain::{Metadata, Settings};

/// Reserved priorities (§3 Queue Entry / §4.9): lower dispatches first.
pub const PRIORITY_SHUTDOWN: u8 = 0;
pub const PRIORITY_RESUME: u8 = 1;
pub const PRIORITY_FRESH: u8 = 3;

/// `(priority, task_id, url, settings, metadata)` (§3). `task_id = None`
/// marks a shutdown sentinel.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub priority: u8,
    pub sequence: u64,
    pub task_id: Option<u64>,
    pub url: String,
    pub settings: Settings,
    pub metadata: Metadata,
}

impl QueueEntry {
    pub fn shutdown_sentinel(sequence: u64) -> Self {
        QueueEntry {
            priority: PRIORITY_SHUTDOWN,
            sequence,
            task_id: None,
            url: String::new(),
            settings: Settings::default(),
            metadata: Metadata::default(),
        }
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}
impl Eq for QueueEntry {}

/// `BinaryHeap` is a max-heap; this ordering is reversed on both fields so
/// the lowest priority number (dispatches first) and, within a priority
/// level, the lowest sequence number (FIFO, §5 "Queue fairness within a
/// priority level is FIFO") compare as the greatest and are popped first.
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// State behind the scheduler's single `Mutex`, per §4.9.1. The per-task
/// paused set is deliberately **not** in here — it is guarded by its own
/// mutex so `pause_task`/`resume_task` never contend with queue dispatch.
#[derive(Default)]
pub struct SchedulerState {
    pub queue: BinaryHeap<QueueEntry>,
    pub next_sequence: u64,
    /// Number of spawned worker threads, used by `adjust_worker_count` to
    /// decide how many more to spawn.
    pub spawned_workers: usize,
    /// Workers marked for graceful retirement: they finish their current
    /// task (or the next task-boundary, if idle) and then exit without
    /// being replaced (§4.9 `adjust_worker_count`).
    pub retiring: usize,
}

impl SchedulerState {
    pub fn push(&mut self, priority: u8, task_id: Option<u64>, url: String, settings: Settings, metadata: Metadata) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push(QueueEntry { priority, sequence, task_id, url, settings, metadata });
    }
}
