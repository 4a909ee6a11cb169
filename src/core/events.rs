//! Client-facing event surface (§6). The blocking core never talks to
//! Tauri directly; it reports through this trait, and `src/events.rs`
//! bridges the real implementation onto `AppHandle::emit`.

use super::domain::{Metadata, ProgressEvent};

pub trait EventSink: Send + Sync {
    fn task_started(&self, task_id: u64);
    fn metadata_fetched(&self, task_id: u64, metadata: &Metadata);
    fn progress_updated(&self, task_id: u64, progress: &ProgressEvent);
    fn download_finished(&self, task_id: u64, success: bool, message: &str, output_path: &str);
    /// Ambient addition (§6.1): signals that playlist expansion (C11) for
    /// `parent_task_id` has finished producing `child_count` child tasks.
    fn playlist_expanded(&self, parent_task_id: u64, child_count: usize);
    /// Ambient addition (§6.1): Binary Manager (C7) progress/completion,
    /// reusing the progress-reporting shape client-side.
    fn tool_status_changed(&self, kind: &str, status: &str);
}

/// Discards every event. Used by tests and any headless caller that has no
/// client to notify.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn task_started(&self, _task_id: u64) {}
    fn metadata_fetched(&self, _task_id: u64, _metadata: &Metadata) {}
    fn progress_updated(&self, _task_id: u64, _progress: &ProgressEvent) {}
    fn download_finished(&self, _task_id: u64, _success: bool, _message: &str, _output_path: &str) {}
    fn playlist_expanded(&self, _parent_task_id: u64, _child_count: usize) {}
    fn tool_status_changed(&self, _kind: &str, _status: &str) {}
}
