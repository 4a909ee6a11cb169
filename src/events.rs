//! Bridges `core::events::EventSink` onto real client-facing Tauri events
//! (§6 "Client-facing events"). The blocking core never imports `tauri`
//! itself; this is the one adapter that does.

use serde::Serialize;
use tauri::{AppHandle, Emitter};

use crate::core::domain::{Metadata, ProgressEvent};
use crate::core::events::EventSink;

pub struct AppEventSink {
    app: AppHandle,
}

impl AppEventSink {
    pub fn new(app: AppHandle) -> Self {
        AppEventSink { app }
    }

    fn emit<T: Serialize + Clone>(&self, event: &str, payload: T) {
        if let Err(err) = self.app.emit(event, payload) {
            crate::debug_eprintln!("failed to emit {event}: {err:#}");
        }
    }
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct TaskStartedPayload {
    task_id: u64,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct MetadataFetchedPayload<'a> {
    task_id: u64,
    metadata: &'a Metadata,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct ProgressUpdatedPayload<'a> {
    task_id: u64,
    progress: &'a ProgressEvent,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct DownloadFinishedPayload<'a> {
    task_id: u64,
    success: bool,
    message: &'a str,
    output_path: &'a str,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct PlaylistExpandedPayload {
    parent_task_id: u64,
    child_count: usize,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct ToolStatusChangedPayload<'a> {
    kind: &'a str,
    status: &'a str,
}

impl EventSink for AppEventSink {
    fn task_started(&self, task_id: u64) {
        self.emit("reelforge://task-started", TaskStartedPayload { task_id });
    }

    fn metadata_fetched(&self, task_id: u64, metadata: &Metadata) {
        self.emit("reelforge://metadata-fetched", MetadataFetchedPayload { task_id, metadata });
    }

    fn progress_updated(&self, task_id: u64, progress: &ProgressEvent) {
        self.emit("reelforge://progress-updated", ProgressUpdatedPayload { task_id, progress });
    }

    fn download_finished(&self, task_id: u64, success: bool, message: &str, output_path: &str) {
        self.emit(
            "reelforge://download-finished",
            DownloadFinishedPayload { task_id, success, message, output_path },
        );
    }

    fn playlist_expanded(&self, parent_task_id: u64, child_count: usize) {
        self.emit("reelforge://playlist-expanded", PlaylistExpandedPayload { parent_task_id, child_count });
    }

    fn tool_status_changed(&self, kind: &str, status: &str) {
        self.emit("reelforge://tool-status-changed", ToolStatusChangedPayload { kind, status });
    }
}
