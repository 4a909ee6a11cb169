//! Queue management commands (§4.10.1): every mutating intent the client
//! can issue against the Controller, plus the one read-only hydration query
//! that belongs with the queue rather than with settings or tools.

use tauri::State;

use crate::core::controller::{AddOutcome, Controller};
use crate::core::domain::{DuplicateCheckOutcome, Settings, Task};

/// Outcome of `add_download` flattened for the Tauri boundary: a plain
/// `Result<T, String>` cannot express "ambiguous" or "duplicate, need
/// consent" without collapsing them into an error, so this carries the
/// full `AddOutcome` shape across instead.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum AddDownloadResult {
    Added { task_id: u64 },
    Ambiguous,
    Invalid,
    Duplicate { outcome: DuplicateCheckOutcome },
}

impl From<AddOutcome> for AddDownloadResult {
    fn from(outcome: AddOutcome) -> Self {
        match outcome {
            AddOutcome::Added { task_id } => AddDownloadResult::Added { task_id },
            AddOutcome::Ambiguous => AddDownloadResult::Ambiguous,
            AddOutcome::Invalid => AddDownloadResult::Invalid,
            AddOutcome::Duplicate(outcome) => AddDownloadResult::Duplicate { outcome },
        }
    }
}

/// Get the current queue snapshot for initial UI hydration (§4.10.1).
#[tauri::command]
pub fn get_queue_state(controller: State<'_, Controller>) -> Vec<Task> {
    controller.snapshot_tasks()
}

/// `is_ambiguous(url)`: the client must call this (and ask the user
/// single-video vs playlist) before `add_download` when it returns true
/// (§7 "Ambiguous input").
#[tauri::command]
pub fn is_ambiguous_url(controller: State<'_, Controller>, url: String) -> bool {
    controller.is_ambiguous(&url)
}

/// `add(url)` (§4.10): enqueue a new task. `prefer_playlist` must reflect
/// the client's answer when `is_ambiguous_url` returned true; `force`
/// skips the duplicate check and clears any conflicting history entry
/// (the consent path after a `Duplicate` result).
#[tauri::command]
pub async fn add_download(
    controller: State<'_, Controller>,
    url: String,
    settings: Option<Settings>,
    prefer_playlist: bool,
    force: bool,
) -> Result<AddDownloadResult, String> {
    let controller = controller.inner().clone();
    tauri::async_runtime::spawn_blocking(move || controller.add(&url, settings, prefer_playlist, force).into())
        .await
        .map_err(|e| format!("failed to join add_download task: {e}"))
}

/// `pause(id)` (§4.10).
#[tauri::command]
pub fn pause_task(controller: State<'_, Controller>, task_id: u64) {
    controller.pause(task_id);
}

/// `resume(id)` (§4.10).
#[tauri::command]
pub fn resume_task(controller: State<'_, Controller>, task_id: u64) {
    controller.resume(task_id);
}

/// `retry(id, force)` (§4.10).
#[tauri::command]
pub async fn retry_task(
    controller: State<'_, Controller>,
    task_id: u64,
    force: bool,
) -> Result<AddDownloadResult, String> {
    let controller = controller.inner().clone();
    tauri::async_runtime::spawn_blocking(move || controller.retry(task_id, force).into())
        .await
        .map_err(|e| format!("failed to join retry_task task: {e}"))
}

/// `remove(id)` (§4.10).
#[tauri::command]
pub fn remove_task(controller: State<'_, Controller>, task_id: u64) {
    controller.remove(task_id);
}

/// `delete_file(id)` (§4.10).
#[tauri::command]
pub async fn delete_task_file(controller: State<'_, Controller>, task_id: u64) -> Result<(), String> {
    let controller = controller.inner().clone();
    tauri::async_runtime::spawn_blocking(move || controller.delete_file(task_id).map_err(|e| e.to_string()))
        .await
        .map_err(|e| e.to_string())?
}

/// `toggle_global` (§4.10): flips the global pause/resume run-gate.
#[tauri::command]
pub fn toggle_global_pause(controller: State<'_, Controller>) {
    controller.toggle_global();
}
