//! Binary Manager (C7) and History Store (C4) read-only commands
//! (§4.10.1, §6.1).

use tauri::{AppHandle, Emitter, State};

use crate::core::controller::Controller;
use crate::core::domain::HistoryEntry;
use crate::core::tools::types::{BinaryKind, ToolStatus};

/// Get the last-known status of the downloader/muxer binaries. Safe to call
/// on the startup UI path: never probes the network.
#[tauri::command]
pub fn get_tool_status(controller: State<'_, Controller>) -> Vec<ToolStatus> {
    controller.binary_manager().status_snapshot()
}

/// Every completed download on record, for the client's history view.
#[tauri::command]
pub fn list_history(controller: State<'_, Controller>) -> Vec<HistoryEntry> {
    controller
        .history()
        .list()
        .into_iter()
        .map(|(key, record)| HistoryEntry {
            video_id: key.video_id,
            format: key.format,
            title: record.title,
            uploader: record.uploader,
            completed_at: record.completed_at,
        })
        .collect()
}

/// Manually trigger a re-download of a binary, reporting progress through
/// `tool_status_changed`-shaped events (§6.1) rather than blocking the
/// Tauri command thread on network I/O.
#[tauri::command]
pub fn download_tool_now(app: AppHandle, controller: State<'_, Controller>, kind: BinaryKind) {
    let manager = controller.binary_manager();
    std::thread::Builder::new()
        .name(format!("reelforge-tool-download-{kind:?}"))
        .spawn(move || {
            emit_status(&app, kind, "downloading");
            let outcome = manager.update(&[kind], |_, _, _| {}, || false);
            match outcome {
                Ok(true) => emit_status(&app, kind, "ready"),
                Ok(false) => emit_status(&app, kind, "cancelled"),
                Err(err) => {
                    crate::debug_eprintln!("tool download for {kind:?} failed: {err:#}");
                    emit_status(&app, kind, "failed");
                }
            }
        })
        .map(|_| ())
        .unwrap_or_else(|err| crate::debug_eprintln!("failed to spawn tool download thread: {err}"));
}

fn emit_status(app: &AppHandle, kind: BinaryKind, status: &str) {
    #[derive(serde::Serialize, Clone)]
    #[serde(rename_all = "camelCase")]
    struct Payload<'a> {
        kind: &'a str,
        status: &'a str,
    }
    if let Err(err) = app.emit("reelforge://tool-status-changed", Payload { kind: kind.label(), status }) {
        crate::debug_eprintln!("failed to emit tool-status-changed: {err:#}");
    }
}
