#[macro_export]
macro_rules! debug_eprintln {
    ($($arg:tt)*) => {{
        #[cfg(debug_assertions)]
        {
            eprintln!($($arg)*);
        }
        // In release builds we still want the arguments to be "used" so we
        // don't get unused variable/import warnings, but we do not want to
        // evaluate potentially expensive formatting expressions.
        #[cfg(not(debug_assertions))]
        {
            let _ = || {
                let _ = format_args!($($arg)*);
            };
        }
    }};
}

mod commands;
pub mod core;
mod events;
mod sync_ext;

use std::sync::Arc;

use tauri::Manager;

use crate::core::controller::{Controller, ControllerDeps};
use crate::core::data_root::{resolve_data_root, HISTORY_FILENAME, SETTINGS_FILENAME, TASKS_FILENAME};
use crate::core::downloader::DownloaderWrapper;
use crate::core::tools::BinaryManager;
use crate::core::tools::types::BinaryKind;
use crate::events::AppEventSink;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .invoke_handler(tauri::generate_handler![
            commands::queue::get_queue_state,
            commands::queue::is_ambiguous_url,
            commands::queue::add_download,
            commands::queue::pause_task,
            commands::queue::resume_task,
            commands::queue::retry_task,
            commands::queue::remove_task,
            commands::queue::delete_task_file,
            commands::queue::toggle_global_pause,
            commands::settings::get_app_settings,
            commands::settings::save_app_settings,
            commands::tools::get_tool_status,
            commands::tools::list_history,
            commands::tools::download_tool_now,
        ])
        .setup(|app| {
            let handle = app.handle().clone();
            let data_root = resolve_data_root(&handle)?;

            let binary_manager = Arc::new(BinaryManager::new(&data_root));

            // First-run binary fetch (§4.7) runs on a detached thread so
            // `setup` never blocks the window on network I/O; the client
            // polls `get_tool_status` and listens for
            // `reelforge://tool-status-changed` to know when downloads are
            // in flight (§6.1).
            {
                let binary_manager = binary_manager.clone();
                let progress_handle = handle.clone();
                std::thread::Builder::new()
                    .name("reelforge-binary-ensure".to_string())
                    .spawn(move || {
                        let outcome = binary_manager.ensure_present(
                            |kind, _downloaded, _total| emit_tool_status(&progress_handle, kind, "downloading"),
                            || false,
                        );
                        match outcome {
                            Ok(true) => {
                                emit_tool_status(&progress_handle, BinaryKind::Downloader, "ready");
                                emit_tool_status(&progress_handle, BinaryKind::Muxer, "ready");
                            }
                            Ok(false) => crate::debug_eprintln!("binary ensure_present was cancelled"),
                            Err(err) => crate::debug_eprintln!("failed to ensure downloader binaries: {err:#}"),
                        }
                    })
                    .map_err(|err| anyhow::anyhow!("failed to spawn binary-ensure thread: {err}"))?;
            }

            let downloader = Arc::new(DownloaderWrapper::new(
                binary_manager.path_for(BinaryKind::Downloader).to_string_lossy().into_owned(),
            ));

            let deps = ControllerDeps {
                tasks_path: data_root.join(TASKS_FILENAME),
                history_path: data_root.join(HISTORY_FILENAME),
                settings_path: data_root.join(SETTINGS_FILENAME),
                binary_manager,
                client_events: Arc::new(AppEventSink::new(handle.clone())),
            };

            let controller = Controller::new(downloader, deps)?;
            app.manage(controller);

            Ok(())
        })
        .on_window_event(|window, event| {
            if window.label() != "main" {
                return;
            }
            if matches!(event, tauri::WindowEvent::Destroyed) {
                let controller = window.app_handle().state::<Controller>();
                controller.shutdown();
            }
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

fn emit_tool_status(app: &tauri::AppHandle, kind: BinaryKind, status: &str) {
    use tauri::Emitter;

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
