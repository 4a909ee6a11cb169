//! Settings Value commands (§4.12): the client reads and writes the single
//! `Settings` record through the Controller, which validates/clamps and
//! persists on every save.

use tauri::State;

use crate::core::controller::Controller;
use crate::core::domain::Settings;

/// Get the current application settings.
#[tauri::command]
pub fn get_app_settings(controller: State<'_, Controller>) -> Settings {
    controller.settings()
}

/// Save application settings; the worker pool is resized live if
/// `effective_worker_count()` changed (§4.9, §4.12).
#[tauri::command]
pub async fn save_app_settings(controller: State<'_, Controller>, settings: Settings) -> Result<Settings, String> {
    let controller = controller.inner().clone();
    tauri::async_runtime::spawn_blocking(move || controller.save_settings(settings).map_err(|e| e.to_string()))
        .await
        .map_err(|e| e.to_string())?
}
