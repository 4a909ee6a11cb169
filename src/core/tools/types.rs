//! Shared value types for the Binary Manager (C7).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BinaryKind {
    Downloader,
    Muxer,
}

impl BinaryKind {
    pub fn label(self) -> &'static str {
        match self {
            BinaryKind::Downloader => "downloader",
            BinaryKind::Muxer => "muxer",
        }
    }

    pub fn file_name(self) -> &'static str {
        match (self, cfg!(target_os = "windows")) {
            (BinaryKind::Downloader, true) => "yt-dlp.exe",
            (BinaryKind::Downloader, false) => "yt-dlp",
            (BinaryKind::Muxer, true) => "ffmpeg.exe",
            (BinaryKind::Muxer, false) => "ffmpeg",
        }
    }
}

/// Per-binary install/update progress, mirrored to the client as
/// `tool_status_changed` (SPEC_FULL.md §6.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolStatus {
    pub kind_label: String,
    pub resolved_path: Option<String>,
    pub current_version: Option<String>,
    pub remote_version: Option<String>,
    pub update_available: bool,
    pub download_in_progress: bool,
    pub download_progress_percent: Option<f32>,
    pub downloaded_bytes: Option<u64>,
    pub total_bytes: Option<u64>,
    pub last_error: Option<String>,
}
