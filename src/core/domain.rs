//! Typed records for every value that crosses a component boundary: tasks,
//! settings, metadata, history records, progress events and the binary
//! version map. Everything here is `Serialize + Deserialize` because every
//! one of these types either sits in `tasks.json`/`history.db`/`settings.json`
//! or crosses the Tauri command boundary to the client.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Recognized output containers/formats. Video containers and audio formats
/// share one enum because a `Task`'s format decides, by itself, whether
/// `video_quality` or `audio_quality` applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Mp4,
    Mkv,
    Webm,
    Mp3,
    M4a,
    Wav,
}

impl OutputFormat {
    pub fn is_audio(self) -> bool {
        matches!(self, OutputFormat::Mp3 | OutputFormat::M4a | OutputFormat::Wav)
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Mp4 => "mp4",
            OutputFormat::Mkv => "mkv",
            OutputFormat::Webm => "webm",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::M4a => "m4a",
            OutputFormat::Wav => "wav",
        }
    }

    /// Extensions the completion file-scan (§4.8) accepts, regardless of the
    /// requested format — the muxer may have normalized the container.
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        &["mp4", "mkv", "webm", "mp3", "m4a", "wav"]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoQuality {
    Best,
    Worst,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    Best,
    #[serde(rename = "320k")]
    K320,
    #[serde(rename = "256k")]
    K256,
    #[serde(rename = "192k")]
    K192,
    #[serde(rename = "128k")]
    K128,
    Worst,
}

/// Configuration record consumed by workers and the downloader wrapper (C12).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub download_folder: String,
    #[serde(default = "default_format")]
    pub format: OutputFormat,
    #[serde(default = "default_video_quality")]
    pub video_quality: VideoQuality,
    #[serde(default = "default_audio_quality")]
    pub audio_quality: AudioQuality,
    #[serde(default = "default_max_downloads")]
    pub max_downloads: u32,
    #[serde(default)]
    pub normalize_audio: bool,
    #[serde(default)]
    pub use_acceleration: bool,
    #[serde(default)]
    pub is_resume: bool,
    #[serde(default)]
    pub language: String,
}

fn default_format() -> OutputFormat {
    OutputFormat::Mp4
}
fn default_video_quality() -> VideoQuality {
    VideoQuality::Best
}
fn default_audio_quality() -> AudioQuality {
    AudioQuality::Best
}
fn default_max_downloads() -> u32 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            download_folder: String::new(),
            format: default_format(),
            video_quality: default_video_quality(),
            audio_quality: default_audio_quality(),
            max_downloads: default_max_downloads(),
            normalize_audio: false,
            use_acceleration: false,
            is_resume: false,
            language: String::new(),
        }
    }
}

impl Settings {
    /// Concurrent fragment downloads requested when acceleration is on.
    pub const CONCURRENT_FRAGMENT_DOWNLOADS: u32 = 6;

    /// Worker-pool size this settings value implies, independent of the raw
    /// `max_downloads` field: acceleration clamps the pool to 1 (§3).
    pub fn effective_worker_count(&self) -> u32 {
        if self.use_acceleration {
            1
        } else {
            self.max_downloads.clamp(1, 10)
        }
    }

    /// Validates and clamps user-supplied settings before persistence (§4.12).
    pub fn sanitized(mut self) -> Self {
        self.max_downloads = self.max_downloads.clamp(1, 10);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Waiting,
    Downloading,
    Paused,
    Finished,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    SingleVideo,
    PlaylistChild,
    Standalone,
}

/// Title/uploader/duration/thumbnail/etc, lazily fetched by C3. Empty until
/// the worker fetches it (or the Controller does so eagerly for a UI
/// preview); every field has a documented fallback sentinel (§4.3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub estimated_video_bytes: Option<u64>,
    #[serde(default)]
    pub estimated_audio_bytes: Option<u64>,
    /// Present only for playlist-level metadata (C3 "for playlists").
    #[serde(default)]
    pub entry_count: Option<usize>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.video_id.is_none() && self.entry_count.is_none()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("No Title")
    }

    pub fn display_uploader(&self) -> &str {
        self.uploader.as_deref().unwrap_or("Unknown")
    }

    pub fn display_playlist_title(&self) -> &str {
        self.title.as_deref().unwrap_or("PlayList")
    }
}

/// A unit of planned or in-flight work (§3 Task).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub url: String,
    pub kind: TaskKind,
    /// The id of the playlist this task was expanded from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_playlist_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    pub settings: Settings,
    #[serde(default)]
    pub metadata: Metadata,
    pub status: TaskStatus,
    #[serde(default)]
    pub is_resume: bool,
}

impl Task {
    pub fn new(id: u64, url: String, kind: TaskKind, settings: Settings) -> Self {
        Task {
            id,
            url,
            kind,
            parent_playlist_id: None,
            video_id: None,
            output_path: None,
            settings,
            metadata: Metadata::default(),
            status: TaskStatus::Waiting,
            is_resume: false,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            TaskStatus::Waiting | TaskStatus::Downloading | TaskStatus::Paused
        )
    }
}

/// `(video_id, format) -> (title, uploader, completion_timestamp)` (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub title: String,
    pub uploader: String,
    pub completed_at: String,
}

/// Composite key for the history store. `serde_json` map keys must be
/// strings, so the store serializes this as `"video_id\u{0}format"` rather
/// than introducing a tuple-key workaround crate (§4.4 of SPEC_FULL.md).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey {
    pub video_id: String,
    pub format: OutputFormat,
}

impl HistoryKey {
    pub fn new(video_id: impl Into<String>, format: OutputFormat) -> Self {
        HistoryKey { video_id: video_id.into(), format }
    }

    pub(crate) fn to_storage_string(&self) -> String {
        format!("{}\u{0}{}", self.video_id, self.format.extension())
    }

    pub(crate) fn from_storage_string(s: &str) -> Option<Self> {
        let (video_id, fmt) = s.split_once('\u{0}')?;
        let format = match fmt {
            "mp4" => OutputFormat::Mp4,
            "mkv" => OutputFormat::Mkv,
            "webm" => OutputFormat::Webm,
            "mp3" => OutputFormat::Mp3,
            "m4a" => OutputFormat::M4a,
            "wav" => OutputFormat::Wav,
            _ => return None,
        };
        Some(HistoryKey { video_id: video_id.to_string(), format })
    }
}

/// `{ "downloader": version, "muxer": version, "last_check": timestamp }` (§3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryVersionMap {
    #[serde(default)]
    pub downloader: Option<String>,
    #[serde(default)]
    pub muxer: Option<String>,
    #[serde(default)]
    pub last_check: Option<String>,
}

/// Normalized progress record re-emitted upward by the Worker (§4.8 step 7).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub percent: f64,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_bytes_per_second: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
    pub postprocessing: bool,
}

/// Per-task accounting the worker keeps while a download is in flight
/// (§4.8 step 5): two fragment buckets, video first then audio.
#[derive(Debug, Clone, Default)]
pub struct FragmentBucket {
    pub downloaded: u64,
    pub total: u64,
    pub filename: Option<String>,
}

pub type FragmentBuckets = HashMap<FragmentKind, FragmentBucket>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Video,
    Audio,
}

/// Client-facing view of one history entry (`list_history`, §4.10.1):
/// `HistoryKey` itself isn't `Serialize` since it crosses the Tauri boundary
/// only in this flattened shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub video_id: String,
    pub format: OutputFormat,
    pub title: String,
    pub uploader: String,
    pub completed_at: String,
}

/// Result of a duplicate-enqueue check surfaced to the client for consent
/// (§4.6, §7 "Duplicate on enqueue": ask user, proceed only on consent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCheckOutcome {
    pub explanation: String,
    pub matching_task_id: Option<u64>,
}
