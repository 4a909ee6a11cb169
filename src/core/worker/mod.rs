//! Worker (C8): one long-running execution context per pool slot, pulling
//! tasks from the Scheduler's queue and driving each through the Downloader
//! Wrapper (§4.8).

pub mod options;

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use unicode_normalization::UnicodeNormalization;

use crate::core::domain::{FragmentBucket, FragmentBuckets, FragmentKind, Metadata, ProgressEvent};
use crate::core::downloader::{ControlSignal, DownloaderEvent, DownloaderWrapper, PAUSED_BY_USER};
use crate::core::events::EventSink;
use crate::core::metadata::fetch_metadata;
use crate::core::scheduler::{Scheduler, PRIORITY_RESUME};

/// Everything a worker needs besides the scheduler it pulls from.
pub struct WorkerContext {
    pub downloader: DownloaderWrapper,
    pub ffmpeg_location: Option<String>,
    pub events: Arc<dyn EventSink>,
}

/// Spawns a worker thread that loops until the scheduler tells it to exit
/// (shutdown sentinel or graceful retirement, §4.8 step 9).
pub fn spawn_worker(scheduler: Arc<Scheduler>, context: Arc<WorkerContext>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || worker_loop(&scheduler, &context))
}

fn worker_loop(scheduler: &Scheduler, context: &WorkerContext) {
    loop {
        scheduler.wait_until_run_gate_open();

        let Some(entry) = scheduler.dequeue() else {
            crate::debug_eprintln!("worker exiting: shutdown sentinel received");
            return;
        };

        let Some(task_id) = entry.task_id else {
            continue;
        };

        if scheduler.is_task_paused(task_id) {
            // Dequeued a task that was paused after being enqueued; drop it
            // rather than dispatch — resume_task will re-enqueue it.
            continue;
        }

        let is_resume = entry.priority == PRIORITY_RESUME;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            dispatch_task(scheduler, context, task_id, &entry.url, entry.settings.clone(), entry.metadata.clone(), is_resume)
        }));

        if let Err(payload) = outcome {
            let message = panic_payload_to_string(&payload);
            crate::debug_eprintln!("worker caught panic on task {task_id}: {message}");
            context.events.download_finished(task_id, false, &format!("internal error: {message}"), "");
        }

        if scheduler.claim_retirement() {
            crate::debug_eprintln!("worker retiring gracefully after task {task_id}");
            return;
        }
    }
}

/// The body of §4.8 steps 4-8, run under `catch_unwind` by the caller.
fn dispatch_task(
    scheduler: &Scheduler,
    context: &WorkerContext,
    task_id: u64,
    url: &str,
    settings: crate::core::domain::Settings,
    mut metadata: Metadata,
    is_resume: bool,
) {
    if metadata.is_empty() {
        let format_ext = settings.format.extension();
        if let Some(fetched) = fetch_metadata(&context.downloader, url, Some(format_ext)) {
            metadata = fetched;
            context.events.metadata_fetched(task_id, &metadata);
        }
    }

    let mut buckets: FragmentBuckets = FragmentBuckets::new();
    if let Some(bytes) = metadata.estimated_video_bytes {
        buckets.insert(FragmentKind::Video, FragmentBucket { downloaded: 0, total: bytes, filename: None });
    }
    if let Some(bytes) = metadata.estimated_audio_bytes {
        buckets.insert(FragmentKind::Audio, FragmentBucket { downloaded: 0, total: bytes, filename: None });
    }

    context.events.task_started(task_id);

    let options = options::build_download_options(&settings, context.ffmpeg_location.as_deref(), is_resume);

    let mut last_destination: Option<String> = None;
    let mut current_bucket = FragmentKind::Video;

    let (ok, message) = context.downloader.download(
        url,
        &options,
        |event| handle_event(event, &mut buckets, &mut current_bucket, &mut last_destination, task_id, context),
        || scheduler.poll(task_id),
    );

    if message == PAUSED_BY_USER {
        // §4.8 step 8 / §9: PAUSED_BY_USER always means Paused, never Failed.
        context.events.download_finished(task_id, false, "paused", "");
        return;
    }

    if !ok {
        context.events.download_finished(task_id, false, &message, "");
        return;
    }

    let output_path = last_destination
        .filter(|path| Path::new(path).is_file())
        .or_else(|| locate_output_file(&settings.download_folder, &metadata, settings.format));

    context.events.download_finished(task_id, true, "complete", output_path.as_deref().unwrap_or(""));
}

/// Per-line progress translation (§4.8 step 7). The first fragment to report
/// a `Destination` line is assigned the video bucket, the second the audio
/// bucket — order of arrival, never a filename substring guess (§9 open
/// question: the distilled source's "contains f and mp4" heuristic is
/// explicitly rejected).
fn handle_event(
    event: DownloaderEvent,
    buckets: &mut FragmentBuckets,
    current_bucket: &mut FragmentKind,
    last_destination: &mut Option<String>,
    task_id: u64,
    context: &WorkerContext,
) {
    match event {
        DownloaderEvent::Destination { path } => {
            *last_destination = Some(path.clone());
            if !buckets.contains_key(&FragmentKind::Video) {
                *current_bucket = FragmentKind::Video;
            } else if !buckets.contains_key(&FragmentKind::Audio) {
                *current_bucket = FragmentKind::Audio;
            }
            buckets.entry(*current_bucket).or_default().filename = Some(path);
        }
        DownloaderEvent::Progress { percent, total_bytes, downloaded_bytes, speed_bytes_per_second, eta_seconds } => {
            let bucket = buckets.entry(*current_bucket).or_default();
            bucket.downloaded = downloaded_bytes;
            bucket.total = total_bytes.max(bucket.total);

            let video = buckets.get(&FragmentKind::Video).cloned().unwrap_or_default();
            let audio = buckets.get(&FragmentKind::Audio).cloned().unwrap_or_default();
            let video_finished = video.total > 0 && video.downloaded >= video.total;

            let cumulative_downloaded = video.downloaded + if video_finished { audio.downloaded } else { 0 };
            let cumulative_total = (video.total + audio.total).max(total_bytes);
            let cumulative_percent = if cumulative_total == 0 {
                percent.clamp(0.0, 100.0)
            } else {
                ((cumulative_downloaded as f64 / cumulative_total as f64) * 100.0).clamp(0.0, 100.0)
            };

            context.events.progress_updated(
                task_id,
                &ProgressEvent {
                    percent: cumulative_percent,
                    downloaded_bytes: cumulative_downloaded,
                    total_bytes: cumulative_total,
                    speed_bytes_per_second,
                    eta_seconds,
                    postprocessing: false,
                },
            );
        }
    }
}

/// §4.8 step 8's fallback file scan: Unicode-NFC-normalize both the expected
/// title and each directory entry's stem, substitute OS-reserved characters
/// with full-width equivalents in the expected title before comparing, and
/// accept any extension in the format's accepted set (§9 design note).
fn locate_output_file(download_folder: &str, metadata: &Metadata, format: crate::core::domain::OutputFormat) -> Option<String> {
    let title = metadata.title.as_deref()?;
    let normalized_title = normalize_for_filename_match(title);
    if normalized_title.is_empty() {
        return None;
    }

    let accepted = format.accepted_extensions();
    let entries = std::fs::read_dir(download_folder).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        if !accepted.contains(&extension.as_str()) {
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let normalized_stem: String = stem.nfc().collect();
        if normalized_stem.contains(&normalized_title) {
            return path.to_str().map(str::to_string);
        }
    }
    None
}

/// Substitutes each OS-reserved character with its full-width Unicode
/// equivalent, matching the sanitization the downloader itself applies to
/// the actual output filename, then NFC-normalizes the result.
fn normalize_for_filename_match(title: &str) -> String {
    let substituted: String = title
        .chars()
        .map(|c| match c {
            '<' => '\u{FF1C}',
            '>' => '\u{FF1E}',
            ':' => '\u{FF1A}',
            '"' => '\u{FF02}',
            '/' => '\u{FF0F}',
            '\\' => '\u{FF3C}',
            '|' => '\u{FF5C}',
            '?' => '\u{FF1F}',
            '*' => '\u{FF0A}',
            other => other,
        })
        .collect();
    substituted.nfc().collect()
}

fn panic_payload_to_string(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::OutputFormat;

    #[test]
    fn normalize_for_filename_match_substitutes_reserved_characters() {
        let normalized = normalize_for_filename_match("A: Question?");
        assert!(normalized.contains('\u{FF1A}'));
        assert!(normalized.contains('\u{FF1F}'));
    }

    #[test]
    fn locate_output_file_finds_matching_stem_regardless_of_exact_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("My Video.mkv"), b"data").unwrap();
        let metadata = Metadata { title: Some("My Video".to_string()), ..Metadata::default() };
        let found = locate_output_file(dir.path().to_str().unwrap(), &metadata, OutputFormat::Mp4);
        assert!(found.unwrap().ends_with("My Video.mkv"));
    }

    #[test]
    fn locate_output_file_returns_none_without_a_title() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = Metadata::default();
        assert_eq!(locate_output_file(dir.path().to_str().unwrap(), &metadata, OutputFormat::Mp4), None);
    }
}
