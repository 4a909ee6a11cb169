//! Playlist Expander (C11): turns a playlist URL into N child tasks on a
//! detached background thread so the client stays responsive (§4.11).

use std::sync::Arc;

use super::domain::{Metadata, Settings};
use super::downloader::DownloaderWrapper;
use super::events::EventSink;
use super::history::HistoryStore;
use super::metadata::fetch_playlist_entry_ids;
use super::scheduler::{Scheduler, PRIORITY_FRESH};

const VIDEO_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Allocates the next task id and enqueues one child per surviving entry.
/// `allocate_id` and `register_task` are callbacks into the Controller's
/// task list, kept narrow so this module never touches `Mutex<Vec<Task>>`
/// directly (mirrors the Worker/Scheduler capability-passing idiom, §9).
pub fn spawn_expansion<F, R>(
    downloader: Arc<DownloaderWrapper>,
    scheduler: Arc<Scheduler>,
    events: Arc<dyn EventSink>,
    history: Arc<HistoryStore>,
    parent_task_id: u64,
    playlist_url: String,
    settings: Settings,
    mut allocate_id: F,
    mut register_task: R,
) -> std::thread::JoinHandle<()>
where
    F: FnMut() -> u64 + Send + 'static,
    R: FnMut(u64, &str, &Settings) + Send + 'static,
{
    std::thread::spawn(move || {
        let entry_ids = fetch_playlist_entry_ids(&downloader, &playlist_url).unwrap_or_default();

        let mut child_count = 0usize;
        for video_id in entry_ids {
            if history.is_downloaded_any_format(&video_id) {
                continue;
            }
            let child_id = allocate_id();
            let canonical_url = format!("{VIDEO_URL_PREFIX}{video_id}");
            register_task(child_id, &canonical_url, &settings);
            scheduler.enqueue(PRIORITY_FRESH, Some(child_id), canonical_url, settings.clone(), Metadata::default());
            child_count += 1;
        }

        events.playlist_expanded(parent_task_id, child_count);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::ProgressEvent;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex as StdMutex;

    struct RecordingSink {
        expanded: StdMutex<Vec<(u64, usize)>>,
    }

    impl EventSink for RecordingSink {
        fn task_started(&self, _task_id: u64) {}
        fn metadata_fetched(&self, _task_id: u64, _metadata: &Metadata) {}
        fn progress_updated(&self, _task_id: u64, _progress: &ProgressEvent) {}
        fn download_finished(&self, _task_id: u64, _success: bool, _message: &str, _output_path: &str) {}
        fn playlist_expanded(&self, parent_task_id: u64, child_count: usize) {
            self.expanded.lock().unwrap().push((parent_task_id, child_count));
        }
        fn tool_status_changed(&self, _kind: &str, _status: &str) {}
    }

    #[test]
    fn expansion_with_unreachable_downloader_reports_zero_children() {
        let downloader = Arc::new(DownloaderWrapper::new("/nonexistent/downloader-binary"));
        let scheduler = Arc::new(Scheduler::new());
        let dir = tempfile::tempdir().unwrap();
        let history = Arc::new(HistoryStore::open(dir.path().join("history.json")).unwrap());
        let sink = Arc::new(RecordingSink { expanded: StdMutex::new(Vec::new()) });
        let next_id = Arc::new(AtomicU64::new(100));

        let handle = spawn_expansion(
            downloader,
            scheduler,
            sink.clone(),
            history,
            1,
            "https://www.youtube.com/playlist?list=PL1".to_string(),
            Settings::default(),
            {
                let next_id = next_id.clone();
                move || next_id.fetch_add(1, Ordering::SeqCst)
            },
            |_, _, _| {},
        );
        handle.join().unwrap();

        assert_eq!(*sink.expanded.lock().unwrap(), vec![(1, 0)]);
    }
}
