//! Controller (C10): thin orchestration facade over C1–C9, the single
//! writer of the in-memory task list (§5 "single-writer with read-only
//! snapshots"). Mirrors the teacher's `Engine { inner: Arc<Inner> }` facade
//! shape (`ffui_core/engine/mod.rs`).

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::domain::{DuplicateCheckOutcome, Metadata, Settings, Task, TaskKind, TaskStatus};
use super::downloader::DownloaderWrapper;
use super::duplicate;
use super::events::EventSink;
use super::history::HistoryStore;
use super::playlist;
use super::scheduler::{AdjustOutcome, Scheduler, PRIORITY_FRESH, PRIORITY_RESUME};
use super::settings::SettingsStore;
use super::task_store::TaskStore;
use super::tools::BinaryManager;
use super::worker::{self, WorkerContext};
use crate::sync_ext::MutexExt;

/// Everything the Controller needs resolved before it can start: paths for
/// the durable stores, the shared binary manager, and the client event
/// sink. Built once by the App Bootstrap (§4.12).
pub struct ControllerDeps {
    pub tasks_path: PathBuf,
    pub history_path: PathBuf,
    pub settings_path: PathBuf,
    pub binary_manager: Arc<BinaryManager>,
    pub client_events: Arc<dyn EventSink>,
}

struct Inner {
    tasks: Arc<Mutex<Vec<Task>>>,
    next_task_id: AtomicU64,
    settings: Mutex<Settings>,
    scheduler: Arc<Scheduler>,
    downloader: Arc<DownloaderWrapper>,
    history: Arc<HistoryStore>,
    task_store: TaskStore,
    settings_store: SettingsStore,
    binary_manager: Arc<BinaryManager>,
    client_events: Arc<dyn EventSink>,
}

/// Bridges worker/scheduler events into task-list mutations, then forwards
/// every event unchanged to the real client sink (§5: the Worker/Scheduler
/// must never hold the task-list lock directly; the Controller is the
/// single writer).
struct ControllerEventSink {
    tasks: Arc<Mutex<Vec<Task>>>,
    history: Arc<HistoryStore>,
    client: Arc<dyn EventSink>,
}

impl ControllerEventSink {
    fn with_task(&self, task_id: u64, f: impl FnOnce(&mut Task)) {
        let mut tasks = self.tasks.lock_unpoisoned();
        if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
            f(task);
        }
    }

    fn task_snapshot(&self, task_id: u64) -> Option<Task> {
        self.tasks.lock_unpoisoned().iter().find(|t| t.id == task_id).cloned()
    }
}

impl EventSink for ControllerEventSink {
    fn task_started(&self, task_id: u64) {
        self.with_task(task_id, |task| task.status = TaskStatus::Downloading);
        self.client.task_started(task_id);
    }

    fn metadata_fetched(&self, task_id: u64, metadata: &Metadata) {
        self.with_task(task_id, |task| {
            task.metadata = metadata.clone();
            if task.video_id.is_none() {
                task.video_id = metadata.video_id.clone();
            }
        });
        self.client.metadata_fetched(task_id, metadata);
    }

    fn progress_updated(&self, task_id: u64, progress: &super::domain::ProgressEvent) {
        self.client.progress_updated(task_id, progress);
    }

    fn download_finished(&self, task_id: u64, success: bool, message: &str, output_path: &str) {
        let is_paused = message == "paused";
        self.with_task(task_id, |task| {
            if is_paused {
                task.status = TaskStatus::Paused;
            } else if success {
                task.status = TaskStatus::Finished;
                task.output_path = if output_path.is_empty() { None } else { Some(output_path.to_string()) };
            } else {
                task.status = TaskStatus::Failed;
            }
        });

        if success && !is_paused {
            if let Some(task) = self.task_snapshot(task_id) {
                if let Some(video_id) = task.video_id.filter(|id| !id.is_empty()) {
                    if let Err(err) = self.history.add(&video_id, task.settings.format, &task.metadata) {
                        crate::debug_eprintln!("failed to record history for task {task_id}: {err:#}");
                    }
                }
            }
        }

        self.client.download_finished(task_id, success, message, output_path);
    }

    fn playlist_expanded(&self, parent_task_id: u64, child_count: usize) {
        self.client.playlist_expanded(parent_task_id, child_count);
    }

    fn tool_status_changed(&self, kind: &str, status: &str) {
        self.client.tool_status_changed(kind, status);
    }
}

#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

/// Outcome of `add()` (§4.10 "add(url)"). `Ambiguous`/`Duplicate` require a
/// round-trip to the client before the Controller will actually enqueue.
#[derive(Debug, Clone)]
pub enum AddOutcome {
    Added { task_id: u64 },
    Ambiguous,
    Invalid,
    Duplicate(DuplicateCheckOutcome),
}

impl Controller {
    pub fn new(downloader: Arc<DownloaderWrapper>, deps: ControllerDeps) -> anyhow::Result<Self> {
        let task_store = TaskStore::new(deps.tasks_path);
        let settings_store = SettingsStore::new(deps.settings_path);
        let history = Arc::new(HistoryStore::open(deps.history_path)?);
        let settings = settings_store.load();
        let tasks = task_store.load()?;
        let next_task_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        let worker_count = settings.effective_worker_count() as usize;

        let inner = Arc::new(Inner {
            tasks: Arc::new(Mutex::new(tasks)),
            next_task_id: AtomicU64::new(next_task_id),
            scheduler: Arc::new(Scheduler::new()),
            downloader,
            history,
            task_store,
            settings_store,
            binary_manager: deps.binary_manager,
            client_events: deps.client_events,
            settings: Mutex::new(settings),
        });

        let controller = Controller { inner };
        controller.start_workers(worker_count);
        Ok(controller)
    }

    fn live_event_sink(&self) -> Arc<dyn EventSink> {
        Arc::new(ControllerEventSink {
            tasks: self.inner.tasks.clone(),
            history: self.inner.history.clone(),
            client: self.inner.client_events.clone(),
        })
    }

    fn worker_context(&self) -> Arc<WorkerContext> {
        let ffmpeg_location = self.inner.binary_manager.ffmpeg_path().and_then(|p| p.to_str().map(str::to_string));
        Arc::new(WorkerContext { downloader: (*self.inner.downloader).clone(), ffmpeg_location, events: self.live_event_sink() })
    }

    fn start_workers(&self, count: usize) {
        self.inner.scheduler.initialize(count);
        let context = self.worker_context();
        for _ in 0..count {
            worker::spawn_worker(self.inner.scheduler.clone(), context.clone());
        }
    }

    pub fn snapshot_tasks(&self) -> Vec<Task> {
        self.inner.tasks.lock_unpoisoned().clone()
    }

    pub fn settings(&self) -> Settings {
        self.inner.settings.lock_unpoisoned().clone()
    }

    /// `save_app_settings` (§4.12): validates/clamps, persists, and adjusts
    /// the live worker pool if `effective_worker_count()` changed.
    pub fn save_settings(&self, settings: Settings) -> anyhow::Result<Settings> {
        let saved = self.inner.settings_store.save(settings)?;
        let previous_count = {
            let mut current = self.inner.settings.lock_unpoisoned();
            let previous = current.effective_worker_count();
            *current = saved.clone();
            previous
        };
        let target = saved.effective_worker_count();
        if target != previous_count {
            self.adjust_worker_count(target as usize);
        }
        Ok(saved)
    }

    fn adjust_worker_count(&self, target: usize) {
        if let AdjustOutcome::Spawn(n) = self.inner.scheduler.adjust_worker_count(target) {
            let context = self.worker_context();
            for _ in 0..n {
                worker::spawn_worker(self.inner.scheduler.clone(), context.clone());
            }
        }
    }

    /// `add(url)` (§4.10). `prefer_playlist` must already reflect the
    /// client's answer to the ambiguous-URL prompt (§7 "Ambiguous input");
    /// callers should check `is_ambiguous` first and ask before calling.
    pub fn add(&self, url: &str, settings: Option<Settings>, prefer_playlist: bool, force: bool) -> AddOutcome {
        let (canonical, is_playlist) = super::url::classify(url, prefer_playlist);
        if canonical.is_empty() {
            return AddOutcome::Invalid;
        }

        let settings = settings.unwrap_or_else(|| self.settings());

        if is_playlist {
            return self.add_playlist(canonical, settings);
        }

        let video_id = super::url::extract_video_id(&canonical).unwrap_or_default();
        if !video_id.is_empty() {
            if force {
                let _ = self.inner.history.remove(&video_id, settings.format);
            } else {
                let tasks = self.inner.tasks.lock_unpoisoned().clone();
                let report = duplicate::check(&video_id, 0, &tasks, settings.format, &self.inner.history);
                if report.is_duplicate {
                    return AddOutcome::Duplicate(DuplicateCheckOutcome {
                        explanation: report.explanation,
                        matching_task_id: report.matching_task_id,
                    });
                }
            }
        }

        let task_id = self.allocate_task_id();
        let mut task = Task::new(task_id, canonical.clone(), TaskKind::SingleVideo, settings.clone());
        task.video_id = Some(video_id);
        self.inner.tasks.lock_unpoisoned().push(task);
        self.inner.scheduler.enqueue(PRIORITY_FRESH, Some(task_id), canonical, settings, Metadata::default());
        AddOutcome::Added { task_id }
    }

    /// `is_ambiguous(url)`: true when the client must be asked single-video
    /// vs playlist before `add` can proceed (§7 "Ambiguous input").
    pub fn is_ambiguous(&self, url: &str) -> bool {
        super::url::has_video_and_list(url)
    }

    fn add_playlist(&self, canonical_url: String, settings: Settings) -> AddOutcome {
        let task_id = self.allocate_task_id();
        let task = Task::new(task_id, canonical_url.clone(), TaskKind::Standalone, settings.clone());
        self.inner.tasks.lock_unpoisoned().push(task);

        let events = self.live_event_sink();
        let scheduler = self.inner.scheduler.clone();
        let downloader = self.inner.downloader.clone();
        let history = self.inner.history.clone();
        let inner_for_ids = self.inner.clone();
        let inner_for_register = self.inner.clone();

        playlist::spawn_expansion(
            downloader,
            scheduler,
            events,
            history,
            task_id,
            canonical_url,
            settings,
            move || inner_for_ids.next_task_id.fetch_add(1, Ordering::SeqCst),
            move |child_id, url, settings| {
                let mut task = Task::new(child_id, url.to_string(), TaskKind::PlaylistChild, settings.clone());
                task.parent_playlist_id = Some(task_id);
                inner_for_register.tasks.lock_unpoisoned().push(task);
            },
        );
        AddOutcome::Added { task_id }
    }

    fn allocate_task_id(&self) -> u64 {
        self.inner.next_task_id.fetch_add(1, Ordering::SeqCst)
    }

    /// `pause(id)` (§4.10).
    pub fn pause(&self, task_id: u64) {
        {
            let mut tasks = self.inner.tasks.lock_unpoisoned();
            if let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) {
                task.status = TaskStatus::Paused;
            }
        }
        self.inner.scheduler.pause_task(task_id);
    }

    /// `resume(id)` (§4.10): re-enqueues at priority 1 with `is_resume=true`.
    pub fn resume(&self, task_id: u64) {
        self.inner.scheduler.resume_task(task_id);
        let task = {
            let mut tasks = self.inner.tasks.lock_unpoisoned();
            let Some(task) = tasks.iter_mut().find(|t| t.id == task_id) else { return };
            task.status = TaskStatus::Waiting;
            task.is_resume = true;
            task.clone()
        };
        self.inner.scheduler.enqueue(PRIORITY_RESUME, Some(task_id), task.url, task.settings, task.metadata);
    }

    /// `retry(id)` (§4.10): duplicate-check with consent-clears-history,
    /// then remove and re-add via the normal `add` path.
    pub fn retry(&self, task_id: u64, force: bool) -> AddOutcome {
        let Some(task) = self.inner.tasks.lock_unpoisoned().iter().find(|t| t.id == task_id).cloned() else {
            return AddOutcome::Invalid;
        };
        self.remove(task_id);
        self.add(&task.url, Some(task.settings), false, force)
    }

    /// `remove(id)` (§4.10).
    pub fn remove(&self, task_id: u64) {
        self.inner.tasks.lock_unpoisoned().retain(|t| t.id != task_id);
    }

    /// `delete_file(id)` (§4.10): deletes the output path if present, then
    /// removes the task.
    pub fn delete_file(&self, task_id: u64) -> anyhow::Result<()> {
        let output_path = self.inner.tasks.lock_unpoisoned().iter().find(|t| t.id == task_id).and_then(|t| t.output_path.clone());
        if let Some(path) = output_path {
            if Path::new(&path).exists() {
                std::fs::remove_file(&path)?;
            }
        }
        self.remove(task_id);
        Ok(())
    }

    /// `toggle_global` (§4.10): flips the run-gate; on resume, re-enqueues
    /// every Paused task that is not individually per-task-paused.
    pub fn toggle_global(&self) {
        if self.inner.scheduler.is_globally_paused() {
            self.inner.scheduler.resume_all();
            let resumable: Vec<Task> = self
                .inner
                .tasks
                .lock_unpoisoned()
                .iter()
                .filter(|t| t.status == TaskStatus::Paused && !self.inner.scheduler.is_task_paused(t.id))
                .cloned()
                .collect();
            for task in resumable {
                {
                    let mut tasks = self.inner.tasks.lock_unpoisoned();
                    if let Some(t) = tasks.iter_mut().find(|t| t.id == task.id) {
                        t.status = TaskStatus::Waiting;
                    }
                }
                self.inner.scheduler.enqueue(PRIORITY_RESUME, Some(task.id), task.url, task.settings, task.metadata);
            }
        } else {
            // §4.9 pause ordering guarantee: mark actively-downloading tasks
            // Paused *before* closing the run-gate, so a PAUSED_BY_USER
            // event racing in afterward cannot re-categorize them.
            {
                let mut tasks = self.inner.tasks.lock_unpoisoned();
                for task in tasks.iter_mut() {
                    if task.status == TaskStatus::Downloading {
                        task.status = TaskStatus::Paused;
                    }
                }
            }
            self.inner.scheduler.pause_all();
        }
    }

    /// `shutdown` (§4.10): persists the task list, then stops the scheduler.
    pub fn shutdown(&self) {
        let tasks = self.inner.tasks.lock_unpoisoned().clone();
        if let Err(err) = self.inner.task_store.save(&tasks) {
            crate::debug_eprintln!("failed to persist tasks on shutdown: {err:#}");
        }
        self.inner.scheduler.shutdown();
    }

    pub fn history(&self) -> Arc<HistoryStore> {
        self.inner.history.clone()
    }

    pub fn binary_manager(&self) -> Arc<BinaryManager> {
        self.inner.binary_manager.clone()
    }
}
