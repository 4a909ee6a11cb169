//! Task Store (C5). Durable ordered sequence of task records, loaded once
//! at startup and saved on controlled shutdown.

use std::path::PathBuf;

use super::domain::{Task, TaskStatus};
use super::json_io::{read_json_file, write_json_file};

pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TaskStore { path: path.into() }
    }

    /// `load() -> tasks`, missing-file tolerant (§4.5).
    pub fn load(&self) -> anyhow::Result<Vec<Task>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_json_file(&self.path)
    }

    /// `save(tasks)`: any task in Downloading or Waiting at save time is
    /// normalized to Paused, so the next session does not race back into
    /// downloading without user acknowledgement (§4.5).
    pub fn save(&self, tasks: &[Task]) -> anyhow::Result<()> {
        let normalized: Vec<Task> = tasks
            .iter()
            .cloned()
            .map(|mut task| {
                if matches!(task.status, TaskStatus::Downloading | TaskStatus::Waiting) {
                    task.status = TaskStatus::Paused;
                }
                task
            })
            .collect();
        write_json_file(&self.path, &normalized)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::core::domain::{Settings, TaskKind};

    #[test]
    fn load_on_missing_file_returns_empty() {
        let dir = tempdir().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));
        assert_eq!(store.load().unwrap(), Vec::new());
    }

    #[test]
    fn save_normalizes_downloading_and_waiting_to_paused() {
        let dir = tempdir().unwrap();
        let store = TaskStore::new(dir.path().join("tasks.json"));

        let mut downloading = Task::new(1, "u1".into(), TaskKind::SingleVideo, Settings::default());
        downloading.status = TaskStatus::Downloading;
        let mut waiting = Task::new(2, "u2".into(), TaskKind::SingleVideo, Settings::default());
        waiting.status = TaskStatus::Waiting;
        let mut finished = Task::new(3, "u3".into(), TaskKind::SingleVideo, Settings::default());
        finished.status = TaskStatus::Finished;

        store.save(&[downloading, waiting, finished]).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded[0].status, TaskStatus::Paused);
        assert_eq!(loaded[1].status, TaskStatus::Paused);
        assert_eq!(loaded[2].status, TaskStatus::Finished);
    }
}
