//! Duplicate Checker (C6). Cross-checks a candidate download against the
//! history store and the live task list. A task with an empty `video_id`
//! always bypasses this check (resolved Open Question, SPEC_FULL.md §4.6).

use super::domain::{OutputFormat, Task};
use super::history::HistoryStore;

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateReport {
    pub is_duplicate: bool,
    pub explanation: String,
    pub matching_task_id: Option<u64>,
}

impl DuplicateReport {
    fn none() -> Self {
        DuplicateReport { is_duplicate: false, explanation: String::new(), matching_task_id: None }
    }
}

/// `check(video_id, requester_task_id, tasks, format) -> DuplicateReport` (§4.6).
pub fn check(video_id: &str, requester_task_id: u64, tasks: &[Task], format: OutputFormat, history: &HistoryStore) -> DuplicateReport {
    if video_id.is_empty() {
        return DuplicateReport::none();
    }

    if history.is_downloaded(video_id, format) {
        return DuplicateReport {
            is_duplicate: true,
            explanation: format!(
                "A download for this video already exists in history as {}.",
                format.extension()
            ),
            matching_task_id: None,
        };
    }

    let conflicting = tasks.iter().find(|task| {
        task.id != requester_task_id
            && task.video_id.as_deref() == Some(video_id)
            && task.is_active()
            && task.settings.format == format
    });

    if let Some(task) = conflicting {
        return DuplicateReport {
            is_duplicate: true,
            explanation: format!(
                "This video is already queued or downloading as {}.",
                format.extension()
            ),
            matching_task_id: Some(task.id),
        };
    }

    DuplicateReport::none()
}
