//! Tauri command handlers organized by functional domain.
//!
//! - `queue`: task lifecycle intents (add/pause/resume/retry/remove) plus
//!   the queue-state hydration query
//! - `settings`: the Settings Value (C12) read/write commands
//! - `tools`: Binary Manager (C7) status/update commands and the History
//!   Store (C4) read-only query

pub mod queue;
pub mod settings;
pub mod tools;
