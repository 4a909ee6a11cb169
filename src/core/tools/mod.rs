//! Binary Manager (C7): presence, versioning and installation of the two
//! executables (`yt-dlp`, `ffmpeg`) the rest of the core shells out to.

pub mod download;
pub mod types;

pub use download::BinaryManager;
pub use types::{BinaryKind, ToolStatus};
