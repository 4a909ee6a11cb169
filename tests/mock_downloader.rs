//! Scripted stand-in for the external downloader binary. Compiled as a
//! `harness = false` test binary (see `Cargo.toml`): run bare by `cargo
//! test` it just exits 0, but other integration tests spawn the compiled
//! executable directly (via `env!("CARGO_BIN_EXE_mock_downloader")`) to
//! drive `DownloaderWrapper` against a real child process instead of
//! against `sh -c` one-liners.
//!
//! Scripted entirely through environment variables so no argv parsing is
//! needed to stay in sync with `core::downloader::args`:
//!
//! - `MOCK_DL_LINES`: stdout lines to emit, separated by `\x1e`.
//! - `MOCK_DL_DELAY_MS`: delay before each line (default 0).
//! - `MOCK_DL_EXIT_CODE`: process exit code (default 0).
//! - `MOCK_DL_STDERR`: a single line written to stderr before exiting.
//! - `MOCK_DL_SLEEP_MS`: if set, sleep this long before doing anything else
//!   (used to exercise `extract_info`'s timeout).

use std::io::Write;
use std::{env, process, thread, time::Duration};

fn main() {
    if let Ok(raw) = env::var("MOCK_DL_SLEEP_MS") {
        if let Ok(ms) = raw.parse::<u64>() {
            thread::sleep(Duration::from_millis(ms));
        }
    }

    let delay_ms: u64 = env::var("MOCK_DL_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(0);

    if let Ok(lines) = env::var("MOCK_DL_LINES") {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        for line in lines.split('\u{1e}') {
            if delay_ms > 0 {
                thread::sleep(Duration::from_millis(delay_ms));
            }
            let _ = writeln!(handle, "{line}");
            let _ = handle.flush();
        }
    }

    if let Ok(stderr_line) = env::var("MOCK_DL_STDERR") {
        eprintln!("{stderr_line}");
    }

    let exit_code: i32 = env::var("MOCK_DL_EXIT_CODE").ok().and_then(|v| v.parse().ok()).unwrap_or(0);
    process::exit(exit_code);
}
