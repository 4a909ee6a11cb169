//! Subprocess supervision for the external downloader (§4.2.1, §4.2.4).
//!
//! The progress hook is not exception-driven (§9 design note): cooperative
//! cancellation is a dedicated sentinel value (`ControlSignal`) returned by
//! the caller-supplied hook, propagated up through this module's return
//! value rather than by unwinding, keeping this module independent of
//! whatever threading model the caller uses.

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::progress::{parse_line, ParsedLine};

/// Sentinel returned by the download outcome when the progress hook asked
/// to stop (§9: "preserved as a dedicated sentinel return value").
pub const PAUSED_BY_USER: &str = "PAUSED_BY_USER";

/// What the progress hook wants the supervisor to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Continue,
    /// Cooperative per-task/global pause — maps to `PAUSED_BY_USER` (§4.8 step 7).
    Pause,
    /// Process-wide shutdown — maps to a plain failure, not PAUSED_BY_USER.
    Stop,
}

/// One line of the downloader's stdout, translated for the caller. The
/// caller (the Worker, C8) does its own two-bucket (video/audio) combining
/// on top of this per-line stream (§4.8 step 7); this module only
/// translates text into structured values (§4.2.1).
#[derive(Debug, Clone, PartialEq)]
pub enum DownloaderEvent {
    Destination { path: String },
    Progress {
        percent: f64,
        total_bytes: u64,
        downloaded_bytes: u64,
        speed_bytes_per_second: Option<f64>,
        eta_seconds: Option<u64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Success,
    /// `(false, "exit code N: <stderr tail>")` (§4.2.1).
    Failed(String),
    /// `(false, PAUSED_BY_USER)` (§4.2.1, §9).
    Paused,
}

/// Runs the downloader to completion, invoking `on_event` for every parsed
/// progress line and `poll` before each line is read so the caller can
/// request pause/stop. Unparsable lines are silently skipped (§9).
pub fn run_download<F, P>(
    executable: &str,
    args: &[String],
    mut on_event: F,
    mut poll: P,
) -> anyhow::Result<DownloadOutcome>
where
    F: FnMut(DownloaderEvent),
    P: FnMut() -> ControlSignal,
{
    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let stderr_tail = spawn_stderr_drain(&mut child);
    let stdout = child.stdout.take().expect("stdout was piped");
    let reader = BufReader::new(stdout);

    let mut control = ControlSignal::Continue;
    for line in reader.lines() {
        let Ok(line) = line else { break };

        match poll() {
            ControlSignal::Continue => {}
            signal => {
                control = signal;
                break;
            }
        }

        match parse_line(&line) {
            ParsedLine::Destination { path } => on_event(DownloaderEvent::Destination { path }),
            ParsedLine::Downloading { percent, total_bytes, downloaded_bytes, speed_bytes_per_second, eta_seconds } => {
                on_event(DownloaderEvent::Progress {
                    percent,
                    total_bytes,
                    downloaded_bytes,
                    speed_bytes_per_second,
                    eta_seconds,
                });
            }
            ParsedLine::Unrecognized => {}
        }
    }

    if control != ControlSignal::Continue {
        let _ = child.kill();
        let _ = child.wait();
        return Ok(match control {
            ControlSignal::Pause => DownloadOutcome::Paused,
            _ => DownloadOutcome::Failed("stopped".to_string()),
        });
    }

    let status = child.wait()?;
    let tail = stderr_tail.recv().unwrap_or_default();
    if status.success() {
        Ok(DownloadOutcome::Success)
    } else {
        let code = status.code().unwrap_or(-1);
        Ok(DownloadOutcome::Failed(format!("exit code {code}: {tail}")))
    }
}

/// Drains stderr on a background thread into a bounded tail so a chatty
/// child cannot deadlock the stdout read loop on a full pipe buffer
/// (§4.2.4). Returns a channel that yields the tail once the child exits.
fn spawn_stderr_drain(child: &mut Child) -> mpsc::Receiver<String> {
    const MAX_TAIL_BYTES: usize = 8192;
    let stderr = child.stderr.take().expect("stderr was piped");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let reader = BufReader::new(stderr);
        let mut tail = String::new();
        for line in reader.lines().map_while(Result::ok) {
            tail.push_str(&line);
            tail.push('\n');
            if tail.len() > MAX_TAIL_BYTES {
                let excess = tail.len() - MAX_TAIL_BYTES;
                tail.drain(0..excess);
            }
        }
        let _ = tx.send(tail.trim_end().to_string());
    });
    rx
}

/// Runs the downloader in JSON-dump info mode, collecting all stdout lines
/// within a hard timeout (§4.2.2, default 30s). Returns `None` on timeout
/// or nonzero exit.
pub fn run_extract_info(executable: &str, args: &[String], timeout: Duration) -> Option<Vec<String>> {
    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .ok()?;

    let stdout = child.stdout.take()?;
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let reader = BufReader::new(stdout);
        let lines: Vec<String> = reader.lines().map_while(Result::ok).filter(|l| !l.trim().is_empty()).collect();
        let _ = tx.send(lines);
    });

    match rx.recv_timeout(timeout) {
        Ok(lines) => {
            let status = child.wait().ok()?;
            if status.success() { Some(lines) } else { None }
        }
        Err(_) => {
            let _ = child.kill();
            let _ = child.wait();
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_exit_with_no_cancellation_yields_success() {
        let outcome = run_download(
            "sh",
            &["-c".to_string(), "echo '[download]  100.0% of 1.00KiB'".to_string()],
            |_| {},
            || ControlSignal::Continue,
        )
        .unwrap();
        assert_eq!(outcome, DownloadOutcome::Success);
    }

    #[test]
    fn nonzero_exit_yields_failed_with_stderr_tail() {
        let outcome = run_download(
            "sh",
            &["-c".to_string(), "echo oops 1>&2; exit 3".to_string()],
            |_| {},
            || ControlSignal::Continue,
        )
        .unwrap();
        match outcome {
            DownloadOutcome::Failed(message) => {
                assert!(message.contains("exit code 3"));
                assert!(message.contains("oops"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn pause_signal_yields_paused_sentinel_not_failure() {
        let outcome = run_download(
            "sh",
            &["-c".to_string(), "for i in 1 2 3 4 5; do echo '[download] Destination: x'; sleep 0.05; done".to_string()],
            |_| {},
            || ControlSignal::Pause,
        )
        .unwrap();
        assert_eq!(outcome, DownloadOutcome::Paused);
    }

    #[test]
    fn extract_info_collects_stdout_lines() {
        let lines = run_extract_info(
            "sh",
            &["-c".to_string(), "echo '{\"a\":1}'".to_string()],
            Duration::from_secs(2),
        )
        .unwrap();
        assert_eq!(lines, vec!["{\"a\":1}".to_string()]);
    }

    #[test]
    fn extract_info_times_out_on_hanging_process() {
        let lines = run_extract_info(
            "sh",
            &["-c".to_string(), "sleep 5".to_string()],
            Duration::from_millis(50),
        );
        assert_eq!(lines, None);
    }
}
