//! Parsing of the external downloader's textual progress protocol (§4.2.1,
//! §4.2.3). Unparsable lines are a no-op, never an error (§9: "must never
//! abort on a single unknown line").

use once_cell::sync::Lazy;
use regex::Regex;

/// `[download] Destination: <path>` — marks the start of a new fragment.
static DESTINATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[download\]\s+Destination:\s+(?P<path>.+)$").unwrap());

/// `[download]  12.3% of   45.67MiB at    1.23MiB/s ETA 00:10`
static PROGRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\[download\]\s+(?P<percent>\d+(?:\.\d+)?)%\s+of\s+~?\s*(?P<total>\d+(?:\.\d+)?)(?P<total_unit>[KMGT]i?B)(?:\s+at\s+(?:(?P<speed>\d+(?:\.\d+)?)(?P<speed_unit>[KMGT]i?B)/s|Unknown\s+speed))?(?:\s+ETA\s+(?P<eta>[\d:]+|Unknown))?",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Destination { path: String },
    Downloading { percent: f64, total_bytes: u64, downloaded_bytes: u64, speed_bytes_per_second: Option<f64>, eta_seconds: Option<u64> },
    Unrecognized,
}

/// Converts a unit-suffixed byte quantity: `KiB/MiB/GiB/TiB` are 1024-base,
/// `KB/MB/GB/TB` are 1000-base (§4.2.1).
fn unit_multiplier(unit: &str) -> f64 {
    match unit {
        "KiB" => 1024.0,
        "MiB" => 1024.0f64.powi(2),
        "GiB" => 1024.0f64.powi(3),
        "TiB" => 1024.0f64.powi(4),
        "KB" => 1000.0,
        "MB" => 1000.0f64.powi(2),
        "GB" => 1000.0f64.powi(3),
        "TB" => 1000.0f64.powi(4),
        "B" => 1.0,
        _ => 1.0,
    }
}

/// `H:M:S` (colon-separated, variable width) -> total seconds. Returns
/// `None` for "Unknown" or anything unparsable.
fn parse_eta_to_seconds(raw: &str) -> Option<u64> {
    if raw.eq_ignore_ascii_case("unknown") {
        return None;
    }
    let parts: Vec<&str> = raw.split(':').collect();
    let mut seconds: u64 = 0;
    for part in parts {
        let n: u64 = part.parse().ok()?;
        seconds = seconds * 60 + n;
    }
    Some(seconds)
}

/// Parses one line of the downloader's stdout. Case-sensitive on the
/// `[download]` tag per §4.2.1; whitespace-tolerant around it.
pub fn parse_line(line: &str) -> ParsedLine {
    let line = line.trim_end();

    if let Some(caps) = DESTINATION_RE.captures(line) {
        return ParsedLine::Destination { path: caps["path"].trim().to_string() };
    }

    if let Some(caps) = PROGRESS_RE.captures(line) {
        let percent: f64 = caps["percent"].parse().unwrap_or(0.0);
        let percent = percent.clamp(0.0, 100.0);

        let total_value: f64 = caps["total"].parse().unwrap_or(0.0);
        let total_bytes = (total_value * unit_multiplier(&caps["total_unit"])).round() as u64;
        // downloaded = floor(total * percent / 100), never exceeding total.
        let downloaded_bytes = ((total_bytes as f64) * percent / 100.0).floor() as u64;

        let speed_bytes_per_second = match (caps.name("speed"), caps.name("speed_unit")) {
            (Some(speed), Some(unit)) => {
                let value: f64 = speed.as_str().parse().unwrap_or(0.0);
                Some(value * unit_multiplier(unit.as_str()))
            }
            _ => None,
        };

        let eta_seconds = caps.name("eta").and_then(|m| parse_eta_to_seconds(m.as_str()));

        return ParsedLine::Downloading {
            percent,
            total_bytes,
            downloaded_bytes,
            speed_bytes_per_second,
            eta_seconds,
        };
    }

    ParsedLine::Unrecognized
}

/// Computes a clamped percentage from cumulative downloaded/total bytes,
/// never exceeding 100 even when a plan estimate undershoots reality
/// (§4.2.3).
pub fn compute_progress_percent(downloaded: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((downloaded as f64 / total as f64) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_destination_line() {
        match parse_line("[download] Destination: /tmp/video.f137.mp4") {
            ParsedLine::Destination { path } => assert_eq!(path, "/tmp/video.f137.mp4"),
            other => panic!("expected Destination, got {other:?}"),
        }
    }

    #[test]
    fn parses_progress_line_with_speed_and_eta() {
        match parse_line("[download]  50.0% of   10.00MiB at    1.00MiB/s ETA 00:05") {
            ParsedLine::Downloading { percent, total_bytes, downloaded_bytes, speed_bytes_per_second, eta_seconds } => {
                assert_eq!(percent, 50.0);
                assert_eq!(total_bytes, 10 * 1024 * 1024);
                assert_eq!(downloaded_bytes, 5 * 1024 * 1024);
                assert_eq!(speed_bytes_per_second, Some(1024.0 * 1024.0));
                assert_eq!(eta_seconds, Some(5));
            }
            other => panic!("expected Downloading, got {other:?}"),
        }
    }

    #[test]
    fn parses_progress_line_without_speed_or_eta() {
        match parse_line("[download]  12.3% of 1.00KB") {
            ParsedLine::Downloading { percent, speed_bytes_per_second, eta_seconds, .. } => {
                assert_eq!(percent, 12.3);
                assert_eq!(speed_bytes_per_second, None);
                assert_eq!(eta_seconds, None);
            }
            other => panic!("expected Downloading, got {other:?}"),
        }
    }

    #[test]
    fn decimal_base_units_use_1000() {
        match parse_line("[download]  100.0% of 1.00MB") {
            ParsedLine::Downloading { total_bytes, .. } => assert_eq!(total_bytes, 1_000_000),
            other => panic!("expected Downloading, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_lines_are_a_no_op() {
        assert_eq!(parse_line("[generic] some unrelated log line"), ParsedLine::Unrecognized);
        assert_eq!(parse_line(""), ParsedLine::Unrecognized);
    }

    #[test]
    fn percent_never_exceeds_100_even_if_source_is_malformed() {
        match parse_line("[download]  150.0% of 1.00MiB") {
            ParsedLine::Downloading { percent, .. } => assert_eq!(percent, 100.0),
            other => panic!("expected Downloading, got {other:?}"),
        }
    }

    #[test]
    fn compute_progress_percent_is_clamped() {
        assert_eq!(compute_progress_percent(0, 0), 0.0);
        assert_eq!(compute_progress_percent(200, 100), 100.0);
        assert_eq!(compute_progress_percent(50, 100), 50.0);
    }
}
