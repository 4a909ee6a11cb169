//! Metadata Fetcher (C3). Calls the Downloader Wrapper in extract-info mode
//! and lowers its dynamically-shaped JSON into the typed `Metadata` record
//! (§4.3), applying the documented sentinel fallbacks.

use serde_json::Value;

use super::domain::Metadata;
use super::downloader::DownloaderWrapper;

/// Fetches metadata for a single video or a playlist. `noplaylist` should
/// be true for single-video fetches so a bare playlist member URL does not
/// accidentally expand.
pub fn fetch_metadata(wrapper: &DownloaderWrapper, url: &str, format: Option<&str>) -> Option<Metadata> {
    let (value, ok) = wrapper.extract_info(url, false, true, format);
    if !ok {
        return None;
    }
    value.map(|v| lower_info_json(&v))
}

/// Fetches only `entries[].id` for playlist expansion (C11), using
/// `extract_flat` so the downloader does not resolve each entry's full
/// metadata (fast, matches §4.11's "background execution context" intent).
pub fn fetch_playlist_entry_ids(wrapper: &DownloaderWrapper, playlist_url: &str) -> Option<Vec<String>> {
    let (value, ok) = wrapper.extract_info(playlist_url, true, false, None);
    if !ok {
        return None;
    }
    let value = value?;
    let entries = value.get("entries")?.as_array()?;
    Some(
        entries
            .iter()
            .filter_map(|entry| entry.get("id").and_then(Value::as_str).map(str::to_string))
            .collect(),
    )
}

fn lower_info_json(value: &Value) -> Metadata {
    let is_playlist = value.get("_type").and_then(Value::as_str) == Some("playlist");

    if is_playlist {
        let entry_count = value.get("entries").and_then(Value::as_array).map(Vec::len);
        return Metadata {
            title: value.get("title").and_then(Value::as_str).map(str::to_string),
            uploader: value.get("uploader").and_then(Value::as_str).map(str::to_string),
            entry_count,
            ..Metadata::default()
        };
    }

    let title = value.get("title").and_then(Value::as_str).map(str::to_string);
    let uploader = value
        .get("uploader")
        .and_then(Value::as_str)
        .or_else(|| value.get("channel").and_then(Value::as_str))
        .map(str::to_string);
    let duration_seconds = value.get("duration").and_then(Value::as_f64);
    let thumbnail_url = value.get("thumbnail").and_then(Value::as_str).map(str::to_string);
    let video_id = value.get("id").and_then(Value::as_str).map(str::to_string);
    let webpage_url = value.get("webpage_url").and_then(Value::as_str).map(str::to_string);

    let (estimated_video_bytes, estimated_audio_bytes) = estimate_fragment_sizes(value);

    Metadata {
        title,
        uploader,
        duration_seconds,
        thumbnail_url,
        video_id,
        webpage_url,
        estimated_video_bytes,
        estimated_audio_bytes,
        entry_count: None,
    }
}

/// Estimated video/audio byte sizes, preferring the chosen format spec's
/// `requested_formats` and falling back to the maximum over all listed
/// formats (§4.3).
fn estimate_fragment_sizes(value: &Value) -> (Option<u64>, Option<u64>) {
    if let Some(requested) = value.get("requested_formats").and_then(Value::as_array) {
        let mut video_bytes = None;
        let mut audio_bytes = None;
        for format in requested {
            let size = format_filesize(format);
            let vcodec_present = format.get("vcodec").and_then(Value::as_str).is_some_and(|c| c != "none");
            if vcodec_present {
                video_bytes = size.or(video_bytes);
            } else {
                audio_bytes = size.or(audio_bytes);
            }
        }
        if video_bytes.is_some() || audio_bytes.is_some() {
            return (video_bytes, audio_bytes);
        }
    }

    if let Some(formats) = value.get("formats").and_then(Value::as_array) {
        let max_size = formats.iter().filter_map(format_filesize).max();
        return (max_size, None);
    }

    (None, None)
}

fn format_filesize(format: &Value) -> Option<u64> {
    format
        .get("filesize")
        .or_else(|| format.get("filesize_approx"))
        .and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_single_video_info_with_requested_formats() {
        let value = serde_json::json!({
            "title": "A Video",
            "uploader": "Someone",
            "duration": 120.5,
            "thumbnail": "https://example.com/thumb.jpg",
            "id": "ABC123",
            "webpage_url": "https://www.youtube.com/watch?v=ABC123",
            "requested_formats": [
                { "vcodec": "avc1", "filesize": 1000 },
                { "vcodec": "none", "acodec": "mp4a", "filesize": 200 },
            ],
        });
        let metadata = lower_info_json(&value);
        assert_eq!(metadata.title.as_deref(), Some("A Video"));
        assert_eq!(metadata.video_id.as_deref(), Some("ABC123"));
        assert_eq!(metadata.estimated_video_bytes, Some(1000));
        assert_eq!(metadata.estimated_audio_bytes, Some(200));
    }

    #[test]
    fn falls_back_to_max_of_formats_when_no_requested_formats() {
        let value = serde_json::json!({
            "formats": [
                { "filesize": 500 },
                { "filesize_approx": 900 },
                { "filesize": 300 },
            ],
        });
        let metadata = lower_info_json(&value);
        assert_eq!(metadata.estimated_video_bytes, Some(900));
        assert_eq!(metadata.estimated_audio_bytes, None);
    }

    #[test]
    fn uploader_falls_back_to_channel() {
        let value = serde_json::json!({ "channel": "Some Channel" });
        let metadata = lower_info_json(&value);
        assert_eq!(metadata.uploader.as_deref(), Some("Some Channel"));
    }

    #[test]
    fn playlist_info_reports_entry_count() {
        let value = serde_json::json!({
            "_type": "playlist",
            "title": "My Playlist",
            "entries": [ {"id": "a"}, {"id": "b"}, {"id": "c"} ],
        });
        let metadata = lower_info_json(&value);
        assert_eq!(metadata.entry_count, Some(3));
        assert_eq!(metadata.display_playlist_title(), "My Playlist");
    }
}
