//! URL Classifier (C1). Decides whether an input URL names a single video,
//! a playlist, or a "shorts" clip, and produces the canonical URL the rest
//! of the pipeline operates on. Never raises on malformed input — an
//! unparsable URL yields the documented sentinel pair instead (§4.1).

use url::Url;

const PLAYLIST_URL_PREFIX: &str = "https://www.youtube.com/playlist?list=";
const SHORTFORM_HOST_SUFFIX: &str = "youtu.be";

/// `classify(url, prefer_playlist) -> (canonical_url, is_playlist)`.
pub fn classify(url: &str, prefer_playlist: bool) -> (String, bool) {
    let Ok(parsed) = Url::parse(url) else {
        return (String::new(), false);
    };

    let is_shortform = parsed
        .host_str()
        .is_some_and(|h| h == SHORTFORM_HOST_SUFFIX || h.ends_with(&format!(".{SHORTFORM_HOST_SUFFIX}")));
    let is_shorts_path = parsed.path().starts_with("/shorts/");

    // A /shorts/ path is always forced to single-video, regardless of any
    // list parameter present alongside it (§4.1).
    if is_shorts_path {
        return (strip_list_param(&parsed), false);
    }

    let video_id = parsed.query_pairs().find(|(k, _)| k == "v").map(|(_, v)| v.to_string());
    let list_id = parsed.query_pairs().find(|(k, _)| k == "list").map(|(_, v)| v.to_string());

    match (video_id, list_id, is_shortform) {
        // Pure playlist URL (list without v): passes through unchanged.
        (None, Some(_), _) => (url.to_string(), true),
        // Ambiguous: both v and list present; prefer_playlist decides.
        (Some(_), Some(list), false) => {
            if prefer_playlist {
                (format!("{PLAYLIST_URL_PREFIX}{list}"), true)
            } else {
                (strip_list_param(&parsed), false)
            }
        }
        // Shortform host (youtu.be/<id>): single video, canonical path form.
        (_, None, true) => {
            let id = parsed.path().trim_matches('/');
            if id.is_empty() {
                (String::new(), false)
            } else {
                (format!("https://www.youtube.com/watch?v={id}"), false)
            }
        }
        // Plain watch URL with only v.
        (Some(_), None, false) => (strip_list_param(&parsed), false),
        (None, None, false) => (String::new(), false),
    }
}

/// `has_video_and_list(url) -> bool`. True only when the URL is genuinely
/// ambiguous between single-video and playlist interpretations.
pub fn has_video_and_list(url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    if parsed.path().starts_with("/shorts/") {
        return false;
    }
    let has_v = parsed.query_pairs().any(|(k, _)| k == "v");
    let has_list = parsed.query_pairs().any(|(k, _)| k == "list");
    has_v && has_list
}

/// `extract_video_id(url) -> Option<String>`. Reads `v` or the path
/// component of a shortform URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    if let Some((_, v)) = parsed.query_pairs().find(|(k, _)| k == "v") {
        return Some(v.to_string());
    }
    let host = parsed.host_str()?;
    if host == SHORTFORM_HOST_SUFFIX || host.ends_with(&format!(".{SHORTFORM_HOST_SUFFIX}")) {
        let id = parsed.path().trim_matches('/');
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    None
}

/// Re-serializes `url` with any `list` query parameter removed, leaving
/// every other parameter (and its original order) untouched.
fn strip_list_param(parsed: &Url) -> String {
    let mut out = parsed.clone();
    let retained: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| k != "list")
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    if retained.is_empty() {
        out.set_query(None);
    } else {
        let mut pairs = out.query_pairs_mut();
        pairs.clear();
        for (k, v) in &retained {
            pairs.append_pair(k, v);
        }
        drop(pairs);
    }
    out.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_watch_url_is_single_video() {
        let (canonical, is_playlist) = classify("https://www.youtube.com/watch?v=ABC123", false);
        assert_eq!(canonical, "https://www.youtube.com/watch?v=ABC123");
        assert!(!is_playlist);
    }

    #[test]
    fn ambiguous_url_prefers_video_when_not_playlist() {
        let (canonical, is_playlist) =
            classify("https://www.youtube.com/watch?v=ABC&list=PL1", false);
        assert_eq!(canonical, "https://www.youtube.com/watch?v=ABC");
        assert!(!is_playlist);
    }

    #[test]
    fn ambiguous_url_builds_canonical_playlist_when_preferred() {
        let (canonical, is_playlist) =
            classify("https://www.youtube.com/watch?v=ABC&list=PL1", true);
        assert_eq!(canonical, "https://www.youtube.com/playlist?list=PL1");
        assert!(is_playlist);
    }

    #[test]
    fn pure_playlist_url_passes_through() {
        let (canonical, is_playlist) = classify("https://www.youtube.com/playlist?list=PL1", false);
        assert_eq!(canonical, "https://www.youtube.com/playlist?list=PL1");
        assert!(is_playlist);
    }

    #[test]
    fn shortform_host_expands_to_canonical_watch_url() {
        let (canonical, is_playlist) = classify("https://youtu.be/ABC123", false);
        assert_eq!(canonical, "https://www.youtube.com/watch?v=ABC123");
        assert!(!is_playlist);
    }

    #[test]
    fn shorts_path_forces_single_video_even_with_list() {
        let (canonical, is_playlist) =
            classify("https://www.youtube.com/shorts/ABC123?list=PL1", true);
        assert!(!is_playlist);
        assert!(!canonical.contains("list="));
    }

    #[test]
    fn invalid_url_returns_sentinel() {
        assert_eq!(classify("not a url", false), (String::new(), false));
        assert_eq!(classify("", true), (String::new(), false));
    }

    #[test]
    fn has_video_and_list_detects_ambiguity_only() {
        assert!(has_video_and_list("https://www.youtube.com/watch?v=ABC&list=PL1"));
        assert!(!has_video_and_list("https://www.youtube.com/watch?v=ABC"));
        assert!(!has_video_and_list("https://www.youtube.com/playlist?list=PL1"));
        assert!(!has_video_and_list("not a url"));
    }

    #[test]
    fn extract_video_id_reads_v_or_shortform_path() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=ABC123"),
            Some("ABC123".to_string())
        );
        assert_eq!(extract_video_id("https://youtu.be/XYZ"), Some("XYZ".to_string()));
        assert_eq!(extract_video_id("https://www.youtube.com/playlist?list=PL1"), None);
        assert_eq!(extract_video_id("garbage"), None);
    }
}
