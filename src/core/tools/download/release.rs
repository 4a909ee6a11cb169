//! Upstream release feed parsing (§4.7, §6). Both binaries are published as
//! GitHub Releases; the downloader tags real versions while the muxer is
//! published under a floating `latest` tag and versioned by publish date
//! instead.

use serde::Deserialize;

use super::super::types::BinaryKind;

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub browser_download_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    #[serde(default)]
    pub tag_name: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

fn release_endpoint(kind: BinaryKind) -> &'static str {
    match kind {
        BinaryKind::Downloader => "https://api.github.com/repos/yt-dlp/yt-dlp/releases/latest",
        BinaryKind::Muxer => "https://api.github.com/repos/BtbN/FFmpeg-Builds/releases/latest",
    }
}

pub fn fetch_latest_release(client: &reqwest::blocking::Client, kind: BinaryKind) -> anyhow::Result<ReleaseInfo> {
    let response = client
        .get(release_endpoint(kind))
        .header("User-Agent", "reelforge")
        .send()?
        .error_for_status()?;
    Ok(response.json::<ReleaseInfo>()?)
}

/// The version string this release should be recorded under (§4.7): the
/// downloader's tag with any leading non-digit prefix (`v1.2.3` -> `1.2.3`)
/// stripped, the muxer's publish date (`YYYY-MM-DD` -> `YYYY.MM.DD`) since
/// its tag is always the floating string `latest`.
pub fn release_version(kind: BinaryKind, release: &ReleaseInfo) -> Option<String> {
    match kind {
        BinaryKind::Downloader => release
            .tag_name
            .as_deref()
            .map(|tag| tag.trim_start_matches(|c: char| !c.is_ascii_digit()).to_string()),
        BinaryKind::Muxer => release
            .published_at
            .as_deref()
            .and_then(|s| s.get(0..10))
            .map(|date| date.replace('-', ".")),
    }
}

/// Exact filename for the downloader's platform binary, substring for the
/// muxer's platform archive (§4.7, §6).
fn asset_selector(kind: BinaryKind) -> &'static str {
    match (kind, cfg!(target_os = "windows"), cfg!(target_os = "macos")) {
        (BinaryKind::Downloader, true, _) => "yt-dlp.exe",
        (BinaryKind::Downloader, false, true) => "yt-dlp_macos",
        (BinaryKind::Downloader, false, false) => "yt-dlp",
        (BinaryKind::Muxer, true, _) => "ffmpeg-master-latest-win64-gpl.zip",
        (BinaryKind::Muxer, false, true) => "ffmpeg-master-latest-macos64-gpl.zip",
        (BinaryKind::Muxer, false, false) => "ffmpeg-master-latest-linux64-gpl.zip",
    }
}

/// Picks the asset matching this platform: exact match for the downloader,
/// substring match for the muxer archive (§6).
pub fn select_asset(kind: BinaryKind, release: &ReleaseInfo) -> Option<ReleaseAsset> {
    let selector = asset_selector(kind);
    release.assets.iter().find(|asset| match kind {
        BinaryKind::Downloader => asset.name == selector,
        BinaryKind::Muxer => asset.name.contains(selector),
    }).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downloader_version_strips_leading_v() {
        let release = ReleaseInfo { tag_name: Some("v2024.08.06".to_string()), published_at: None, assets: vec![] };
        assert_eq!(release_version(BinaryKind::Downloader, &release).as_deref(), Some("2024.08.06"));
    }

    #[test]
    fn muxer_version_comes_from_published_at() {
        let release = ReleaseInfo {
            tag_name: Some("latest".to_string()),
            published_at: Some("2024-08-06T12:00:00Z".to_string()),
            assets: vec![],
        };
        assert_eq!(release_version(BinaryKind::Muxer, &release).as_deref(), Some("2024.08.06"));
    }

    #[test]
    fn select_asset_matches_by_exact_or_substring() {
        let release = ReleaseInfo {
            tag_name: None,
            published_at: None,
            assets: vec![
                ReleaseAsset { name: "yt-dlp".to_string(), browser_download_url: "u1".to_string() },
                ReleaseAsset { name: "yt-dlp.exe".to_string(), browser_download_url: "u2".to_string() },
            ],
        };
        let found = select_asset(BinaryKind::Downloader, &release);
        assert!(found.is_some());
    }

    #[test]
    fn select_asset_returns_none_when_no_match() {
        let release = ReleaseInfo { tag_name: None, published_at: None, assets: vec![] };
        assert!(select_asset(BinaryKind::Downloader, &release).is_none());
    }
}
