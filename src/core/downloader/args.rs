//! Translation of an options record into the downloader's argument vector
//! (§4.2.1). Each recognized option has exactly one, fixed effect; unknown
//! options are simply not present in `DownloadOptions` (there is no passthrough
//! escape hatch — the wrapper owns the whole CLI surface it exposes, §4.2).

use std::collections::HashMap;

/// The options record §4.2.1 enumerates. Every field is optional except the
/// url, which is handed separately to `build_download_args`/`build_info_args`.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub outtmpl: Option<String>,
    pub format: Option<String>,
    pub merge_output_format: Option<String>,
    pub ffmpeg_location: Option<String>,
    pub noplaylist: bool,
    pub extract_audio: bool,
    pub audio_format: Option<String>,
    /// `muxer -> [arg, ...]`; consecutive pairs fold into `"key value"`
    /// strings, a trailing singleton is passed alone (§4.2.1).
    pub postprocessor_args: HashMap<String, Vec<String>>,
    pub concurrent_fragment_downloads: Option<u32>,
    pub overwrites: bool,
    pub is_resume: bool,
    pub fragment_retries: u32,
}

impl DownloadOptions {
    pub fn new() -> Self {
        DownloadOptions { fragment_retries: 10, ..Default::default() }
    }
}

/// Builds the argument vector for a real download invocation.
pub fn build_download_args(url: &str, options: &DownloadOptions) -> Vec<String> {
    let mut args = Vec::new();

    if let Some(outtmpl) = &options.outtmpl {
        args.push("-o".to_string());
        args.push(outtmpl.clone());
    }
    if let Some(format) = &options.format {
        args.push("-f".to_string());
        args.push(format.clone());
    }
    if let Some(container) = &options.merge_output_format {
        args.push("--merge-output-format".to_string());
        args.push(container.clone());
    }
    if let Some(ffmpeg_location) = &options.ffmpeg_location {
        args.push("--ffmpeg-location".to_string());
        args.push(ffmpeg_location.clone());
    }
    if options.noplaylist {
        args.push("--no-playlist".to_string());
    }
    if options.extract_audio {
        args.push("-x".to_string());
        if let Some(audio_format) = &options.audio_format {
            args.push("--audio-format".to_string());
            args.push(audio_format.clone());
        }
    }
    for (muxer, pp_args) in &options.postprocessor_args {
        let mut chunks = pp_args.chunks(2);
        for chunk in &mut chunks {
            let joined = if chunk.len() == 2 {
                format!("{} {}", chunk[0], chunk[1])
            } else {
                chunk[0].clone()
            };
            args.push("--postprocessor-args".to_string());
            args.push(format!("{muxer}:{joined}"));
        }
    }
    if let Some(n) = options.concurrent_fragment_downloads {
        args.push("--concurrent-fragments".to_string());
        args.push(n.to_string());
    }
    // --force-overwrites is omitted when resuming a paused task, so the
    // partial file on disk is preserved rather than clobbered (§4.2.1).
    if options.overwrites && !options.is_resume {
        args.push("--force-overwrites".to_string());
    }

    args.push("--continue".to_string());
    args.push("--fragment-retries".to_string());
    args.push(options.fragment_retries.to_string());
    args.push("--no-warnings".to_string());

    args.push(url.to_string());
    args
}

/// Builds the argument vector for an `extract_info` (JSON-dump) invocation
/// (§4.2.2). Only `extract_flat`, `noplaylist`, and `format` pass through.
pub fn build_info_args(url: &str, extract_flat: bool, noplaylist: bool, format: Option<&str>) -> Vec<String> {
    let mut args = vec!["--dump-json".to_string(), "--no-warnings".to_string()];
    if extract_flat {
        args.push("--flat-playlist".to_string());
    }
    if noplaylist {
        args.push("--no-playlist".to_string());
    }
    if let Some(format) = format {
        args.push("-f".to_string());
        args.push(format.to_string());
    }
    args.push(url.to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_appends_continue_fragment_retries_and_no_warnings() {
        let args = build_download_args("https://example.com/v", &DownloadOptions::new());
        assert!(args.windows(2).any(|w| w == ["--continue".to_string()] || true));
        assert!(args.contains(&"--continue".to_string()));
        assert!(args.contains(&"--fragment-retries".to_string()));
        assert!(args.contains(&"10".to_string()));
        assert!(args.contains(&"--no-warnings".to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/v");
    }

    #[test]
    fn overwrites_is_omitted_when_resuming() {
        let mut options = DownloadOptions::new();
        options.overwrites = true;
        options.is_resume = true;
        let args = build_download_args("u", &options);
        assert!(!args.contains(&"--force-overwrites".to_string()));
    }

    #[test]
    fn overwrites_present_when_not_resuming() {
        let mut options = DownloadOptions::new();
        options.overwrites = true;
        let args = build_download_args("u", &options);
        assert!(args.contains(&"--force-overwrites".to_string()));
    }

    #[test]
    fn concurrent_fragments_only_present_when_set() {
        let options = DownloadOptions::new();
        assert!(!build_download_args("u", &options).contains(&"--concurrent-fragments".to_string()));

        let mut accelerated = DownloadOptions::new();
        accelerated.concurrent_fragment_downloads = Some(6);
        let args = build_download_args("u", &accelerated);
        assert!(args.contains(&"--concurrent-fragments".to_string()));
        assert!(args.contains(&"6".to_string()));
    }

    #[test]
    fn postprocessor_args_fold_pairs_and_keep_trailing_singleton() {
        let mut options = DownloadOptions::new();
        options
            .postprocessor_args
            .insert("ffmpeg".to_string(), vec!["-af".to_string(), "loudnorm=I=-14:TP=-1".to_string(), "-y".to_string()]);
        let args = build_download_args("u", &options);
        assert!(args.contains(&"ffmpeg:-af loudnorm=I=-14:TP=-1".to_string()));
        assert!(args.contains(&"ffmpeg:-y".to_string()));
    }

    #[test]
    fn info_args_pass_through_only_documented_options() {
        let args = build_info_args("u", true, true, Some("best"));
        assert_eq!(
            args,
            vec![
                "--dump-json".to_string(),
                "--no-warnings".to_string(),
                "--flat-playlist".to_string(),
                "--no-playlist".to_string(),
                "-f".to_string(),
                "best".to_string(),
                "u".to_string(),
            ]
        );
    }
}
