//! Settings-to-`DownloadOptions` translation (§4.2.1's option list, §4.12).
//! Kept out of `downloader::args` because it is policy (how *this* app's
//! settings map onto the wrapper's generic options) rather than mechanism
//! (how the options map onto argv).

use crate::core::domain::{OutputFormat, Settings, VideoQuality};
use crate::core::downloader::DownloadOptions;

const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";
const LOUDNORM_FILTER: &str = "loudnorm=I=-14:TP=-1";

/// Builds the wrapper-level options for a single task's download, mirroring
/// the original format/quality/normalize-audio policy (see DESIGN.md).
pub fn build_download_options(settings: &Settings, ffmpeg_location: Option<&str>, is_resume: bool) -> DownloadOptions {
    let mut options = DownloadOptions::new();
    options.outtmpl = Some(format!("{}/{}", settings.download_folder.trim_end_matches('/'), OUTPUT_TEMPLATE));
    options.noplaylist = true;
    options.overwrites = true;
    options.is_resume = is_resume;
    options.ffmpeg_location = ffmpeg_location.map(str::to_string);

    if settings.format.is_audio() {
        options.format = Some("bestaudio/best".to_string());
        options.extract_audio = true;
        options.audio_format = Some(settings.format.extension().to_string());
    } else {
        options.merge_output_format = Some(settings.format.extension().to_string());
        options.format = Some(video_format_selector(settings.video_quality));
    }

    if settings.normalize_audio {
        options.postprocessor_args.insert("ffmpeg".to_string(), vec!["-af".to_string(), LOUDNORM_FILTER.to_string()]);
    }

    if settings.use_acceleration {
        options.concurrent_fragment_downloads = Some(Settings::CONCURRENT_FRAGMENT_DOWNLOADS);
    }

    options
}

/// `bestvideo[height<=H]+bestaudio/best[height<=H]`, or `<q>video+<q>audio/best`
/// for the unconstrained `best`/`worst` qualities.
fn video_format_selector(quality: VideoQuality) -> String {
    match quality {
        VideoQuality::Best => "bestvideo+bestaudio/best".to_string(),
        VideoQuality::Worst => "worstvideo+worstaudio/worst".to_string(),
        VideoQuality::P1080 => height_capped_selector(1080),
        VideoQuality::P720 => height_capped_selector(720),
        VideoQuality::P480 => height_capped_selector(480),
        VideoQuality::P360 => height_capped_selector(360),
    }
}

fn height_capped_selector(height: u32) -> String {
    format!("bestvideo[height<={height}]+bestaudio/best[height<={height}]")
}
