//! Binary Manager (C7): ensures the downloader and muxer executables exist
//! on disk at a known location, and refreshes them from the upstream
//! release feed on request or on a 12-hour gate (§4.7).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

use super::super::types::BinaryKind;
use super::{extract, net, release};
use crate::core::domain::BinaryVersionMap;
use crate::core::json_io::{read_json_file, write_json_file};
use crate::core::tools::types::ToolStatus;

const UPDATE_CHECK_INTERVAL_HOURS: i64 = 12;

pub struct BinaryManager {
    bin_dir: PathBuf,
    version_path: PathBuf,
    versions: Mutex<BinaryVersionMap>,
}

impl BinaryManager {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let bin_dir = data_dir.as_ref().join("bin");
        let version_path = bin_dir.join(".version.json");
        let versions = if version_path.exists() {
            read_json_file(&version_path).unwrap_or_default()
        } else {
            BinaryVersionMap::default()
        };
        BinaryManager { bin_dir, version_path, versions: Mutex::new(versions) }
    }

    pub fn path_for(&self, kind: BinaryKind) -> PathBuf {
        self.bin_dir.join(kind.file_name())
    }

    pub fn ytdlp_path(&self) -> Option<PathBuf> {
        self.existing_path(BinaryKind::Downloader)
    }

    pub fn ffmpeg_path(&self) -> Option<PathBuf> {
        self.existing_path(BinaryKind::Muxer)
    }

    fn existing_path(&self, kind: BinaryKind) -> Option<PathBuf> {
        let path = self.path_for(kind);
        path.exists().then_some(path)
    }

    fn save_versions(&self) -> anyhow::Result<()> {
        let versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        write_json_file(&self.version_path, &*versions)
    }

    /// First-run flow (§4.7): fetches, installs, and persists a version for
    /// any binary not already present on disk.
    pub fn ensure_present<Prog, Cancel>(&self, mut progress_cb: Prog, mut cancel_cb: Cancel) -> anyhow::Result<bool>
    where
        Prog: FnMut(BinaryKind, u64, Option<u64>),
        Cancel: FnMut() -> bool,
    {
        let client = net::build_client()?;
        for kind in [BinaryKind::Downloader, BinaryKind::Muxer] {
            if self.existing_path(kind).is_some() {
                continue;
            }
            let installed = self.fetch_and_install(&client, kind, &mut progress_cb, &mut cancel_cb)?;
            if !installed {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Cheap, network-free status read for the client's startup hydration
    /// (`get_tool_status`, §4.10.1): never probes disk beyond `exists()` and
    /// never talks to the release feed.
    pub fn status_snapshot(&self) -> Vec<ToolStatus> {
        let versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        [BinaryKind::Downloader, BinaryKind::Muxer]
            .into_iter()
            .map(|kind| {
                let current = match kind {
                    BinaryKind::Downloader => versions.downloader.clone(),
                    BinaryKind::Muxer => versions.muxer.clone(),
                };
                ToolStatus {
                    kind_label: kind.label().to_string(),
                    resolved_path: self.existing_path(kind).map(|p| p.to_string_lossy().into_owned()),
                    current_version: current,
                    remote_version: None,
                    update_available: false,
                    download_in_progress: false,
                    download_progress_percent: None,
                    downloaded_bytes: None,
                    total_bytes: None,
                    last_error: None,
                }
            })
            .collect()
    }

    fn should_check_updates(&self) -> bool {
        let versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        let Some(last_check) = &versions.last_check else { return true };
        let Ok(last) = chrono::DateTime::parse_from_rfc3339(last_check) else { return true };
        Utc::now().signed_duration_since(last) >= chrono::Duration::hours(UPDATE_CHECK_INTERVAL_HOURS)
    }

    /// `check_updates() -> map{name -> (current, latest)}` (§4.7), gated to
    /// once per `UPDATE_CHECK_INTERVAL_HOURS`. Returns only binaries whose
    /// locally recorded version differs from the fetched upstream version.
    pub fn check_updates(&self) -> anyhow::Result<HashMap<String, (Option<String>, String)>> {
        let mut out = HashMap::new();
        if !self.should_check_updates() {
            return Ok(out);
        }

        let client = net::build_client()?;
        for kind in [BinaryKind::Downloader, BinaryKind::Muxer] {
            let current = {
                let versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
                match kind {
                    BinaryKind::Downloader => versions.downloader.clone(),
                    BinaryKind::Muxer => versions.muxer.clone(),
                }
            };
            let Ok(release_info) = release::fetch_latest_release(&client, kind) else { continue };
            let Some(latest) = release::release_version(kind, &release_info) else { continue };
            if current.as_deref() != Some(latest.as_str()) {
                out.insert(kind.label().to_string(), (current, latest));
            }
        }

        {
            let mut versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
            versions.last_check = Some(Utc::now().to_rfc3339());
        }
        self.save_versions()?;
        Ok(out)
    }

    /// `update(subset, progress_cb, cancel_cb)` (§4.7): re-runs the
    /// fetch-and-install flow regardless of whether the binary is already
    /// present. `last_check` is refreshed even if a member of `subset`
    /// fails or is cancelled, mirroring the original's "update at the end
    /// regardless" behavior (see DESIGN.md).
    pub fn update<Prog, Cancel>(&self, subset: &[BinaryKind], mut progress_cb: Prog, mut cancel_cb: Cancel) -> anyhow::Result<bool>
    where
        Prog: FnMut(BinaryKind, u64, Option<u64>),
        Cancel: FnMut() -> bool,
    {
        let client = net::build_client()?;
        let mut all_ok = true;
        for &kind in subset {
            if !self.fetch_and_install(&client, kind, &mut progress_cb, &mut cancel_cb)? {
                all_ok = false;
                if cancel_cb() {
                    break;
                }
            }
        }
        {
            let mut versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
            versions.last_check = Some(Utc::now().to_rfc3339());
        }
        self.save_versions()?;
        Ok(all_ok)
    }

    fn fetch_and_install<Prog, Cancel>(
        &self,
        client: &reqwest::blocking::Client,
        kind: BinaryKind,
        progress_cb: &mut Prog,
        cancel_cb: &mut Cancel,
    ) -> anyhow::Result<bool>
    where
        Prog: FnMut(BinaryKind, u64, Option<u64>),
        Cancel: FnMut() -> bool,
    {
        let release_info = release::fetch_latest_release(client, kind)?;
        let Some(asset) = release::select_asset(kind, &release_info) else {
            anyhow::bail!("no release asset matched this platform for {}", kind.label());
        };
        let Some(version) = release::release_version(kind, &release_info) else {
            anyhow::bail!("release feed did not report a version for {}", kind.label());
        };

        let dest = self.path_for(kind);
        let installed = match kind {
            BinaryKind::Downloader => {
                net::download_to_file(client, &asset.browser_download_url, &dest, |d, t| progress_cb(kind, d, t), cancel_cb)?
            }
            BinaryKind::Muxer => {
                let Some(bytes) = net::download_bytes(client, &asset.browser_download_url, |d, t| progress_cb(kind, d, t), cancel_cb)? else {
                    return Ok(false);
                };
                extract::extract_from_zip(&bytes, kind, &dest)?;
                true
            }
        };

        if !installed {
            return Ok(false);
        }

        let mut versions = self.versions.lock().unwrap_or_else(|e| e.into_inner());
        match kind {
            BinaryKind::Downloader => versions.downloader = Some(version),
            BinaryKind::Muxer => versions.muxer = Some(version),
        }
        drop(versions);
        self.save_versions()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn paths_are_none_until_binaries_exist() {
        let dir = tempdir().unwrap();
        let manager = BinaryManager::new(dir.path());
        assert!(manager.ytdlp_path().is_none());
        assert!(manager.ffmpeg_path().is_none());
    }

    #[test]
    fn existing_binary_on_disk_is_reported_present() {
        let dir = tempdir().unwrap();
        let manager = BinaryManager::new(dir.path());
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::write(manager.path_for(BinaryKind::Downloader), b"stub").unwrap();
        assert_eq!(manager.ytdlp_path(), Some(manager.path_for(BinaryKind::Downloader)));
    }

    #[test]
    fn check_updates_is_gated_without_a_last_check_it_still_runs_once() {
        let dir = tempdir().unwrap();
        let manager = BinaryManager::new(dir.path());
        assert!(manager.should_check_updates());
    }

    #[test]
    fn check_updates_gate_suppresses_rapid_repeat_calls() {
        let dir = tempdir().unwrap();
        let manager = BinaryManager::new(dir.path());
        {
            let mut versions = manager.versions.lock().unwrap();
            versions.last_check = Some(Utc::now().to_rfc3339());
        }
        assert!(!manager.should_check_updates());
    }
}
