//! Muxer archive extraction (§4.7): the muxer ships inside a zip archive and
//! must be located by filename-suffix search rather than a fixed interior
//! path, since the archive layout varies by platform build.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use super::super::types::BinaryKind;

/// Extracts `kind`'s executable out of an in-memory zip archive and writes
/// it to `dest`, marking it executable on unix.
pub fn extract_from_zip(data: &[u8], kind: BinaryKind, dest: &Path) -> Result<()> {
    let reader = Cursor::new(data);
    let mut archive = zip::ZipArchive::new(reader).context("failed to open downloaded archive")?;

    let target_name = kind.file_name().to_ascii_lowercase();
    let mut found_index = None;
    for i in 0..archive.len() {
        let file = archive.by_index(i).with_context(|| format!("failed to read zip entry at index {i}"))?;
        if file.is_dir() {
            continue;
        }
        let name = file.name().to_ascii_lowercase();
        let is_match = name.rsplit('/').next().map(|seg| seg == target_name).unwrap_or(false);
        if is_match {
            found_index = Some(i);
            break;
        }
    }

    let idx = found_index.ok_or_else(|| anyhow!("could not find {} inside downloaded archive", kind.file_name()))?;
    let mut file = archive.by_index(idx).with_context(|| format!("failed to open zip entry {idx}"))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    {
        let mut out = fs::File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
        std::io::copy(&mut file, &mut out).with_context(|| format!("failed to extract {}", dest.display()))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(dest)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(dest, perms)?;
    }

    Ok(())
}
