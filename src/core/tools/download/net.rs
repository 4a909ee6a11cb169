//! Blocking, chunked HTTP download with a per-chunk cancellation poll
//! (§4.7, §5 "Binary download cancel is polled per chunk"). The crate's
//! blocking core never reaches for an async HTTP client; this is the one
//! place network bytes cross into the core, and it does so synchronously.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};

pub fn build_client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .context("failed to build HTTP client")
}

/// Streams `url` into `dest` via a `.tmp` sibling, renamed into place on
/// success. `cancel_cb` is polled once per chunk; returning true aborts the
/// download and removes the partial file (§4.7, §5).
pub fn download_to_file<P, C>(
    client: &reqwest::blocking::Client,
    url: &str,
    dest: &Path,
    mut on_progress: P,
    mut cancel_cb: C,
) -> Result<bool>
where
    P: FnMut(u64, Option<u64>),
    C: FnMut() -> bool,
{
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut response = client
        .get(url)
        .header("User-Agent", "reelforge")
        .send()
        .with_context(|| format!("failed to GET {url}"))?;
    if !response.status().is_success() {
        bail!("download of {url} failed with status {}", response.status());
    }
    let total_len = response.content_length();

    let tmp_path = dest.with_extension("tmp-download");
    let mut file = fs::File::create(&tmp_path).with_context(|| format!("failed to create {}", tmp_path.display()))?;

    let mut buf = [0u8; 64 * 1024];
    let mut downloaded: u64 = 0;
    loop {
        if cancel_cb() {
            drop(file);
            let _ = fs::remove_file(&tmp_path);
            return Ok(false);
        }
        let n = response.read(&mut buf).context("failed to read response body")?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).with_context(|| format!("failed to write {}", tmp_path.display()))?;
        downloaded = downloaded.saturating_add(n as u64);
        on_progress(downloaded, total_len);
    }
    drop(file);

    fs::rename(&tmp_path, dest)
        .with_context(|| format!("failed to rename {} -> {}", tmp_path.display(), dest.display()))?;
    mark_executable_if_unix(dest)?;
    Ok(true)
}

/// In-memory download for archives that must be unpacked before anything
/// lands on disk (the muxer's zip, §4.7).
pub fn download_bytes<C>(client: &reqwest::blocking::Client, url: &str, mut on_progress: impl FnMut(u64, Option<u64>), mut cancel_cb: C) -> Result<Option<Vec<u8>>>
where
    C: FnMut() -> bool,
{
    let mut response = client
        .get(url)
        .header("User-Agent", "reelforge")
        .send()
        .with_context(|| format!("failed to GET {url}"))?;
    if !response.status().is_success() {
        bail!("download of {url} failed with status {}", response.status());
    }
    let total_len = response.content_length();

    let mut buf = [0u8; 64 * 1024];
    let mut out = Vec::new();
    loop {
        if cancel_cb() {
            return Ok(None);
        }
        let n = response.read(&mut buf).context("failed to read response body")?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
        on_progress(out.len() as u64, total_len);
    }
    Ok(Some(out))
}

#[cfg(unix)]
fn mark_executable_if_unix(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable_if_unix(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read as _;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    use tempfile::tempdir;

    use super::*;

    fn spawn_local_http_server(body: Vec<u8>) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind(("127.0.0.1", 0)).expect("bind test server");
        let addr = listener.local_addr().expect("server addr");
        let url = format!("http://127.0.0.1:{}/", addr.port());
        listener.set_nonblocking(true).expect("set listener nonblocking");

        let handle = thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(3);
            while Instant::now() < deadline {
                match listener.accept() {
                    Ok((mut stream, _peer)) => {
                        let _ = stream.set_nonblocking(false);
                        let _ = stream.set_read_timeout(Some(Duration::from_millis(500)));
                        let mut buf = [0u8; 4096];
                        let _ = stream.read(&mut buf);
                        let headers = format!(
                            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            body.len()
                        );
                        let _ = stream.write_all(headers.as_bytes());
                        let _ = stream.write_all(&body);
                        break;
                    }
                    Err(_) => thread::sleep(Duration::from_millis(10)),
                }
            }
        });

        (url, handle)
    }

    #[test]
    fn downloads_body_from_local_server_and_marks_executable() {
        let body = b"#!/bin/sh\nexit 0\n".to_vec();
        let (url, server) = spawn_local_http_server(body.clone());
        let client = build_client().unwrap();
        let dir = tempdir().unwrap();
        let dest = dir.path().join("yt-dlp");

        let ok = download_to_file(&client, &url, &dest, |_, _| {}, || false).unwrap();
        server.join().unwrap();

        assert!(ok);
        assert_eq!(fs::read(&dest).unwrap(), body);
        assert!(!dest.with_extension("tmp-download").exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&dest).unwrap().permissions().mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn cancel_callback_aborts_and_removes_partial_file() {
        let body = vec![0u8; 4096];
        let (url, server) = spawn_local_http_server(body);
        let client = build_client().unwrap();
        let dir = tempdir().unwrap();
        let dest = dir.path().join("yt-dlp");

        let ok = download_to_file(&client, &url, &dest, |_, _| {}, || true).unwrap();
        let _ = server.join();

        assert!(!ok);
        assert!(!dest.exists());
        assert!(!dest.with_extension("tmp-download").exists());
    }
}
