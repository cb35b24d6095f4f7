// src/sources/url.rs

//! Remote `.deb` download
//!
//! Downloads go into a private temporary directory that lives as long as the
//! source, below the cache directory when one is available. Transport errors
//! are retried with a linear backoff; HTTP error statuses are not.

use super::PackageSource;
use crate::config::cache_dir;
use crate::error::{Error, Result};
use crate::filesystem::path::sanitize_filename;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::{Client, Response};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Default timeout for HTTP requests
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum attempts per download
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds, multiplied by the attempt number
const RETRY_DELAY_MS: u64 = 1000;

/// Buffer size for streaming downloads (8 KB)
const STREAM_BUFFER_SIZE: usize = 8192;

/// File name used when the URL does not end in a usable one
const FALLBACK_FILENAME: &str = "package.deb";

/// A `.deb` fetched over HTTP(S)
#[derive(Debug)]
pub struct UrlSource {
    client: Client,
    download_dir: Option<TempDir>,
    max_retries: u32,
    show_progress: bool,
}

impl UrlSource {
    pub fn new(show_progress: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("deb2arch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::DownloadError(format!("Failed to create HTTP client: {e}")))?;

        let download_dir = create_download_dir()?;

        Ok(Self {
            client,
            download_dir: Some(download_dir),
            max_retries: MAX_RETRIES,
            show_progress,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Directory downloads are written to, while not released
    pub fn download_dir(&self) -> Option<&Path> {
        self.download_dir.as_ref().map(TempDir::path)
    }

    fn download(&self, url: &str, dest_path: &Path) -> Result<()> {
        info!("Downloading {} to {}", url, dest_path.display());

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::DownloadError(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }

                    let temp_path = dest_path.with_extension("tmp");
                    let mut file = File::create(&temp_path).map_err(|e| {
                        Error::IoError(format!("Failed to create file {}: {e}", temp_path.display()))
                    })?;

                    let downloaded = self.stream_to_file(response, &mut file, dest_path)?;
                    debug!("Downloaded {} bytes", downloaded);

                    fs::rename(&temp_path, dest_path).map_err(|e| {
                        Error::IoError(format!(
                            "Failed to move {} to {}: {e}",
                            temp_path.display(),
                            dest_path.display()
                        ))
                    })?;

                    info!("Successfully downloaded to {}", dest_path.display());
                    return Ok(());
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::DownloadError(format!(
                            "Failed to download {url} after {attempt} attempts: {e}"
                        )));
                    }
                    warn!("Download attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }

    fn stream_to_file(&self, mut response: Response, file: &mut File, dest_path: &Path) -> Result<u64> {
        let name = dest_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let progress = self
            .show_progress
            .then(|| create_progress_bar(response.content_length().unwrap_or(0), &name));

        let mut buffer = [0u8; STREAM_BUFFER_SIZE];
        let mut downloaded = 0u64;
        loop {
            let n = response
                .read(&mut buffer)
                .map_err(|e| Error::DownloadError(format!("Failed to read response body: {e}")))?;
            if n == 0 {
                break;
            }
            file.write_all(&buffer[..n])
                .map_err(|e| Error::IoError(format!("Failed to write downloaded data: {e}")))?;
            downloaded += n as u64;
            if let Some(pb) = &progress {
                pb.set_position(downloaded);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message(format!("{} [done]", name));
        }

        Ok(downloaded)
    }
}

impl PackageSource for UrlSource {
    fn acquire(&mut self, target: &str) -> Result<PathBuf> {
        let dir = self
            .download_dir()
            .ok_or_else(|| Error::SourceError("URL source already released".to_string()))?;
        let dest = dir.join(filename_from_url(target));
        self.download(target, &dest)?;
        Ok(dest)
    }

    fn release(&mut self) -> Result<()> {
        if let Some(dir) = self.download_dir.take() {
            debug!("Removing download directory {}", dir.path().display());
            dir.close()
                .map_err(|e| Error::IoError(format!("Failed to remove download directory: {e}")))?;
        }
        Ok(())
    }
}

/// Private download directory, under the cache directory when it is usable
fn create_download_dir() -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("deb2arch_dl_");

    if let Some(cache) = cache_dir()
        && fs::create_dir_all(&cache).is_ok()
        && let Ok(dir) = builder.tempdir_in(&cache)
    {
        return Ok(dir);
    }

    builder
        .tempdir()
        .map_err(|e| Error::IoError(format!("Failed to create download directory: {e}")))
}

/// Last path segment of a URL, query and fragment removed
fn filename_from_url(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let candidate = without_query.rsplit('/').next().unwrap_or("");
    match sanitize_filename(candidate) {
        Ok(name) => name,
        Err(_) => FALLBACK_FILENAME.to_string(),
    }
}

/// Create a styled progress bar for package downloads
fn create_progress_bar(size: u64, name: &str) -> ProgressBar {
    let pb = ProgressBar::new(size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("#>-"),
    );
    pb.set_message(name.to_string());
    pb
}
