use crate::types::{GrabError, VideoMetadata};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use tokio::process::Command;
use url::Url;

#[async_trait]
pub trait Downloader {
    async fn check_available(&self) -> Result<(), GrabError>;

    /// Fetch title, uploader and duration without downloading media.
    async fn fetch_metadata(&self, url: &Url) -> Result<VideoMetadata, GrabError>;

    /// Download one stream variant to `<dir>/<stem>.<ext>` and return the
    /// resulting file. Called exactly once per run.
    async fn download_video(
        &self,
        url: &Url,
        dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, GrabError>;
}

pub struct YtDlp;

#[async_trait]
impl Downloader for YtDlp {
    async fn check_available(&self) -> Result<(), GrabError> {
        which::which("yt-dlp")
            .map(|_| ())
            .map_err(|_| GrabError::ToolNotFound("yt-dlp"))
    }

    async fn fetch_metadata(&self, url: &Url) -> Result<VideoMetadata, GrabError> {
        tracing::debug!("fetching metadata for {url}");

        let output = Command::new("yt-dlp")
            .arg("--dump-json")
            .arg("--no-download")
            .arg(url.as_str())
            .output()
            .await?;

        if !output.status.success() {
            return Err(GrabError::Metadata(
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            ));
        }

        let raw: RawMetadata = serde_json::from_slice(&output.stdout)
            .map_err(|e| GrabError::Metadata(e.to_string()))?;

        Ok(VideoMetadata {
            title: raw.title,
            uploader: raw.uploader,
            duration: raw.duration,
            source_url: raw
                .webpage_url
                .unwrap_or_else(|| url.as_str().to_owned()),
            fetched_at: chrono::Utc::now(),
        })
    }

    async fn download_video(
        &self,
        url: &Url,
        dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, GrabError> {
        let template = dir.join(format!("{stem}.%(ext)s"));

        tracing::info!("downloading best video-only stream");
        let status = run_download(url, &template, &["-f", "bestvideo"]).await?;
        if !status.success() {
            // Some sources have no separate video-only variant.
            tracing::warn!("video-only download failed, retrying with merged best video+audio");
            let status = run_download(
                url,
                &template,
                &["-f", "bestvideo*+bestaudio/best", "--merge-output-format", "mp4"],
            )
            .await?;
            if !status.success() {
                return Err(GrabError::Download(format!(
                    "yt-dlp exited with status: {status}"
                )));
            }
        }

        locate_download(dir, stem).await
    }
}

async fn run_download(
    url: &Url,
    template: &Path,
    format_args: &[&str],
) -> Result<ExitStatus, GrabError> {
    let status = Command::new("yt-dlp")
        .arg("--no-continue")
        .arg("--no-part")
        .arg("--retries")
        .arg("5")
        .arg("--retry-sleep")
        .arg("2")
        .args(format_args)
        .arg("-o")
        .arg(template)
        .arg(url.as_str())
        .status()
        .await?;
    Ok(status)
}

/// yt-dlp picks the extension, so find whatever landed under the stem.
async fn locate_download(dir: &Path, stem: &str) -> Result<PathBuf, GrabError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.file_stem() == Some(std::ffi::OsStr::new(stem)) {
            return Ok(path);
        }
    }
    Err(GrabError::Download(
        "download succeeded but no output file was found".to_string(),
    ))
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    title: String,
    uploader: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
}
