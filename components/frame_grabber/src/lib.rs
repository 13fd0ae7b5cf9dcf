mod ffmpeg;
mod types;
mod utils;
mod ytdlp;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use timecode::Timecode;

pub use ffmpeg::{Ffmpeg, FrameExtractor};
pub use types::{BurstPlan, BurstReport, BurstRequest, GrabError, VideoMetadata};
pub use ytdlp::{Downloader, YtDlp};

use utils::FrameNamer;

/// Runs the whole pipeline: resolve the start time, fetch metadata,
/// download the video once, then pull the burst of frames from the
/// local file. Strictly sequential, nothing is retried.
pub struct FrameGrabber {
    work_root: PathBuf,
    downloader: Arc<dyn Downloader + Send + Sync>,
    extractor: Arc<dyn FrameExtractor + Send + Sync>,
}

impl FrameGrabber {
    /// Create a grabber backed by yt-dlp and ffmpeg. Derived output
    /// directories are created under `work_root`.
    pub async fn new(work_root: impl AsRef<Path>) -> Result<Self, GrabError> {
        Self::with_tools(work_root, Arc::new(YtDlp), Arc::new(Ffmpeg)).await
    }

    /// Create a grabber with specific tool implementations.
    pub async fn with_tools(
        work_root: impl AsRef<Path>,
        downloader: Arc<dyn Downloader + Send + Sync>,
        extractor: Arc<dyn FrameExtractor + Send + Sync>,
    ) -> Result<Self, GrabError> {
        downloader.check_available().await?;
        extractor.check_available().await?;

        let work_root = work_root.as_ref().to_owned();
        tokio::fs::create_dir_all(&work_root).await?;

        Ok(Self {
            work_root,
            downloader,
            extractor,
        })
    }

    pub async fn run(&self, request: &BurstRequest) -> Result<BurstReport, GrabError> {
        let start = utils::resolve_start(&request.url, request.start)?;

        tracing::info!("fetching metadata for {}", request.url);
        let metadata = self.downloader.fetch_metadata(&request.url).await?;

        let outdir = self.resolve_outdir(request, &metadata).await?;

        tracing::info!("downloading {} into {}", request.url, outdir.display());
        let video = self
            .downloader
            .download_video(&request.url, &outdir, &utils::video_stem(&request.url))
            .await?;

        tracing::info!(
            "extracting {} frame(s) starting at {start}",
            request.plan.count()
        );
        let frames = self
            .extract_burst(&video, start, request, &outdir, metadata.duration)
            .await;

        if request.discard_video {
            if let Err(error) = tokio::fs::remove_file(&video).await {
                tracing::warn!(
                    "could not remove downloaded video {}: {error}",
                    video.display()
                );
            }
        }

        let frames = frames?;
        Ok(BurstReport {
            metadata,
            outdir,
            frames,
            video: (!request.discard_video).then_some(video),
        })
    }

    /// Explicit directories are used verbatim; otherwise one is derived
    /// from the sanitized video title under the work root.
    async fn resolve_outdir(
        &self,
        request: &BurstRequest,
        metadata: &VideoMetadata,
    ) -> Result<PathBuf, GrabError> {
        let outdir = match &request.outdir {
            Some(dir) => dir.clone(),
            None => self.work_root.join(utils::sanitize_title(&metadata.title)),
        };
        tokio::fs::create_dir_all(&outdir)
            .await
            .map_err(|source| GrabError::Filesystem {
                path: outdir.clone(),
                source,
            })?;
        Ok(outdir)
    }

    /// One independent seek-and-capture per offset. Offsets past the
    /// known duration, a failed capture, or a capture that produced no
    /// file all abort the remaining frames, reporting how many were
    /// actually written.
    async fn extract_burst(
        &self,
        video: &Path,
        start: Timecode,
        request: &BurstRequest,
        outdir: &Path,
        duration: Option<f64>,
    ) -> Result<Vec<PathBuf>, GrabError> {
        let requested = request.plan.count() as usize;
        let mut namer = FrameNamer::new();
        let mut frames: Vec<PathBuf> = Vec::with_capacity(requested);

        for at in request.plan.offsets(start) {
            if let Some(duration) = duration {
                if at.as_secs() > duration {
                    return Err(GrabError::Extraction {
                        produced: frames.len(),
                        requested,
                        reason: format!(
                            "offset {at} is past the end of the video ({duration:.1}s)"
                        ),
                    });
                }
            }

            let output = outdir.join(namer.next(&request.prefix, at));
            if let Err(error) = self.extractor.grab_frame(video, at, &output).await {
                return Err(GrabError::Extraction {
                    produced: frames.len(),
                    requested,
                    reason: error.to_string(),
                });
            }
            if !frame_was_written(&output).await {
                return Err(GrabError::Extraction {
                    produced: frames.len(),
                    requested,
                    reason: format!("no frame produced at {at}, likely past end of stream"),
                });
            }

            tracing::debug!("captured frame {} at {at}", frames.len() + 1);
            frames.push(output);
        }

        Ok(frames)
    }
}

async fn frame_was_written(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata.len() > 0,
        Err(_) => false,
    }
}
