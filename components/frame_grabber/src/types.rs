use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use timecode::{Timecode, TimecodeError};
use url::Url;

#[derive(Debug, Error)]
pub enum GrabError {
    #[error("required tool not found on PATH: {0}")]
    ToolNotFound(&'static str),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(#[from] TimecodeError),

    #[error("invalid burst plan: {0}")]
    InvalidPlan(String),

    #[error("metadata lookup failed: {0}")]
    Metadata(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("could not capture frame at {at}: {reason}")]
    FrameCapture { at: String, reason: String },

    #[error("extraction stopped after {produced} of {requested} frames: {reason}")]
    Extraction {
        produced: usize,
        requested: usize,
        reason: String,
    },

    #[error("output directory {path} is not usable")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GrabError {
    /// Process exit code for the failure category: 2 for bad input,
    /// 3 for metadata/download failures, 4 for (partial) extraction
    /// failures, 1 for environment problems.
    pub fn exit_code(&self) -> i32 {
        match self {
            GrabError::InvalidUrl(_)
            | GrabError::InvalidTimestamp(_)
            | GrabError::InvalidPlan(_) => 2,
            GrabError::Metadata(_) | GrabError::Download(_) => 3,
            GrabError::FrameCapture { .. } | GrabError::Extraction { .. } => 4,
            GrabError::ToolNotFound(_) | GrabError::Filesystem { .. } | GrabError::Io(_) => 1,
        }
    }
}

/// What yt-dlp knows about a video before anything is downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub uploader: Option<String>,

    /// Duration in seconds, when the source reports one.
    pub duration: Option<f64>,

    /// Original URL the metadata was fetched for
    pub source_url: String,

    /// When the metadata was fetched
    pub fetched_at: DateTime<Utc>,
}

/// How many frames to capture and how far apart they are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstPlan {
    count: u32,
    interval: f64,
}

impl BurstPlan {
    pub const DEFAULT_COUNT: u32 = 10;
    pub const DEFAULT_INTERVAL: f64 = 0.1;

    pub fn new(count: u32, interval: f64) -> Result<Self, GrabError> {
        if count == 0 {
            return Err(GrabError::InvalidPlan(
                "frame count must be at least 1".to_string(),
            ));
        }
        if !interval.is_finite() || interval <= 0.0 {
            return Err(GrabError::InvalidPlan(format!(
                "interval must be a positive number of seconds, got {interval}"
            )));
        }
        Ok(Self { count, interval })
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Capture offsets `start, start+i, start+2i, ...` in capture order.
    pub fn offsets(&self, start: Timecode) -> impl Iterator<Item = Timecode> {
        let interval = self.interval;
        (0..self.count).map(move |i| start.offset_by(i as f64 * interval))
    }
}

impl Default for BurstPlan {
    fn default() -> Self {
        Self {
            count: Self::DEFAULT_COUNT,
            interval: Self::DEFAULT_INTERVAL,
        }
    }
}

/// One fully-resolved grab request, immutable once built.
#[derive(Debug, Clone)]
pub struct BurstRequest {
    pub url: Url,

    /// Explicit start time; `None` falls back to the URL's `t=` hint,
    /// then to zero.
    pub start: Option<Timecode>,

    pub plan: BurstPlan,

    /// Explicit output directory; `None` derives one from the video title.
    pub outdir: Option<PathBuf>,

    /// Filename prefix for the frame images
    pub prefix: String,

    /// Remove the downloaded video once the frames are written
    pub discard_video: bool,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct BurstReport {
    pub metadata: VideoMetadata,
    pub outdir: PathBuf,

    /// Frame files in capture order
    pub frames: Vec<PathBuf>,

    /// The downloaded video, unless the request asked to discard it
    pub video: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn plan_rejects_zero_count() {
        assert_matches!(BurstPlan::new(0, 0.1), Err(GrabError::InvalidPlan(_)));
    }

    #[test]
    fn plan_rejects_bad_intervals() {
        assert_matches!(BurstPlan::new(10, 0.0), Err(GrabError::InvalidPlan(_)));
        assert_matches!(BurstPlan::new(10, -0.5), Err(GrabError::InvalidPlan(_)));
        assert_matches!(
            BurstPlan::new(10, f64::INFINITY),
            Err(GrabError::InvalidPlan(_))
        );
    }

    #[test]
    fn plan_yields_evenly_spaced_offsets() {
        let plan = BurstPlan::new(10, 0.1).unwrap();
        let start = Timecode::from_secs(580.0).unwrap();
        let offsets: Vec<f64> = plan.offsets(start).map(|t| t.as_secs()).collect();
        assert_eq!(offsets.len(), 10);
        assert_eq!(offsets[0], 580.0);
        assert_eq!(offsets[9], 580.0 + 9.0 * 0.1);
    }

    #[test]
    fn exit_codes_distinguish_failure_stages() {
        assert_eq!(GrabError::InvalidUrl("x".into()).exit_code(), 2);
        assert_eq!(GrabError::Download("x".into()).exit_code(), 3);
        assert_eq!(
            GrabError::Extraction {
                produced: 3,
                requested: 10,
                reason: "x".into()
            }
            .exit_code(),
            4
        );
        assert_eq!(GrabError::ToolNotFound("yt-dlp").exit_code(), 1);
    }

    #[test]
    fn metadata_round_trips_through_json() {
        let metadata = VideoMetadata {
            title: "Test Video".to_string(),
            uploader: Some("Test Channel".to_string()),
            duration: Some(600.5),
            source_url: "https://example.com/watch?v=abc".to_string(),
            fetched_at: Utc::now(),
        };

        let json = serde_json::to_string(&metadata).unwrap();
        let decoded: VideoMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.title, "Test Video");
        assert_eq!(decoded.duration, Some(600.5));
        assert_eq!(decoded.source_url, metadata.source_url);
    }
}
