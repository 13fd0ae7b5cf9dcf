use clap::Parser;
use frame_grabber::BurstPlan;
use std::path::PathBuf;

/// Grab a burst of still frames from an online video
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video URL; a t= query parameter is used as the default start time
    pub url: String,

    /// Start timestamp, e.g. "3:00", "00:03:00", "180", "3m0s"
    #[arg(short, long)]
    pub start: Option<String>,

    /// Number of frames to capture
    #[arg(short, long, default_value_t = BurstPlan::DEFAULT_COUNT)]
    pub count: u32,

    /// Seconds between frames
    #[arg(short, long, default_value_t = BurstPlan::DEFAULT_INTERVAL)]
    pub interval: f64,

    /// Output directory (default: sanitized video title)
    #[arg(short, long)]
    pub outdir: Option<PathBuf>,

    /// Filename prefix for the frame images
    #[arg(long, default_value = "frame_")]
    pub prefix: String,

    /// Delete the downloaded video after the frames are written
    #[arg(long)]
    pub discard_video: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
