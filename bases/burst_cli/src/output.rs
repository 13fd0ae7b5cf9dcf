use frame_grabber::{BurstReport, BurstRequest, GrabError};

pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_start(&self, request: &BurstRequest) {
        println!(
            "Grabbing {} frame(s) every {}s from: {}",
            request.plan.count(),
            request.plan.interval(),
            request.url
        );
    }

    pub fn print_report(&self, report: &BurstReport) {
        println!("Video: {}", report.metadata.title);
        if let Some(uploader) = &report.metadata.uploader {
            println!("Uploader: {}", uploader);
        }
        println!(
            "Captured {} frame(s) in {}",
            report.frames.len(),
            report.outdir.display()
        );
        if let Some(video) = &report.video {
            println!("Source video kept at {}", video.display());
        }

        if self.verbose {
            for frame in &report.frames {
                println!("  {}", frame.display());
            }
        }
    }

    pub fn print_error(&self, error: &GrabError) {
        eprintln!("Error: {}", error);

        if let GrabError::Extraction {
            produced,
            requested,
            ..
        } = error
        {
            eprintln!("Wrote {produced} of {requested} frames before stopping.");
        }

        if self.verbose {
            let mut source = std::error::Error::source(error);
            if source.is_some() {
                eprintln!("\nCaused by:");
            }
            while let Some(cause) = source {
                eprintln!("  {}", cause);
                source = cause.source();
            }
        }
    }
}
