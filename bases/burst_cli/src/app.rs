use crate::args::Args;
use crate::output::OutputHandler;
use frame_grabber::{BurstPlan, BurstRequest, FrameGrabber, GrabError};
use timecode::Timecode;
use url::Url;

pub struct App {
    args: Args,
    output: OutputHandler,
}

impl App {
    pub fn new(args: Args) -> Self {
        let output = OutputHandler::new(args.verbose);
        Self { args, output }
    }

    pub async fn run(&self) -> Result<(), GrabError> {
        let request = self.build_request()?;
        let grabber = FrameGrabber::new(".").await?;

        self.output.print_start(&request);
        let report = grabber.run(&request).await?;
        self.output.print_report(&report);

        Ok(())
    }

    fn build_request(&self) -> Result<BurstRequest, GrabError> {
        let url = Url::parse(&self.args.url).map_err(|e| GrabError::InvalidUrl(e.to_string()))?;
        let start = self
            .args
            .start
            .as_deref()
            .map(str::parse::<Timecode>)
            .transpose()?;
        let plan = BurstPlan::new(self.args.count, self.args.interval)?;

        Ok(BurstRequest {
            url,
            start,
            plan,
            outdir: self.args.outdir.clone(),
            prefix: self.args.prefix.clone(),
            discard_video: self.args.discard_video,
        })
    }

    pub fn print_error(&self, error: &GrabError) {
        self.output.print_error(error);
    }
}
