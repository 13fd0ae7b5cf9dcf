use crate::types::GrabError;
use async_trait::async_trait;
use std::path::Path;
use timecode::Timecode;
use tokio::process::Command;

#[async_trait]
pub trait FrameExtractor {
    async fn check_available(&self) -> Result<(), GrabError>;

    /// Seek to `at` in the local file and write a single still frame.
    async fn grab_frame(
        &self,
        input: &Path,
        at: Timecode,
        output: &Path,
    ) -> Result<(), GrabError>;
}

pub struct Ffmpeg;

#[async_trait]
impl FrameExtractor for Ffmpeg {
    async fn check_available(&self) -> Result<(), GrabError> {
        which::which("ffmpeg")
            .map(|_| ())
            .map_err(|_| GrabError::ToolNotFound("ffmpeg"))
    }

    async fn grab_frame(
        &self,
        input: &Path,
        at: Timecode,
        output: &Path,
    ) -> Result<(), GrabError> {
        // -ss after -i: slower, but seeks are frame-accurate.
        let result = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-nostdin")
            .arg("-i")
            .arg(input)
            .arg("-ss")
            .arg(at.to_string())
            .arg("-frames:v")
            .arg("1")
            .arg("-y")
            .arg(output)
            .output()
            .await?;

        if !result.status.success() {
            return Err(GrabError::FrameCapture {
                at: at.to_string(),
                reason: String::from_utf8_lossy(&result.stderr).trim().to_owned(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
pub mod stub {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every requested offset and writes a placeholder frame,
    /// optionally failing once a number of frames have been captured.
    pub struct ExtractorStub {
        pub captured: Arc<Mutex<Vec<Timecode>>>,
        pub fail_after: Option<usize>,
    }

    impl ExtractorStub {
        /// A stub plus a handle to the offsets it will record.
        pub fn recording() -> (Self, Arc<Mutex<Vec<Timecode>>>) {
            let captured = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    captured: captured.clone(),
                    fail_after: None,
                },
                captured,
            )
        }
    }

    #[async_trait]
    impl FrameExtractor for ExtractorStub {
        async fn check_available(&self) -> Result<(), GrabError> {
            Ok(())
        }

        async fn grab_frame(
            &self,
            _input: &Path,
            at: Timecode,
            output: &Path,
        ) -> Result<(), GrabError> {
            let mut captured = self.captured.lock().unwrap();
            if self.fail_after == Some(captured.len()) {
                return Err(GrabError::FrameCapture {
                    at: at.to_string(),
                    reason: "stub failure".to_string(),
                });
            }
            captured.push(at);
            std::fs::write(output, b"frame")?;
            Ok(())
        }
    }
}
