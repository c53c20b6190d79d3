use futures::future::BoxFuture;
use std::time::Duration;
use tracing::{debug, info};

/// A video file accepted by the upload endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    /// Bytes received for the file part. The bytes themselves are not kept.
    pub size: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedVideo {
    pub video_url: String,
}

/// Turns an accepted upload into a playable result.
pub trait Processor: Send + Sync + 'static {
    fn process(&self, upload: ReceivedUpload) -> BoxFuture<'static, anyhow::Result<ProcessedVideo>>;
}

/// Stand-in for the commentary pipeline: waits, then hands back a fixed video.
#[derive(Clone, Debug)]
pub struct SimulatedProcessor {
    delay: Duration,
    video_url: String,
}

impl SimulatedProcessor {
    pub fn new(delay: Duration, video_url: impl Into<String>) -> Self {
        Self {
            delay,
            video_url: video_url.into(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn video_url(&self) -> &str {
        &self.video_url
    }
}

impl Processor for SimulatedProcessor {
    fn process(&self, upload: ReceivedUpload) -> BoxFuture<'static, anyhow::Result<ProcessedVideo>> {
        let delay = self.delay;
        let video_url = self.video_url.clone();

        Box::pin(async move {
            info!(
                file_name = %upload.file_name,
                size = upload.size,
                delay_ms = delay.as_millis() as u64,
                "Generating broadcast"
            );
            tokio::time::sleep(delay).await;
            debug!(file_name = %upload.file_name, %video_url, "Broadcast ready");

            Ok(ProcessedVideo { video_url })
        })
    }
}
