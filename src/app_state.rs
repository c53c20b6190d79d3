use crate::config::Config;
use crate::processing::{Processor, SimulatedProcessor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<dyn Processor>,
    pub public_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let public_dir = PathBuf::from(&config.public_dir);
        if !public_dir.is_dir() {
            warn!(public_dir = %public_dir.display(), "Public directory not found, result videos will 404");
        }

        let processor = SimulatedProcessor::new(config.processing_delay(), &config.video_url);
        info!(
            delay_ms = config.processing_delay_ms,
            video_url = %config.video_url,
            "Using simulated processing"
        );

        Self::with_processor(processor, public_dir, config.max_upload_bytes())
    }

    pub fn with_processor(
        processor: impl Processor,
        public_dir: impl Into<PathBuf>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            processor: Arc::new(processor),
            public_dir: public_dir.into(),
            max_upload_bytes,
        }
    }

    pub fn public_dir(&self) -> &Path {
        self.public_dir.as_path()
    }
}
