use anyhow::Result;
use clap::Args;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Upload service configuration, loaded from CLI flags and an optional TOML file
///
/// Example configuration file content
/// # PlayVoice upload service
///
/// listen_on_port = 3000
/// host = "0.0.0.0"
///
/// # Simulated processing
/// processing_delay_ms = 5000
/// video_url = "/commented.mp4"
///
/// # Result video delivery
/// public_dir = "./public"
/// max_upload_mb = 2048
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
#[serde(default)]
pub struct Config {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    #[serde(default = "default_port")]
    pub listen_on_port: u16,

    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    #[serde(default = "default_host")]
    pub host: String,

    /// Simulated processing time per upload, in milliseconds
    #[arg(short = 'd', long, default_value_t = 5000)]
    #[serde(default = "default_processing_delay_ms")]
    pub processing_delay_ms: u64,

    /// URL returned for every accepted upload
    #[arg(short, long, default_value = "/commented.mp4")]
    #[serde(default = "default_video_url")]
    pub video_url: String,

    /// Directory the result videos are served from
    #[arg(short, long, default_value = "public")]
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Request body limit in MiB
    #[arg(short, long, default_value_t = 2048)]
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,

    /// Configuration file path
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_on_port: default_port(),
            host: default_host(),
            processing_delay_ms: default_processing_delay_ms(),
            video_url: default_video_url(),
            public_dir: default_public_dir(),
            max_upload_mb: default_max_upload_mb(),
            config: None,
        }
    }
}

impl Config {
    /// Merge in the config file named by `--config`, if any, then validate
    pub fn resolve(mut self) -> Result<Self> {
        if let Some(config_path) = &self.config {
            let file_config = Self::from_file(Path::new(config_path))?;
            self = self.merge_with_file(file_config);
        }

        self.validate()?;
        Ok(self)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// CLI values win unless they are still the default
    fn merge_with_file(mut self, file_config: Config) -> Self {
        if self.listen_on_port == default_port() {
            self.listen_on_port = file_config.listen_on_port;
        }
        if self.host == default_host() {
            self.host = file_config.host;
        }
        if self.processing_delay_ms == default_processing_delay_ms() {
            self.processing_delay_ms = file_config.processing_delay_ms;
        }
        if self.video_url == default_video_url() {
            self.video_url = file_config.video_url;
        }
        if self.public_dir == default_public_dir() {
            self.public_dir = file_config.public_dir;
        }
        if self.max_upload_mb == default_max_upload_mb() {
            self.max_upload_mb = file_config.max_upload_mb;
        }

        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.video_url.trim().is_empty() {
            return Err(anyhow::anyhow!("Video URL cannot be empty"));
        }
        if !self.video_url.starts_with('/')
            && !self.video_url.starts_with("http://")
            && !self.video_url.starts_with("https://")
        {
            return Err(anyhow::anyhow!(
                "Video URL must start with '/', http:// or https://"
            ));
        }
        if self.max_upload_mb == 0 {
            return Err(anyhow::anyhow!("Upload limit must be at least 1 MiB"));
        }

        Ok(())
    }

    pub fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.listen_on_port)
    }
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_processing_delay_ms() -> u64 {
    5000
}

fn default_video_url() -> String {
    "/commented.mp4".to_string()
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_max_upload_mb() -> usize {
    2048
}
