use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use playvoice::{Config, SelectedFile, UploadCompletion, UploadStatus, UploadWidget};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "PlayVoice upload service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the upload API
    Serve(Config),
    /// Submit a video to a running upload API
    Upload(UploadArgs),
}

#[derive(Debug, Args)]
struct UploadArgs {
    /// Upload endpoint
    #[arg(short, long, default_value = "http://127.0.0.1:3000/api/upload")]
    endpoint: String,

    /// Video file to submit
    file: PathBuf,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Command::Serve(config) => {
            let config = config.resolve().context("Failed to load configuration")?;
            playvoice::run(config).await
        }
        Command::Upload(args) => upload(args).await,
    }
}

async fn upload(args: UploadArgs) -> Result<()> {
    let file = SelectedFile::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if !file.is_video() {
        warn!(file_name = %file.file_name, content_type = ?file.content_type, "File does not look like a video, sending anyway");
    }

    let mut widget = UploadWidget::new(args.endpoint).on_status_change(print_notice);

    match widget.submit(file).await {
        UploadCompletion::Success { video_url } => {
            println!("{video_url}");
            Ok(())
        }
        UploadCompletion::Failure { message } => bail!(message),
    }
}

fn print_notice(status: UploadStatus) {
    if let Some(notice) = status.notice() {
        println!("{notice}");
    }
}
