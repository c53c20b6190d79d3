pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod processing;
pub mod widget;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Extension};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

//
// Re-export
//
pub use api::{UPLOAD_PATH, UploadResponse, VIDEO_FIELD, serve_video, upload_video};
pub use app_state::AppState;
pub use config::Config;
pub use error::{ErrorBody, UNEXPECTED_ERROR, UploadError};
pub use processing::{ProcessedVideo, Processor, ReceivedUpload, SimulatedProcessor};
pub use widget::{SelectedFile, UploadCompletion, UploadStatus, UploadWidget};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(UPLOAD_PATH, post(upload_video))
        .route("/{filename}", get(serve_video))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(CatchPanicLayer::custom(api::handle_panic))
        .layer(axum::middleware::from_fn(api::log_request_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(state))
}

/// Serves the upload API on an already bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::new(&config);

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Upload API listening on {addr}");

    serve(listener, state).await?;
    Ok(())
}
