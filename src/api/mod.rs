pub mod middleware;
pub mod routes;

pub use middleware::{handle_panic, log_request_errors};
pub use routes::{UploadResponse, serve_video, upload_video};

/// Multipart field the endpoint reads the video from.
pub const VIDEO_FIELD: &str = "video";

pub const UPLOAD_PATH: &str = "/api/upload";
