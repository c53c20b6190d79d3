use crate::api::VIDEO_FIELD;
use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Message used when a server failure carries no message of its own.
pub const UNEXPECTED_ERROR: &str = "Unexpected processing error.";

/// Body of every failed upload response.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Upload endpoint failures
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Upload a video file using the `{field}` field.", field = VIDEO_FIELD)]
    MissingVideo,

    /// The request body could not be read as `multipart/form-data`.
    #[error("{0}")]
    Malformed(String),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Processing(anyhow::Error),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::MissingVideo => StatusCode::BAD_REQUEST,
            UploadError::Malformed(_)
            | UploadError::Multipart(_)
            | UploadError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message, never empty
    pub fn message(&self) -> String {
        let message = match self {
            UploadError::Multipart(error) => error.body_text(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            UNEXPECTED_ERROR.to_string()
        } else {
            message
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(error = ?self, %message, "Upload processing failed");
        } else {
            warn!(%message, "Upload rejected");
        }

        error_response(status, message)
    }
}

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_video_message() {
        let error = UploadError::MissingVideo;
        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            error.message(),
            "Upload a video file using the `video` field."
        );
    }

    #[test]
    fn test_processing_error_keeps_message() {
        let error = UploadError::Processing(anyhow::anyhow!("encoder crashed"));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message(), "encoder crashed");
    }

    #[test]
    fn test_unlabeled_error_falls_back() {
        let error = UploadError::Processing(anyhow::anyhow!(""));
        assert_eq!(error.message(), UNEXPECTED_ERROR);

        let error = UploadError::Malformed("  ".into());
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message(), UNEXPECTED_ERROR);
    }
}
