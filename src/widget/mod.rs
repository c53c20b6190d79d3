//! Client side of the upload flow.
//!
//! [`UploadWidget`] submits one file at a time to the upload endpoint and
//! tracks where that submission stands. The terminal result is returned from
//! [`UploadWidget::submit`] and also passed to the completion callback, if one
//! is set.

pub mod file;
pub mod status;

pub use file::SelectedFile;
pub use status::{
    REJECTED_MESSAGE, TRANSPORT_MESSAGE, UploadCompletion, UploadStatus, interpret_response,
};

use tracing::{debug, info, warn};

type CompletionCallback = Box<dyn FnMut(&UploadCompletion) + Send>;
type StatusCallback = Box<dyn FnMut(UploadStatus) + Send>;

pub struct UploadWidget {
    client: reqwest::Client,
    endpoint: String,
    status: UploadStatus,
    video_url: Option<String>,
    error: Option<String>,
    on_complete: Option<CompletionCallback>,
    on_status_change: Option<StatusCallback>,
}

impl UploadWidget {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            status: UploadStatus::Idle,
            video_url: None,
            error: None,
            on_complete: None,
            on_status_change: None,
        }
    }

    pub fn on_complete(mut self, callback: impl FnMut(&UploadCompletion) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Called with every new status, so callers can render its notice.
    pub fn on_status_change(mut self, callback: impl FnMut(UploadStatus) + Send + 'static) -> Self {
        self.on_status_change = Some(Box::new(callback));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn video_url(&self) -> Option<&str> {
        self.video_url.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The file trigger is disabled while an upload is in flight.
    pub fn is_trigger_enabled(&self) -> bool {
        self.status != UploadStatus::Uploading
    }

    /// Submits `file` and waits for the outcome.
    pub async fn submit(&mut self, file: SelectedFile) -> UploadCompletion {
        self.begin();
        info!(endpoint = %self.endpoint, file_name = %file.file_name, size = file.len(), "Uploading");

        let completion = self.send(file).await;
        self.finish(&completion);

        if let Some(callback) = self.on_complete.as_mut() {
            callback(&completion);
        }
        completion
    }

    /// Clears the previous outcome before a new request goes out.
    fn begin(&mut self) {
        self.error = None;
        self.video_url = None;
        self.set_status(UploadStatus::Uploading);
    }

    fn finish(&mut self, completion: &UploadCompletion) {
        match completion {
            UploadCompletion::Success { video_url } => {
                self.video_url = Some(video_url.clone());
                self.set_status(UploadStatus::Success);
            }
            UploadCompletion::Failure { message } => {
                self.error = Some(message.clone());
                self.set_status(UploadStatus::Error);
            }
        }
    }

    fn set_status(&mut self, status: UploadStatus) {
        self.status = status;
        if let Some(callback) = self.on_status_change.as_mut() {
            callback(status);
        }
    }

    async fn send(&self, file: SelectedFile) -> UploadCompletion {
        let form = match file.into_form().await {
            Ok(form) => form,
            Err(error) => {
                warn!(%error, "Failed to build upload form");
                return transport_failure();
            }
        };

        let response = match self.client.post(&self.endpoint).multipart(form).send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, endpoint = %self.endpoint, "Upload request failed");
                return transport_failure();
            }
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(error) => {
                warn!(%error, %status, "Failed to read upload response");
                return transport_failure();
            }
        };
        debug!(%status, len = body.len(), "Upload response received");

        interpret_response(status.is_success(), &body)
    }
}

fn transport_failure() -> UploadCompletion {
    UploadCompletion::Failure {
        message: TRANSPORT_MESSAGE.to_string(),
    }
}
