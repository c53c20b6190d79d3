use serde_json::Value as JsonValue;
use std::fmt;

/// Shown when the endpoint answers with anything but a usable `videoUrl`.
pub const REJECTED_MESSAGE: &str = "We couldn't process that upload. Try again.";
/// Shown when no response could be obtained at all.
pub const TRANSPORT_MESSAGE: &str = "Something went wrong during upload.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Idle => "idle",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }

    pub fn trigger_label(&self) -> &'static str {
        match self {
            UploadStatus::Uploading => "Processing...",
            _ => "Upload a game",
        }
    }

    /// Status panel text, if the status has one.
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            UploadStatus::Uploading => Some("We're generating the new broadcast. Hang tight!"),
            UploadStatus::Success => Some("Your narrated game is ready"),
            UploadStatus::Idle | UploadStatus::Error => None,
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of one submission, handed to the completion callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadCompletion {
    Success { video_url: String },
    Failure { message: String },
}

impl UploadCompletion {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadCompletion::Success { .. })
    }
}

/// Decides the outcome of a response the endpoint did send.
///
/// Success needs a 2xx status and a JSON body with a string `videoUrl`.
/// Anything else fails with the body's `error` string, or
/// [`REJECTED_MESSAGE`] when that is missing or empty.
pub fn interpret_response(ok: bool, body: &[u8]) -> UploadCompletion {
    let data = serde_json::from_slice::<JsonValue>(body).ok();

    let video_url = data
        .as_ref()
        .and_then(|data| data.get("videoUrl"))
        .and_then(JsonValue::as_str);
    if ok && let Some(video_url) = video_url {
        return UploadCompletion::Success {
            video_url: video_url.to_owned(),
        };
    }

    let message = data
        .as_ref()
        .and_then(|data| data.get("error"))
        .and_then(JsonValue::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or(REJECTED_MESSAGE);

    UploadCompletion::Failure {
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(message: &str) -> UploadCompletion {
        UploadCompletion::Failure {
            message: message.into(),
        }
    }

    #[test]
    fn test_success_needs_ok_status_and_string_url() {
        assert_eq!(
            interpret_response(true, br#"{"videoUrl":"/commented.mp4"}"#),
            UploadCompletion::Success {
                video_url: "/commented.mp4".into()
            }
        );

        // a url on an error status is not trusted
        assert_eq!(
            interpret_response(false, br#"{"videoUrl":"/commented.mp4"}"#),
            failure(REJECTED_MESSAGE)
        );
    }

    #[test]
    fn test_unusable_bodies_fail_with_fallback() {
        let bodies: [&[u8]; 6] = [
            b"<html>Bad Gateway</html>",
            b"",
            b"null",
            b"[1, 2]",
            br#"{"videoUrl": 7}"#,
            br#"{"video_url": "/commented.mp4"}"#,
        ];
        for body in bodies {
            assert_eq!(interpret_response(true, body), failure(REJECTED_MESSAGE));
        }
    }

    #[test]
    fn test_error_field_becomes_message() {
        assert_eq!(
            interpret_response(
                false,
                br#"{"error":"Upload a video file using the `video` field."}"#
            ),
            failure("Upload a video file using the `video` field.")
        );

        // empty or non-string errors are not shown
        assert_eq!(
            interpret_response(false, br#"{"error":""}"#),
            failure(REJECTED_MESSAGE)
        );
        assert_eq!(
            interpret_response(false, br#"{"error":{"code":500}}"#),
            failure(REJECTED_MESSAGE)
        );
    }

    #[test]
    fn test_status_presentation() {
        assert_eq!(UploadStatus::default(), UploadStatus::Idle);
        assert_eq!(UploadStatus::Uploading.trigger_label(), "Processing...");
        assert_eq!(UploadStatus::Error.trigger_label(), "Upload a game");
        assert!(UploadStatus::Error.notice().is_none());
        assert_eq!(UploadStatus::Success.to_string(), "success");
    }
}
