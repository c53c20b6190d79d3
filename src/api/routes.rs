use crate::AppState;
use crate::api::VIDEO_FIELD;
use crate::error::UploadError;
use crate::processing::ReceivedUpload;
use axum::body::Body;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Extension, Multipart, Path as AxumPath};
use axum::http::{HeaderMap, HeaderValue, Response, StatusCode, header};
use axum::response::{IntoResponse, Json};
use mime_guess::from_path;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info, warn};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub video_url: String,
}

#[axum::debug_handler]
pub async fn upload_video(
    Extension(state): Extension<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, UploadError> {
    let mut multipart =
        multipart.map_err(|rejection| UploadError::Malformed(rejection.body_text()))?;

    let upload = read_video_field(&mut multipart).await?;
    info!(
        file_name = %upload.file_name,
        content_type = ?upload.content_type,
        size = upload.size,
        "Upload received"
    );

    let processed = state
        .processor
        .process(upload)
        .await
        .map_err(UploadError::Processing)?;

    Ok(Json(UploadResponse {
        video_url: processed.video_url,
    }))
}

/// Drains the first `video` part; it has to be a file part.
///
/// A body that ends before its first part (an empty form) carries no field.
async fn read_video_field(multipart: &mut Multipart) -> Result<ReceivedUpload, UploadError> {
    let mut seen_field = false;
    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) if !seen_field => {
                debug!(%error, "Form ended before its first part");
                break;
            }
            Err(error) => return Err(error.into()),
        };
        seen_field = true;

        if field.name() != Some(VIDEO_FIELD) {
            debug!(name = ?field.name(), "Skipping unrelated form field");
            continue;
        }

        let Some(file_name) = field.file_name().map(str::to_owned) else {
            return Err(UploadError::MissingVideo);
        };
        let content_type = field.content_type().map(str::to_owned);

        let mut size = 0u64;
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len() as u64;
        }

        return Ok(ReceivedUpload {
            file_name,
            content_type,
            size,
        });
    }

    Err(UploadError::MissingVideo)
}

fn is_valid_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..")
        && filename.len() <= 255
}

pub async fn serve_video(
    Extension(state): Extension<AppState>,
    AxumPath(filename): AxumPath<String>,
    headers: HeaderMap,
) -> Response<Body> {
    if !is_valid_filename(&filename) {
        warn!(%filename, "Invalid filename");
        return (StatusCode::BAD_REQUEST, "Invalid filename").into_response();
    }

    let path = state.public_dir().join(&filename);
    debug!(%filename, ?path, "Request served file");

    let Ok(mut fh) = tokio::fs::File::open(&path).await else {
        return file_not_found();
    };
    let size = match fh.metadata().await {
        Ok(metadata) if metadata.is_file() => metadata.len(),
        _ => return file_not_found(),
    };

    let Some(range) = parse_range(&headers, size) else {
        let mut res = (StatusCode::RANGE_NOT_SATISFIABLE, "Range not satisfiable").into_response();
        if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
            res.headers_mut().insert(header::CONTENT_RANGE, value);
        }
        return res;
    };

    if let Err(error) = fh.seek(std::io::SeekFrom::Start(range.start)).await {
        error!(%filename, %error, "Failed to seek served file");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response();
    }

    let stream = ReaderStream::new(fh.take(range.len));
    let mut res = Response::new(Body::from_stream(stream));
    *res.status_mut() = range.status;

    let headers = res.headers_mut();
    if let Ok(value) = HeaderValue::from_str(from_path(&path).first_or_octet_stream().as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public,max-age=3600"),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(range.len));
    if range.status == StatusCode::PARTIAL_CONTENT
        && let Ok(value) = HeaderValue::from_str(&format!(
            "bytes {}-{}/{size}",
            range.start,
            range.start + range.len - 1
        ))
    {
        headers.insert(header::CONTENT_RANGE, value);
    }

    res
}

fn file_not_found() -> Response<Body> {
    (StatusCode::NOT_FOUND, "File not found").into_response()
}

#[derive(Debug, PartialEq, Eq)]
struct ByteRange {
    status: StatusCode,
    start: u64,
    len: u64,
}

/// `None` means the requested range lies outside the file.
fn parse_range(headers: &HeaderMap, file_size: u64) -> Option<ByteRange> {
    if let Some(value) = headers.get(header::RANGE)
        && let Ok(value) = value.to_str()
        && let Some(spec) = value.strip_prefix("bytes=")
        && let Some((start, end)) = spec.split_once('-')
        && let Ok(start) = start.trim().parse::<u64>()
    {
        if start >= file_size {
            return None;
        }
        let last = file_size - 1;
        let end = end.trim().parse::<u64>().map_or(last, |end| end.min(last));
        if end < start {
            return None;
        }
        return Some(ByteRange {
            status: StatusCode::PARTIAL_CONTENT,
            start,
            len: end - start + 1,
        });
    }

    Some(ByteRange {
        status: StatusCode::OK,
        start: 0,
        len: file_size,
    })
}
