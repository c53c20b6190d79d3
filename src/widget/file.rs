use crate::api::VIDEO_FIELD;
use reqwest::multipart::{Form, Part};
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;

#[derive(Clone, Debug, PartialEq, Eq)]
enum FileSource {
    Memory(Vec<u8>),
    /// Opened and streamed only when the form is sent.
    Disk(PathBuf),
}

/// A file picked for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    source: FileSource,
    len: u64,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        let len = bytes.len() as u64;
        Self::with_source(file_name.into(), FileSource::Memory(bytes), len)
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a file", path.display()),
            ));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        Ok(Self::with_source(
            file_name,
            FileSource::Disk(path.to_path_buf()),
            metadata.len(),
        ))
    }

    fn with_source(file_name: String, source: FileSource, len: u64) -> Self {
        let content_type = mime_guess::from_path(&file_name)
            .first()
            .map(|mime| mime.essence_str().to_owned());

        Self {
            file_name,
            content_type,
            source,
            len,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Matches the picker's `video/*` filter. Advisory only.
    pub fn is_video(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("video/"))
    }

    pub(crate) async fn into_form(self) -> anyhow::Result<Form> {
        let part = match self.source {
            FileSource::Memory(bytes) => Part::bytes(bytes),
            FileSource::Disk(path) => {
                let file = tokio::fs::File::open(&path).await?;
                let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
                Part::stream_with_length(body, self.len)
            }
        };
        let part = part.file_name(self.file_name);
        let part = match self.content_type {
            Some(content_type) => part.mime_str(&content_type)?,
            None => part,
        };

        Ok(Form::new().part(VIDEO_FIELD, part))
    }
}
