//! Upload payloads and byte-level progress reporting.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use filehub_core::{ClientError, ClientResult};
use futures::stream::{self, Stream, StreamExt};

/// Size of the slices handed to the transport; one progress event per slice.
pub const PROGRESS_CHUNK_SIZE: usize = 64 * 1024;

/// A file selected for upload. Immutable once created.
#[derive(Clone, PartialEq, Eq)]
pub struct FileRef {
    pub name: String,
    pub size: u64,
    pub mime: String,
    pub data: Bytes,
}

impl std::fmt::Debug for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileRef")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("mime", &self.mime)
            .finish_non_exhaustive()
    }
}

impl FileRef {
    /// Build from in-memory bytes; the MIME type is guessed from `name`.
    pub fn from_bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        let data = data.into();
        let mime = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            size: data.len() as u64,
            name,
            mime,
            data,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                ClientError::validation(format!("Not a file path: {}", path.display()))
            })?
            .to_string();

        let data = tokio::fs::read(path).await.map_err(|e| {
            ClientError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })?;

        Ok(Self::from_bytes(name, data))
    }
}

/// Bytes handed to the transport so far, out of `total` when known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub sent: u64,
    pub total: Option<u64>,
}

impl UploadProgress {
    /// `round(sent * 100 / total)`, capped at 100. `None` when the total is
    /// unknown or zero.
    pub fn percent(&self) -> Option<u8> {
        let total = self.total.filter(|t| *t > 0)?;
        let rounded = (self.sent as u128 * 200 + total as u128) / (2 * total as u128);
        Some(rounded.min(100) as u8)
    }
}

pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// Stream `data` in fixed-size slices, reporting progress as each slice is
/// pulled by the transport.
pub fn progress_stream(
    data: Bytes,
    on_progress: ProgressFn,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static {
    let total = data.len() as u64;
    let chunks: Vec<Bytes> = (0..data.len())
        .step_by(PROGRESS_CHUNK_SIZE)
        .map(|start| data.slice(start..(start + PROGRESS_CHUNK_SIZE).min(data.len())))
        .collect();

    let mut sent = 0u64;
    stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        on_progress(UploadProgress {
            sent,
            total: Some(total),
        });
        Ok(chunk)
    })
}
