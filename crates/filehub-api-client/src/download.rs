//! Downloaded payloads: saving to disk and short-lived local copies.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use filehub_core::{ClientError, ClientResult};
use tempfile::NamedTempFile;

const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Body of a binary endpoint together with its resolved filename.
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl std::fmt::Debug for DownloadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.data.len())
            .finish()
    }
}

impl DownloadedFile {
    /// Write into `dir` without overwriting anything already there.
    ///
    /// Data goes to a temporary file inside `dir` first and is then renamed
    /// into place as `name.ext`, `name (1).ext`, `name (2).ext`, ...
    pub async fn save_into(&self, dir: impl AsRef<Path>) -> ClientResult<PathBuf> {
        let dir = dir.as_ref().to_path_buf();
        let filename = self.filename.clone();
        let data = self.data.clone();

        tokio::task::spawn_blocking(move || persist_unique(&dir, &filename, &data))
            .await
            .map_err(|e| ClientError::Io(io::Error::other(e.to_string())))?
    }

    /// Copy into a temporary file that is deleted when the blob is dropped.
    pub fn into_transient(self) -> ClientResult<TransientBlob> {
        let suffix = Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let mut file = tempfile::Builder::new()
            .prefix("filehub-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&self.data)?;
        file.flush()?;

        Ok(TransientBlob {
            file,
            filename: self.filename,
            content_type: self.content_type,
            len: self.data.len() as u64,
        })
    }
}

/// A local copy of remote content, removed from disk on drop.
#[derive(Debug)]
pub struct TransientBlob {
    file: NamedTempFile,
    filename: String,
    content_type: Option<String>,
    len: u64,
}

impl TransientBlob {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Delete the backing file now, reporting any error.
    pub fn release(self) -> ClientResult<()> {
        self.file.close()?;
        Ok(())
    }
}

fn persist_unique(dir: &Path, filename: &str, data: &[u8]) -> ClientResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(data)?;
    temp.as_file().sync_all()?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let candidate = dir.join(numbered_name(filename, attempt));
        match temp.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => temp = err.file,
            Err(err) => return Err(err.error.into()),
        }
    }

    Err(ClientError::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("No free name for {} in {}", filename, dir.display()),
    )))
}

/// `report.pdf` -> `report (n).pdf`; `n == 0` keeps the name as is.
fn numbered_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", filename, n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report() -> DownloadedFile {
        DownloadedFile {
            filename: "report final.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            data: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[test]
    fn numbered_names() {
        assert_eq!(numbered_name("a.txt", 0), "a.txt");
        assert_eq!(numbered_name("a.txt", 2), "a (2).txt");
        assert_eq!(numbered_name(".env", 1), ".env (1)");
        assert_eq!(numbered_name("README", 1), "README (1)");
    }

    #[tokio::test]
    async fn save_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let first = report().save_into(dir.path()).await.unwrap();
        let second = report().save_into(dir.path()).await.unwrap();

        assert_eq!(first, dir.path().join("report final.pdf"));
        assert_eq!(second, dir.path().join("report final (1).pdf"));
        assert_eq!(std::fs::read(&second).unwrap(), b"%PDF-1.4");
    }

    #[test]
    fn transient_blob_is_removed_on_drop() {
        let blob = report().into_transient().unwrap();
        let path = blob.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        assert_eq!(blob.len(), 8);
        drop(blob);
        assert!(!path.exists());

        let blob = report().into_transient().unwrap();
        let path = blob.path().to_path_buf();
        blob.release().unwrap();
        assert!(!path.exists());
    }
}
