//! Product image storage on the local filesystem.
//!
//! Uploaded files are written into a single directory that is also served
//! under a public URL prefix. Filenames are sanitized from the client-supplied
//! name; two uploads with the same sanitized name overwrite each other, and
//! removing one product's image removes the file any other product shares
//! under that name.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Public URL prefix under which the upload directory is served.
pub const PUBLIC_PREFIX: &str = "/static/img/products/";

/// Errors that can occur while storing or removing images.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The client-supplied filename has no usable characters.
    #[error("invalid image filename: {0:?}")]
    InvalidFilename(String),

    /// Filesystem operation failed.
    #[error("file error: {0}")]
    Io(#[from] io::Error),
}

/// An image file received from a form upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Filename as sent by the browser.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// An upload whose filename has been sanitized, ready to be written.
#[derive(Debug)]
pub struct PreparedUpload<'a> {
    file_name: String,
    bytes: &'a [u8],
}

impl PreparedUpload<'_> {
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// URL the file will be served under once written.
    #[must_use]
    pub fn public_url(&self) -> String {
        format!("{PUBLIC_PREFIX}{}", self.file_name)
    }
}

/// Directory-backed image store.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` if the directory cannot be created.
    pub async fn ensure_dir(&self) -> Result<(), UploadError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Check an upload's filename without touching the disk.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::InvalidFilename` if nothing survives sanitizing.
    pub fn prepare(upload: &ImageUpload) -> Result<PreparedUpload<'_>, UploadError> {
        let file_name = sanitize_filename(&upload.file_name)
            .ok_or_else(|| UploadError::InvalidFilename(upload.file_name.clone()))?;

        Ok(PreparedUpload {
            file_name,
            bytes: &upload.bytes,
        })
    }

    /// Whether a file with the prepared name is already in the directory.
    pub async fn exists(&self, prepared: &PreparedUpload<'_>) -> bool {
        tokio::fs::try_exists(self.dir.join(&prepared.file_name))
            .await
            .unwrap_or(false)
    }

    /// Write a prepared upload and return its public URL.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` if the file cannot be written.
    pub async fn write(&self, prepared: &PreparedUpload<'_>) -> Result<String, UploadError> {
        let path = self.dir.join(&prepared.file_name);
        tokio::fs::write(&path, prepared.bytes).await?;
        tracing::debug!(path = %path.display(), bytes = prepared.bytes.len(), "Saved product image");

        Ok(prepared.public_url())
    }

    /// Remove the file behind a public URL.
    ///
    /// Only the final path component of the URL is used, so a stored URL can
    /// never reach outside the upload directory. A file that is already gone
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::Io` for filesystem failures other than not-found.
    pub async fn remove(&self, public_url: &str) -> Result<(), UploadError> {
        let Some(path) = self.path_for(public_url) else {
            tracing::debug!(url = public_url, "Image URL has no file component, nothing to remove");
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed product image");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal: failures are logged and swallowed.
    pub async fn remove_logged(&self, public_url: &str) {
        if let Err(e) = self.remove(public_url).await {
            tracing::warn!(url = public_url, error = %e, "Failed to remove product image");
        }
    }

    /// Resolve a public URL to a path inside the upload directory.
    fn path_for(&self, public_url: &str) -> Option<PathBuf> {
        let last = public_url.rsplit('/').next()?;
        let file_name = sanitize_filename(last)?;
        Some(self.dir.join(file_name))
    }
}

/// Reduce a client-supplied filename to a safe, flat ASCII name.
///
/// Keeps only the last path component, folds whitespace runs into `_`,
/// drops everything outside `[A-Za-z0-9._-]` and trims leading and trailing
/// dots and underscores. Returns `None` if nothing is left.
#[must_use]
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut out = String::with_capacity(base.len());
    let mut pending_space = false;
    for c in base.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            out.push('_');
            pending_space = false;
        }
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_simple_names() {
        assert_eq!(sanitize_filename("cat.png").as_deref(), Some("cat.png"));
        assert_eq!(
            sanitize_filename("dog-food_2.JPG").as_deref(),
            Some("dog-food_2.JPG")
        );
    }

    #[test]
    fn test_sanitize_strips_directories() {
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\me\\photo.jpg").as_deref(),
            Some("photo.jpg")
        );
    }

    #[test]
    fn test_sanitize_replaces_whitespace_and_drops_symbols() {
        assert_eq!(
            sanitize_filename("my  cat (1).png").as_deref(),
            Some("my_cat_1.png")
        );
        assert_eq!(sanitize_filename("ñandú.gif").as_deref(), Some("and.gif"));
    }

    #[test]
    fn test_sanitize_rejects_empty_results() {
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename(".."), None);
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename("***"), None);
    }

    #[test]
    fn test_sanitized_names_never_contain_separators() {
        for input in ["a/b", "a\\b", "/abs/x.png", "..\\..\\y", "z/../../w"] {
            let name = sanitize_filename(input).unwrap();
            assert!(!name.contains('/') && !name.contains('\\'), "{input} -> {name}");
            assert!(!name.starts_with('.'));
        }
    }

    #[tokio::test]
    async fn test_write_and_remove_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let upload = ImageUpload {
            file_name: "Happy Dog.png".to_owned(),
            bytes: vec![1, 2, 3],
        };

        let url = store
            .write(&UploadStore::prepare(&upload).unwrap())
            .await
            .unwrap();

        assert_eq!(url, "/static/img/products/Happy_Dog.png");
        let path = dir.path().join("Happy_Dog.png");
        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![1, 2, 3]);

        store.remove(&url).await.unwrap();
        assert!(!path.exists());

        // Removing again is a no-op.
        store.remove(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_prepare_checks_name_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path());
        let upload = ImageUpload {
            file_name: "Happy Cat.png".to_owned(),
            bytes: vec![9],
        };

        let prepared = UploadStore::prepare(&upload).unwrap();
        assert_eq!(prepared.file_name(), "Happy_Cat.png");
        assert_eq!(prepared.public_url(), "/static/img/products/Happy_Cat.png");
        assert!(!store.exists(&prepared).await);

        store.write(&prepared).await.unwrap();
        assert!(store.exists(&prepared).await);

        assert!(matches!(
            UploadStore::prepare(&ImageUpload {
                file_name: "***".to_owned(),
                bytes: vec![9],
            }),
            Err(UploadError::InvalidFilename(_))
        ));
    }
}
