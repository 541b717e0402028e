use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("UploadMissingFile")]
    MissingFile,
    #[error("UploadExtensionNotAllowed: {extension:?}")]
    ExtensionNotAllowed { extension: String },
    #[error("UploadTooLarge: limit is {limit} bytes")]
    TooLarge { limit: usize },
    #[error("UploadMultipart: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
    #[error("UploadIo: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingFile | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::ExtensionNotAllowed { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::MissingFile => String::from("Upload error, no `file` field in request."),
            Self::ExtensionNotAllowed { extension } => {
                format!("Upload error, extension `{extension}` is not allowed.")
            }
            Self::TooLarge { limit } => format!("Upload error, file exceeds {limit} bytes."),
            Self::Multipart(_) => String::from("Upload error, malformed multipart body."),
            Self::Io(_) => String::from("Internal server error."),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub stored_name: String,
    pub path: PathBuf,
    pub size: usize,
}

/// Resolves the configured uploads directory against the working directory.
pub fn get_uploads_dir(configured: &str) -> std::io::Result<PathBuf> {
    let configured = Path::new(configured);
    if configured.is_absolute() {
        return Ok(configured.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(configured))
}

/// Lower-cased extension of `file_name` if it is on the allow-list.
pub fn checked_extension(file_name: &str, allowed: &[String]) -> Result<String, UploadError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if extension.is_empty() || !allowed.iter().any(|a| a.eq_ignore_ascii_case(&extension)) {
        return Err(UploadError::ExtensionNotAllowed { extension });
    }

    Ok(extension)
}

/// Writes `bytes` under a fresh random name; client file names never touch the disk.
pub async fn store_file(dir: &Path, extension: &str, bytes: &[u8]) -> Result<StoredFile, UploadError> {
    tokio::fs::create_dir_all(dir).await?;

    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
    let path = dir.join(&stored_name);
    tokio::fs::write(&path, bytes).await?;

    tracing::debug!("stored upload {} ({} bytes)", path.display(), bytes.len());
    Ok(StoredFile {
        stored_name,
        path,
        size: bytes.len(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["pdf".into(), "zip".into(), "png".into()]
    }

    #[test]
    fn extension_is_case_insensitive() {
        assert_eq!(checked_extension("Report.PDF", &allowed()).unwrap(), "pdf");
        assert_eq!(checked_extension("archive.tar.zip", &allowed()).unwrap(), "zip");
    }

    #[test]
    fn disallowed_or_missing_extension_is_rejected() {
        assert!(matches!(
            checked_extension("payload.exe", &allowed()),
            Err(UploadError::ExtensionNotAllowed { .. })
        ));
        assert!(matches!(
            checked_extension("README", &allowed()),
            Err(UploadError::ExtensionNotAllowed { .. })
        ));
        assert_eq!(
            UploadError::ExtensionNotAllowed { extension: "exe".into() }.status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
    }

    #[test]
    fn absolute_uploads_dir_is_kept() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = get_uploads_dir(temp_dir.path().to_str().unwrap()).unwrap();
        assert_eq!(dir, temp_dir.path());
    }

    #[tokio::test]
    async fn store_file_writes_under_random_name() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("nested");

        let stored = store_file(&nested, "pdf", b"%PDF-1.4").await.unwrap();
        assert!(stored.stored_name.ends_with(".pdf"));
        assert_eq!(stored.size, 8);
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"%PDF-1.4");
    }
}
