//! Upload handler.

use std::path::{Path, PathBuf};

use tracing::info;

use anvil_forms_config::UploadPolicy;
use anvil_forms_core::{FormsError, FormsResult};
use anvil_forms_http::UploadedFile;

/// Validates uploaded files against a form's upload policy and stores them
/// in the upload directory.
pub struct UploadHandler {
    upload_dir: PathBuf,
}

impl UploadHandler {
    /// Creates the handler over the given upload directory.
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// The directory stored files land in.
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validates one file against the policy and writes it under a unique
    /// name. Returns the stored path.
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::Upload`] when the file exceeds the size limit
    /// or its extension is not in the allowlist.
    pub async fn store(
        &self,
        file: &UploadedFile,
        policy: &UploadPolicy,
        prefix: &str,
    ) -> FormsResult<PathBuf> {
        if file.size > policy.max_size {
            return Err(FormsError::Upload(format!(
                "File '{}' is {} bytes, over the limit of {} bytes",
                file.name, file.size, policy.max_size
            )));
        }

        if !policy.allowed_extensions.is_empty() {
            let extension = file.extension().unwrap_or_default();
            let allowed = policy
                .allowed_extensions
                .iter()
                .any(|e| e.to_lowercase() == extension);
            if !allowed {
                return Err(FormsError::Upload(format!(
                    "File extension '{extension}' is not allowed. Allowed extensions: {}",
                    policy.allowed_extensions.join(", ")
                )));
            }
        }

        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let stored_name = format!("{prefix}-{}", sanitize(&file.name));
        let path = self.upload_dir.join(stored_name);
        tokio::fs::write(&path, &file.content).await?;

        info!(
            original = %file.name,
            stored = %path.display(),
            size = file.size,
            "stored uploaded file"
        );
        Ok(path)
    }
}

/// Keeps filename characters that are safe on every filesystem.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    // A name of only separators still needs something to hold on to
    if cleaned.trim_matches(|c| c == '.' || c == '_' || c == '-').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            content_type: "application/octet-stream".to_string(),
            size,
            content: vec![0; size],
        }
    }

    fn policy(max_size: usize, extensions: &[&str]) -> UploadPolicy {
        UploadPolicy {
            max_size,
            allowed_extensions: extensions.iter().map(ToString::to_string).collect(),
        }
    }

    #[tokio::test]
    async fn test_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let handler = UploadHandler::new(dir.path());

        let path = handler
            .store(&file("cv.pdf", 10), &policy(100, &["pdf"]), "abc123")
            .await
            .unwrap();

        assert!(path.exists());
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("abc123-"));
        assert_eq!(std::fs::read(&path).unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let handler = UploadHandler::new(dir.path());

        let result = handler
            .store(&file("cv.pdf", 200), &policy(100, &["pdf"]), "abc123")
            .await;
        assert!(matches!(result, Err(FormsError::Upload(_))));
    }

    #[tokio::test]
    async fn test_store_rejects_disallowed_extension() {
        let dir = tempfile::tempdir().unwrap();
        let handler = UploadHandler::new(dir.path());

        let result = handler
            .store(&file("script.exe", 10), &policy(100, &["pdf", "txt"]), "abc123")
            .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[tokio::test]
    async fn test_store_empty_allowlist_accepts_any_extension() {
        let dir = tempfile::tempdir().unwrap();
        let handler = UploadHandler::new(dir.path());

        let result = handler
            .store(&file("anything.xyz", 10), &policy(100, &[]), "abc123")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_store_sanitizes_filename() {
        let dir = tempfile::tempdir().unwrap();
        let handler = UploadHandler::new(dir.path());

        let path = handler
            .store(&file("my file (1).pdf", 10), &policy(100, &["pdf"]), "abc123")
            .await
            .unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "abc123-my_file__1_.pdf");
    }

    #[test]
    fn test_sanitize_degenerate_name() {
        assert_eq!(sanitize("///"), "upload");
        assert_eq!(sanitize("..."), "upload");
    }
}
