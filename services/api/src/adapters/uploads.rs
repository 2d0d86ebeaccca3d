//! services/api/src/adapters/uploads.rs
//!
//! Stores uploaded profile photos under a fixed directory. Extensions are
//! checked against an allow-list and filenames are reduced to an ASCII-safe
//! subset. A later upload with the same name overwrites the earlier file.

use std::path::PathBuf;

use civica_core::ports::{PortError, PortResult};

const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Saves uploaded files under one directory.
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes the upload to disk and returns the stored filename.
    pub async fn save(&self, original_name: &str, data: &[u8]) -> PortResult<String> {
        let name = sanitize_filename(original_name);
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| PortError::Invalid("File has no extension".to_string()))?;
        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(PortError::Invalid(format!(
                "File type '.{extension}' is not allowed"
            )));
        }

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let path = self.dir.join(&name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| PortError::Unexpected(format!("failed to store upload: {e}")))?;
        Ok(name)
    }
}

/// Strips path components and anything outside `[A-Za-z0-9._-]`.
fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);
    base.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn fresh_store() -> UploadStore {
        UploadStore::new(std::env::temp_dir().join(format!("civica-uploads-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn accepts_allowed_extension_and_sanitizes_name() {
        let store = fresh_store();
        let name = store.save("../..\\photo of me!.PNG", b"bytes").await.unwrap();
        assert_eq!(name, "photoofme.PNG");
        let on_disk = tokio::fs::read(store.dir.join(&name)).await.unwrap();
        assert_eq!(on_disk, b"bytes");
    }

    #[tokio::test]
    async fn rejects_disallowed_extension() {
        let store = fresh_store();
        let err = store.save("payload.exe", b"bytes").await.unwrap_err();
        assert!(matches!(err, PortError::Invalid(_)));
    }

    #[tokio::test]
    async fn same_name_silently_overwrites() {
        let store = fresh_store();
        store.save("me.png", b"first").await.unwrap();
        store.save("me.png", b"second").await.unwrap();
        let on_disk = tokio::fs::read(store.dir.join("me.png")).await.unwrap();
        assert_eq!(on_disk, b"second");
    }
}
