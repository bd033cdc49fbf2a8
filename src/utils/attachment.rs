// Attachment checks for ES files

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Largest accepted attachment (10 MB)
pub const MAX_ATTACHMENT_SIZE: u64 = 10 * 1024 * 1024;

/// Accepted attachment extensions. Files without an extension are accepted too.
pub const ALLOWED_EXTENSIONS: [&str; 5] = [".pdf", ".doc", ".docx", ".txt", ".md"];

#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a regular file")]
    NotAFile(String),
    #[error("File size must be under {max_mb}MB. Current size: {size_mb:.1}MB")]
    TooLarge { max_mb: u64, size_mb: f64 },
    #[error("File type '{ext}' not allowed. Allowed: {allowed}")]
    DisallowedType { ext: String, allowed: String },
}

/// Lowercased extension with its leading dot, or empty when the name has none
pub fn attachment_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Check an attachment and return its absolute path
pub fn validate_attachment(path: &Path) -> Result<PathBuf, AttachmentError> {
    let unreadable = |source| AttachmentError::Unreadable {
        path: path.display().to_string(),
        source,
    };
    let metadata = std::fs::metadata(path).map_err(unreadable)?;
    if !metadata.is_file() {
        return Err(AttachmentError::NotAFile(path.display().to_string()));
    }

    if metadata.len() > MAX_ATTACHMENT_SIZE {
        return Err(AttachmentError::TooLarge {
            max_mb: MAX_ATTACHMENT_SIZE / (1024 * 1024),
            size_mb: metadata.len() as f64 / 1024.0 / 1024.0,
        });
    }

    let ext = attachment_extension(path);
    if !ext.is_empty() && !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AttachmentError::DisallowedType {
            ext,
            allowed: ALLOWED_EXTENSIONS.join(", "),
        });
    }

    std::fs::canonicalize(path).map_err(unreadable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extension() {
        assert_eq!(attachment_extension(Path::new("es/final.PDF")), ".pdf");
        assert_eq!(attachment_extension(Path::new("notes")), "");
    }

    #[test]
    fn test_accepts_allowed_and_bare_names() {
        let dir = TempDir::new().unwrap();
        for name in ["es.pdf", "draft.docx", "README"] {
            let path = dir.path().join(name);
            fs::write(&path, b"content").unwrap();
            let validated = validate_attachment(&path).unwrap();
            assert!(validated.is_absolute());
            assert!(validated.ends_with(name));
        }
    }

    #[test]
    fn test_rejects_disallowed_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("setup.exe");
        fs::write(&path, b"MZ").unwrap();
        let err = validate_attachment(&path).unwrap_err();
        assert!(matches!(err, AttachmentError::DisallowedType { .. }));
        assert!(err.to_string().starts_with("File type '.exe' not allowed"));
    }

    #[test]
    fn test_rejects_oversized_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.pdf");
        let file = fs::File::create(&path).unwrap();
        file.set_len(MAX_ATTACHMENT_SIZE + 1).unwrap();
        let err = validate_attachment(&path).unwrap_err();
        assert!(matches!(err, AttachmentError::TooLarge { max_mb: 10, .. }));
        assert!(err.to_string().contains("under 10MB"));
    }

    #[test]
    fn test_rejects_missing_and_directories() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            validate_attachment(&dir.path().join("missing.pdf")),
            Err(AttachmentError::Unreadable { .. })
        ));
        assert!(matches!(
            validate_attachment(dir.path()),
            Err(AttachmentError::NotAFile(_))
        ));
    }
}
