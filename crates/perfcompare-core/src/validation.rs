use std::path::Path;

use crate::error::CompareError;

/// Check that `path` names a readable file before any parser touches it.
///
/// `label` is a human-friendly name such as `"Baseline JTL"` used in the
/// error message.
pub async fn ensure_readable(path: impl AsRef<Path>, label: &str) -> Result<(), CompareError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(CompareError::Validation(format!(
            "{label} file path is empty. Please select a file."
        )));
    }

    let unreadable = |details: String| {
        CompareError::Validation(format!(
            "Cannot access {label} at \"{}\". Please ensure the file exists and is readable. \
             Details: {details}",
            path.display()
        ))
    };

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| unreadable(e.to_string()))?;
    if !metadata.is_file() {
        return Err(unreadable("not a regular file".to_string()));
    }

    // Opening is the only portable way to confirm read permission.
    tokio::fs::File::open(path)
        .await
        .map_err(|e| unreadable(e.to_string()))?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_path_is_rejected_with_label() {
        let err = ensure_readable("", "Baseline JTL").await.unwrap_err();
        assert!(matches!(err, CompareError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation error: Baseline JTL file path is empty. Please select a file."
        );
    }

    #[tokio::test]
    async fn missing_file_is_rejected_with_label_and_path() {
        let err = ensure_readable("/nonexistent/dir/latest.jtl", "Latest JTL")
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Cannot access Latest JTL"));
        assert!(msg.contains("/nonexistent/dir/latest.jtl"));
    }

    #[tokio::test]
    async fn directory_is_not_readable_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let err = ensure_readable(dir.path(), "Baseline Splunk")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
    }

    #[tokio::test]
    async fn existing_file_passes() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("baseline.jtl");
        tokio::fs::write(&path, "timeStamp,elapsed,success\n")
            .await
            .expect("writing fixture should succeed");
        assert!(ensure_readable(&path, "Baseline JTL").await.is_ok());
    }
}
