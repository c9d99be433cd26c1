use crate::error::TaskError;
use std::fs;
use std::path::Path;

/// A Markdown file read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub name: String,
    pub contents: String,
}

/// Reads a file once. Failures are not retried.
pub fn load(path: &Path) -> Result<FileRecord, TaskError> {
    log::debug!("Loading {}", path.display());
    let contents = fs::read_to_string(path).map_err(|source| TaskError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(FileRecord {
        name: path.display().to_string(),
        contents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_returns_name_and_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("slides.md");
        fs::write(&path, "file contents").unwrap();

        let record = load(&path).unwrap();
        assert_eq!(record.name, path.display().to_string());
        assert_eq!(record.contents, "file contents");
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.md");

        match load(&path) {
            Err(TaskError::FileRead { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected a read error, got {:?}", other),
        }
    }
}
