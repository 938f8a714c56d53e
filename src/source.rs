//! Producers of raw dataset text.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::domain::{LTVError, Result};

/// Resolve a dataset identifier to its complete text.
pub trait DataSource {
    fn fetch_text(&self, identifier: &str) -> Result<String>;
}

/// Reads datasets from the file system. Identifiers are paths and may use
/// `~` and environment variables. Relative paths resolve against `root`.
#[derive(Debug, Default, Clone)]
pub struct FileSource {
    root: Option<PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn resolve(&self, identifier: &str) -> Result<PathBuf> {
        let expanded = shellexpand::full(identifier).map_err(|e| LTVError::SourceUnavailable {
            name: identifier.to_string(),
            reason: e.to_string(),
        })?;
        let path = PathBuf::from(expanded.into_owned());
        Ok(match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        })
    }
}

impl DataSource for FileSource {
    fn fetch_text(&self, identifier: &str) -> Result<String> {
        let path = self.resolve(identifier)?;
        debug!("Reading {}", path.display());

        let bytes = fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LTVError::SourceUnavailable {
                name: identifier.to_string(),
                reason: "file not found".to_string(),
            },
            ErrorKind::PermissionDenied => LTVError::SourceUnavailable {
                name: identifier.to_string(),
                reason: "permission denied".to_string(),
            },
            _ => LTVError::Io {
                path: path.clone(),
                source: e,
            },
        })?;

        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!("{} is not valid UTF-8, replacing invalid bytes", path.display());
                Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
            }
        }
    }
}

/// Fixed set of named texts.
#[derive(Debug, Default, Clone)]
pub struct InMemorySource {
    texts: HashMap<String, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, identifier: impl Into<String>, text: impl Into<String>) {
        self.texts.insert(identifier.into(), text.into());
    }
}

impl DataSource for InMemorySource {
    fn fetch_text(&self, identifier: &str) -> Result<String> {
        self.texts
            .get(identifier)
            .cloned()
            .ok_or_else(|| LTVError::SourceUnavailable {
                name: identifier.to_string(),
                reason: "unknown dataset".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn reads_file() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(b"a,b,c\n1,2,3\n").expect("Failed to write");
        let source = FileSource::new();
        let text = source.fetch_text(file.path().to_str().unwrap()).unwrap();
        assert_eq!(text, "a,b,c\n1,2,3\n");
    }

    #[test]
    fn relative_paths_use_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("s1.csv"), "x").unwrap();
        let source = FileSource::with_root(dir.path());
        assert_eq!(source.fetch_text("s1.csv").unwrap(), "x");
    }

    #[test]
    fn missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::with_root(dir.path());
        let err = source.fetch_text("missing.csv").unwrap_err();
        assert!(matches!(err, LTVError::SourceUnavailable { .. }), "{err}");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"a,\xff\n").unwrap();
        let text = FileSource::new()
            .fetch_text(file.path().to_str().unwrap())
            .unwrap();
        assert_eq!(text, "a,\u{fffd}\n");
    }

    #[test]
    fn in_memory() {
        let mut source = InMemorySource::new();
        source.insert("s1", "t");
        assert_eq!(source.fetch_text("s1").unwrap(), "t");
        assert!(source.fetch_text("s2").is_err());
    }
}
