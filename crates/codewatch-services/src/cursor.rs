//! History cursor persistence.
//!
//! The cursor is a single opaque marker: the last history position the
//! engine has fully processed. It is read once per push and overwritten
//! after each processed batch. An absent cursor is the normal cold
//! start, not an error.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::error::ServiceError;

/// Persistence seam for the history cursor.
pub trait CursorStore: Send {
    /// Last persisted marker, or `None` on cold start.
    fn load(&self) -> Result<Option<String>, ServiceError>;

    /// Persist a new marker, replacing any previous one.
    fn store(&self, marker: &str) -> Result<(), ServiceError>;
}

/// File-backed cursor store.
///
/// Writes go through a sibling temp file and an atomic rename so a
/// crash mid-write never leaves a truncated marker behind.
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CursorStore for FileCursorStore {
    fn load(&self) -> Result<Option<String>, ServiceError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let marker = raw.trim();
                if marker.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(marker.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, marker: &str) -> Result<(), ServiceError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)?;
        file.write_all(marker.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("cursor"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn store_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("cursor"));
        store.store("184211").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("184211"));
    }

    #[test]
    fn store_overwrites_previous_marker() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("cursor"));
        store.store("100").unwrap();
        store.store("200").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("200"));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCursorStore::new(dir.path().join("nested/state/cursor"));
        store.store("1").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn whitespace_only_file_is_cold_start() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        fs::write(&path, "  \n").unwrap();
        let store = FileCursorStore::new(path);
        assert_eq!(store.load().unwrap(), None);
    }
}
