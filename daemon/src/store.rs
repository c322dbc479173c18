/// File-backed persistence for [`NotificationState`].
///
/// The file is a single JSON document; it is replaced via temp file + rename
/// so a crash mid-write never leaves a truncated snapshot behind. The poll
/// loop is the only writer.
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::PersistError;
use crate::state::NotificationState;

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted snapshot.
    ///
    /// `Ok(None)` means the file does not exist yet (first run). A file that
    /// exists but does not parse is an error, not a silent reset.
    pub fn load(&self) -> Result<Option<NotificationState>, PersistError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| PersistError::Parse {
                path: self.path.display().to_string(),
                source,
            })
    }

    /// Atomically replaces the persisted snapshot with `state`.
    pub fn save(&self, state: &NotificationState) -> Result<(), PersistError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let content = serde_json::to_vec(state).map_err(PersistError::Serialize)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&content)?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| PersistError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &tempfile::TempDir) -> StateStore {
        StateStore::new(dir.path().join("notifstate.json"))
    }

    #[test]
    fn load_missing_file_is_first_run() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().unwrap().is_none());
    }

    #[test]
    fn saved_snapshot_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let state = NotificationState::with_chats(vec![json!({"id": 1}), json!({"id": 2})]);
        store_in(&dir).save(&state).unwrap();

        // A fresh store stands in for a restarted process.
        let loaded = store_in(&dir).load().unwrap().unwrap();
        assert_eq!(loaded.unread_count(), 2);
        assert_eq!(loaded, state);
    }

    #[test]
    fn save_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&NotificationState::with_chats(vec![json!(1), json!(2), json!(3)]))
            .unwrap();
        store.save(&NotificationState::with_chats(vec![])).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.unread_count(), 0);
    }

    #[test]
    fn save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("nested").join("notifstate.json"));
        store.save(&NotificationState::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn save_leaves_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        store_in(&dir)
            .save(&NotificationState::with_chats(vec![json!("c1")]))
            .unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.load(), Err(PersistError::Parse { .. })));
    }

    #[test]
    fn written_file_is_plain_json_with_chats_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&NotificationState::with_chats(vec![json!({"id": "c1"})]))
            .unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw, json!({ "chats": [{ "id": "c1" }] }));
    }
}
