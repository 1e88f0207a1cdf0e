//! In-process session store.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;

use super::{SessionError, SessionRecord, SessionStore, session_file_path};

/// Keeps records in memory, keyed exactly like [`super::FileSessionStore`].
///
/// Useful for embedding and tests; contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: Mutex<HashMap<PathBuf, SessionRecord>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Seed a record without going through [`SessionStore::save`].
    pub fn insert(&self, session_id: &str, save_path: &Path, prefix: &str, record: SessionRecord) {
        self.lock()
            .insert(session_file_path(save_path, prefix, session_id), record);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, SessionRecord>> {
        match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(
        &self,
        session_id: &str,
        save_path: &Path,
        prefix: &str,
    ) -> Result<SessionRecord, SessionError> {
        let path = session_file_path(save_path, prefix, session_id);
        self.lock()
            .get(&path)
            .cloned()
            .ok_or(SessionError::NotFound(path))
    }

    async fn save(
        &self,
        session_id: &str,
        save_path: &Path,
        prefix: &str,
        record: &SessionRecord,
    ) -> Result<(), SessionError> {
        self.insert(session_id, save_path, prefix, record.clone());
        Ok(())
    }
}
