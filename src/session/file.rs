//! File-backed session store.

use std::path::Path;

use async_trait::async_trait;
use tokio::{fs, io};

use super::{SessionError, SessionRecord, SessionStore, is_valid_session_id, session_file_path};

/// Stores each session as a JSON object in `save_path/prefix + id`.
///
/// An empty file is an empty session.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSessionStore;

impl FileSessionStore {
    /// Create a file-backed store.
    #[must_use]
    pub const fn new() -> Self { Self }
}

fn checked_id(session_id: &str) -> Result<&str, SessionError> {
    if is_valid_session_id(session_id) {
        Ok(session_id)
    } else {
        Err(SessionError::InvalidId(session_id.to_owned()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(
        &self,
        session_id: &str,
        save_path: &Path,
        prefix: &str,
    ) -> Result<SessionRecord, SessionError> {
        let path = session_file_path(save_path, prefix, checked_id(session_id)?);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SessionError::NotFound(path));
            }
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(SessionRecord::new());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn save(
        &self,
        session_id: &str,
        save_path: &Path,
        prefix: &str,
        record: &SessionRecord,
    ) -> Result<(), SessionError> {
        let path = session_file_path(save_path, prefix, checked_id(session_id)?);
        let bytes = serde_json::to_vec(record)?;
        fs::write(&path, bytes).await?;
        Ok(())
    }
}
