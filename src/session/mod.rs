//! Cookie-keyed session binding.
//!
//! A connection's identity is resolved best-effort: no `Cookie` header or no
//! session cookie simply yields an anonymous connection. When a session id is
//! present the record is loaded through an injected [`SessionStore`] and the
//! injected [`Authenticator`](crate::auth::Authenticator) turns it into
//! connection-scoped client data.

mod context;
mod file;
mod memory;
mod resolver;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
pub use context::{SessionContext, SessionSettings};
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use resolver::{ResolveError, Resolution, SessionResolver};
use thiserror::Error;
use tokio::io;

/// Arbitrary key/value state stored for a session.
pub type SessionRecord = serde_json::Map<String, serde_json::Value>;

/// Errors reported by a [`SessionStore`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// No record exists for the session id.
    #[error("session file {0:?} not found")]
    NotFound(PathBuf),
    /// The session id contains characters a store will not accept.
    #[error("invalid session id {0:?}")]
    InvalidId(String),
    /// The stored record could not be decoded or encoded.
    #[error("session record is malformed: {0}")]
    Decode(#[from] serde_json::Error),
    /// I/O failure while reading or writing the record.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    /// Whether the error means "no usable session" rather than a fault.
    #[must_use]
    pub const fn is_missing(&self) -> bool { matches!(self, Self::NotFound(_) | Self::InvalidId(_)) }
}

/// Persistence backend for session records.
///
/// Records are addressed by session id, the directory they live in and the
/// file-name prefix, mirroring the conventional `save_path/prefix + id`
/// layout. Implementations may ignore the path parts.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the record for `session_id`.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no record exists, or another
    /// variant if the record cannot be read.
    async fn load(
        &self,
        session_id: &str,
        save_path: &Path,
        prefix: &str,
    ) -> Result<SessionRecord, SessionError>;

    /// Persist `record` for `session_id`.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written.
    async fn save(
        &self,
        session_id: &str,
        save_path: &Path,
        prefix: &str,
        record: &SessionRecord,
    ) -> Result<(), SessionError>;
}

/// Whether `session_id` only uses the characters session ids are built from.
#[must_use]
pub fn is_valid_session_id(session_id: &str) -> bool {
    !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ',' || c == '-')
}

/// Location of the record for `session_id`.
#[must_use]
pub fn session_file_path(save_path: &Path, prefix: &str, session_id: &str) -> PathBuf {
    save_path.join(format!("{prefix}{session_id}"))
}

#[cfg(test)]
mod tests;
