//! Mutable, connection-scoped session state.

use std::path::{Path, PathBuf};

use super::{Resolution, SessionRecord};
use crate::{
    auth::ClientData,
    protocol::{DEFAULT_SESSION_COOKIE, DEFAULT_SESSION_PREFIX, default_session_save_path},
    request::CookieSet,
};

/// Where and how a connection looks up its session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    /// Cookie carrying the session id.
    pub cookie_name: String,
    /// Directory holding session records.
    pub save_path: PathBuf,
    /// Prefix prepended to the id to form the record name.
    pub file_prefix: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_owned(),
            save_path: default_session_save_path(),
            file_prefix: DEFAULT_SESSION_PREFIX.to_owned(),
        }
    }
}

/// Identity and session data attached to one connection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionContext {
    settings: SessionSettings,
    cookies: CookieSet,
    session_id: String,
    record: SessionRecord,
    client_data: ClientData,
    username: String,
}

impl SessionContext {
    /// Start an anonymous context with the given lookup settings.
    #[must_use]
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Replace cookies, session id, record and client data in one step.
    pub fn apply(&mut self, resolution: Resolution) {
        let Resolution {
            cookies,
            session_id,
            record,
            client_data,
        } = resolution;
        self.cookies = cookies;
        self.session_id = session_id;
        self.record = record;
        self.client_data = client_data;
    }

    /// Lookup settings in effect.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings { &self.settings }

    /// Name of the session cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str { &self.settings.cookie_name }

    /// Change the session cookie name used by the next refresh.
    pub fn set_cookie_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.settings.cookie_name = name.into();
        self
    }

    /// Directory holding session records.
    #[must_use]
    pub fn save_path(&self) -> &Path { &self.settings.save_path }

    /// Change the session directory used by the next refresh or save.
    pub fn set_save_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.settings.save_path = path.into();
        self
    }

    /// Prefix of session record names.
    #[must_use]
    pub fn file_prefix(&self) -> &str { &self.settings.file_prefix }

    /// Change the record prefix used by the next refresh or save.
    pub fn set_file_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.settings.file_prefix = prefix.into();
        self
    }

    /// Cookies sent by the client.
    #[must_use]
    pub const fn cookies(&self) -> &CookieSet { &self.cookies }

    /// Replace the cookie set consulted by the next refresh.
    pub fn set_cookies(&mut self, cookies: CookieSet) -> &mut Self {
        self.cookies = cookies;
        self
    }

    /// Session id, empty for anonymous connections.
    #[must_use]
    pub fn session_id(&self) -> &str { &self.session_id }

    /// Override the session id.
    pub fn set_session_id(&mut self, session_id: impl Into<String>) -> &mut Self {
        self.session_id = session_id.into();
        self
    }

    /// Cached session record.
    #[must_use]
    pub const fn record(&self) -> &SessionRecord { &self.record }

    /// Mutable access to the cached session record.
    pub const fn record_mut(&mut self) -> &mut SessionRecord { &mut self.record }

    /// Replace the cached session record.
    pub fn set_record(&mut self, record: SessionRecord) -> &mut Self {
        self.record = record;
        self
    }

    /// Data produced by the authenticator.
    #[must_use]
    pub const fn client_data(&self) -> &ClientData { &self.client_data }

    /// Replace the client data.
    pub fn set_client_data(&mut self, client_data: ClientData) -> &mut Self {
        self.client_data = client_data;
        self
    }

    /// Application-assigned user name, empty until set.
    #[must_use]
    pub fn username(&self) -> &str { &self.username }

    /// Record the user name once the application has authenticated the peer.
    pub fn set_username(&mut self, username: impl Into<String>) -> &mut Self {
        self.username = username.into();
        self
    }

    /// Whether a session id was found.
    #[must_use]
    pub fn is_anonymous(&self) -> bool { self.session_id.is_empty() }
}
