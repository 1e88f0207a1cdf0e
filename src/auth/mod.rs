//! Authentication capability invoked once a session has been resolved.
//!
//! Applications plug in an [`Authenticator`] to turn the resolved session
//! into connection-scoped [`ClientData`]. Plain closures work too:
//!
//! ```
//! use picows::auth::{AuthContext, AuthError, Authenticator, ClientData};
//!
//! fn require_user(ctx: &AuthContext<'_>) -> Result<ClientData, AuthError> {
//!     let user = ctx
//!         .session
//!         .get("user")
//!         .cloned()
//!         .ok_or_else(|| AuthError::Rejected("no user in session".to_owned()))?;
//!     let mut data = ClientData::new();
//!     data.insert("user".to_owned(), user);
//!     Ok(data)
//! }
//!
//! fn assert_authenticator<A: Authenticator>(_: &A) {}
//! assert_authenticator(&require_user);
//! ```

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    connection::PeerInfo,
    request::{CookieSet, ParsedRequest},
    session::SessionRecord,
};

/// Opaque data an authenticator attaches to a connection.
pub type ClientData = serde_json::Map<String, serde_json::Value>;

/// Authentication failure; aborts setup of the affected connection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The session does not identify an acceptable client.
    #[error("authentication rejected: {0}")]
    Rejected(String),
    /// The authenticator could not reach a decision.
    #[error("authentication backend failed: {0}")]
    Backend(String),
}

/// Read-only view of a connection handed to an [`Authenticator`].
#[derive(Clone, Copy, Debug)]
pub struct AuthContext<'a> {
    /// Resource id and remote address of the peer.
    pub peer: &'a PeerInfo,
    /// The upgrade request.
    pub request: &'a ParsedRequest,
    /// Cookies sent with the request.
    pub cookies: &'a CookieSet,
    /// Session id taken from the session cookie.
    pub session_id: &'a str,
    /// Session record loaded for `session_id`.
    pub session: &'a SessionRecord,
}

/// Produces client data for a connection with a session.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate the connection described by `ctx`.
    ///
    /// # Errors
    /// Any error aborts construction of the connection.
    async fn authenticate(&self, ctx: &AuthContext<'_>) -> Result<ClientData, AuthError>;
}

#[async_trait]
impl<F> Authenticator for F
where
    F: Fn(&AuthContext<'_>) -> Result<ClientData, AuthError> + Send + Sync,
{
    async fn authenticate(&self, ctx: &AuthContext<'_>) -> Result<ClientData, AuthError> {
        self(ctx)
    }
}

/// Accepts every connection and attaches no data.
#[derive(Clone, Copy, Debug, Default)]
pub struct AnonymousAuthenticator;

#[async_trait]
impl Authenticator for AnonymousAuthenticator {
    async fn authenticate(&self, _ctx: &AuthContext<'_>) -> Result<ClientData, AuthError> {
        Ok(ClientData::new())
    }
}
