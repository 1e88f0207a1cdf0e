//! Cookie → session id → record → client data.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use super::{SessionError, SessionRecord, SessionSettings, SessionStore};
use crate::{
    auth::{AuthContext, AuthError, Authenticator, ClientData},
    connection::PeerInfo,
    request::{CookieSet, ParsedRequest},
};

/// Failures that abort session resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The store failed for a reason other than a missing record.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The authenticator rejected the connection or failed.
    #[error(transparent)]
    Authentication(#[from] AuthError),
}

/// Outcome of one resolution pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    /// Cookies the pass worked from.
    pub cookies: CookieSet,
    /// Session id, empty when the session cookie is absent.
    pub session_id: String,
    /// Loaded record, empty when anonymous or missing.
    pub record: SessionRecord,
    /// Data returned by the authenticator, empty when anonymous.
    pub client_data: ClientData,
}

/// Resolves connection identity through injected capabilities.
#[derive(Clone)]
pub struct SessionResolver {
    store: Arc<dyn SessionStore>,
    authenticator: Arc<dyn Authenticator>,
}

impl SessionResolver {
    /// Bind a store and an authenticator.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            store,
            authenticator,
        }
    }

    /// Store used for session records.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> { &self.store }

    /// Resolve identity from the request's `Cookie` header.
    ///
    /// # Errors
    /// See [`SessionResolver::resolve_cookies`].
    pub async fn resolve(
        &self,
        request: &ParsedRequest,
        settings: &SessionSettings,
        peer: &PeerInfo,
    ) -> Result<Resolution, ResolveError> {
        let cookies = request
            .header("cookie")
            .map(CookieSet::parse)
            .unwrap_or_default();
        self.resolve_cookies(cookies, request, settings, peer).await
    }

    /// Resolve identity from an already parsed cookie set.
    ///
    /// Without the session cookie the result is anonymous and neither the
    /// store nor the authenticator is consulted. A missing or unusable
    /// record is treated as an empty session.
    ///
    /// # Errors
    /// Returns [`ResolveError::Session`] for store failures other than a
    /// missing record and [`ResolveError::Authentication`] when the
    /// authenticator fails.
    pub async fn resolve_cookies(
        &self,
        cookies: CookieSet,
        request: &ParsedRequest,
        settings: &SessionSettings,
        peer: &PeerInfo,
    ) -> Result<Resolution, ResolveError> {
        let Some(session_id) = cookies.get(&settings.cookie_name).map(str::to_owned) else {
            debug!(resource_id = %peer.resource_id, "no session cookie, connection is anonymous");
            return Ok(Resolution {
                cookies,
                ..Resolution::default()
            });
        };

        let record = match self
            .store
            .load(&session_id, &settings.save_path, &settings.file_prefix)
            .await
        {
            Ok(record) => record,
            Err(e) if e.is_missing() => {
                warn!(resource_id = %peer.resource_id, error = %e, "session unavailable, using empty session");
                SessionRecord::new()
            }
            Err(e) => return Err(e.into()),
        };

        let client_data = self
            .authenticator
            .authenticate(&AuthContext {
                peer,
                request,
                cookies: &cookies,
                session_id: &session_id,
                session: &record,
            })
            .await?;

        Ok(Resolution {
            cookies,
            session_id,
            record,
            client_data,
        })
    }
}

impl std::fmt::Debug for SessionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionResolver").finish_non_exhaustive()
    }
}
