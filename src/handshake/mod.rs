//! WebSocket upgrade handshake.
//!
//! The engine answers a parsed upgrade request with the legacy
//! `101 Web Socket Protocol Handshake` response that existing clients of
//! this engine expect. The response is written in one timed write; a missing
//! `Sec-WebSocket-Key` skips the reply entirely and leaves the socket as-is.

mod target;

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha1::{Digest, Sha1};
pub use target::HandshakeTarget;
use thiserror::Error;
use tokio::{
    io::{self, AsyncWrite, AsyncWriteExt},
    time::timeout,
};
use tracing::debug;

use crate::{
    protocol::{ENGINE_NAME, HANDSHAKE_TIMEOUT, WS_GUID},
    request::HeaderMap,
};

/// Header carrying the client's opaque handshake nonce.
pub const SEC_WEBSOCKET_KEY: &str = "Sec-WebSocket-Key";

/// Errors raised while writing the handshake reply.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The socket rejected the reply.
    #[error("failed to write handshake reply: {0}")]
    Write(#[source] io::Error),
    /// The reply could not be written before the handshake timeout.
    #[error("timed out writing handshake reply")]
    Timeout,
}

/// Result of running the handshake against a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// The upgrade reply was written.
    Upgraded {
        /// Value sent as `Sec-WebSocket-Accept`.
        accept: String,
    },
    /// The request carried no `Sec-WebSocket-Key`; nothing was written.
    Skipped,
}

impl HandshakeOutcome {
    /// Whether the upgrade reply went out.
    #[must_use]
    pub const fn is_upgraded(&self) -> bool { matches!(self, Self::Upgraded { .. }) }
}

/// Tunables for the handshake write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandshakeOptions {
    /// Name advertised in `X-Engine`.
    pub engine_name: String,
    /// Deadline for the reply write.
    pub timeout: Duration,
}

impl Default for HandshakeOptions {
    fn default() -> Self {
        Self {
            engine_name: ENGINE_NAME.to_owned(),
            timeout: HANDSHAKE_TIMEOUT,
        }
    }
}

/// Compute `base64(SHA-1(key + GUID))`.
#[must_use]
pub fn compute_accept(key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Render the literal upgrade reply.
///
/// Header order and spelling are fixed; clients of this engine match on
/// them.
#[must_use]
pub fn render_response(accept: &str, target: &HandshakeTarget, engine_name: &str) -> String {
    let host = target.host();
    let location = target.location();
    format!(
        "HTTP/1.1 101 Web Socket Protocol Handshake\r\nUpgrade: websocket\r\nConnection: \
         Upgrade\r\nWebSocket-Origin: {host}\r\nWebSocket-Location: \
         {location}\r\nSec-WebSocket-Accept: {accept}\r\nAccess-Control-Allow-Origin: \
         *\r\nX-Engine: {engine_name}\r\n\r\n"
    )
}

/// Answer the upgrade request on `writer`.
///
/// # Errors
/// Returns [`HandshakeError::Write`] if the socket write fails and
/// [`HandshakeError::Timeout`] if it does not finish within
/// `options.timeout`. Failures are not retried.
pub async fn perform_handshake<W>(
    headers: &HeaderMap,
    target: &HandshakeTarget,
    options: &HandshakeOptions,
    writer: &mut W,
) -> Result<HandshakeOutcome, HandshakeError>
where
    W: AsyncWrite + Unpin,
{
    let Some(key) = headers.get(SEC_WEBSOCKET_KEY) else {
        debug!("no Sec-WebSocket-Key, skipping upgrade reply");
        return Ok(HandshakeOutcome::Skipped);
    };
    let accept = compute_accept(key);
    let reply = render_response(&accept, target, &options.engine_name);
    timeout(options.timeout, async {
        writer.write_all(reply.as_bytes()).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| HandshakeError::Timeout)?
    .map_err(HandshakeError::Write)?;
    debug!(host = %target.host(), port = %target.port(), "upgrade reply written");
    Ok(HandshakeOutcome::Upgraded { accept })
}
