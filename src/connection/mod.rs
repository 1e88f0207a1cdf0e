//! The per-socket WebSocket connection.
//!
//! A [`Connection`] is built from an accepted socket's write half and the
//! raw upgrade request. Construction parses the request, answers the
//! handshake and resolves the session before returning, so a connection that
//! exists is always established. Outbound writes are serialised through a
//! single lock that [`Connection::close`] also takes, which keeps frames
//! from interleaving and makes writes after close fail cleanly.

mod error;
mod id;

use std::{
    net::SocketAddr,
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use bytes::Bytes;
pub use error::{CloseError, ConnectionError, SendError};
pub use id::{PeerInfo, ResourceId, ResourceIdAllocator};
use tokio::{
    io::{self, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
    time::timeout,
};
use tracing::{debug, info, warn};

use crate::{
    frame::FrameEncoder,
    handshake::{HandshakeOptions, HandshakeOutcome, HandshakeTarget, perform_handshake},
    protocol::WRITE_TIMEOUT,
    request::{self, ParsedRequest},
    session::{ResolveError, SessionContext, SessionError, SessionResolver, SessionSettings},
};

/// Lifecycle of a connection.
///
/// Only `Established` and `Closed` are observable from outside; the earlier
/// states exist while [`Connection::accept`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket accepted, request not yet parsed.
    Created,
    /// Request parsed, reply and session lookup in progress.
    Handshaking,
    /// Ready for outbound messages.
    Established,
    /// Socket released.
    Closed,
}

/// Per-connection settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Session cookie, directory and prefix.
    pub session: SessionSettings,
    /// Handshake reply options.
    pub handshake: HandshakeOptions,
    /// Deadline for each outbound frame write.
    pub write_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            session: SessionSettings::default(),
            handshake: HandshakeOptions::default(),
            write_timeout: WRITE_TIMEOUT,
        }
    }
}

/// An established WebSocket connection bound to a session.
pub struct Connection<W> {
    peer: PeerInfo,
    request: ParsedRequest,
    target: HandshakeTarget,
    handshake: HandshakeOutcome,
    session: SessionContext,
    resolver: SessionResolver,
    encoder: FrameEncoder,
    write_timeout: Duration,
    writer: Mutex<Option<W>>,
    closed: AtomicBool,
}

fn enter(peer: &PeerInfo, state: ConnectionState) {
    debug!(resource_id = %peer.resource_id, ?state, "connection state");
}

impl<W> Connection<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Run the handshake on `writer` and resolve the client's session.
    ///
    /// The store and authenticator behind `resolver` are consulted before the
    /// connection exists, never while a write is in flight.
    ///
    /// # Errors
    /// Returns [`ConnectionError::Request`] for an unparseable request line,
    /// [`ConnectionError::Handshake`] if the reply cannot be written and
    /// [`ConnectionError::Resolve`] if the store fails or the authenticator
    /// rejects the client. `writer` is dropped on error.
    pub async fn accept(
        peer: PeerInfo,
        mut writer: W,
        raw_head: &str,
        config: &ConnectionConfig,
        resolver: SessionResolver,
    ) -> Result<Self, ConnectionError> {
        enter(&peer, ConnectionState::Created);
        let request = request::parse(raw_head)?;

        enter(&peer, ConnectionState::Handshaking);
        let target = HandshakeTarget::resolve(request.headers());
        let handshake =
            perform_handshake(request.headers(), &target, &config.handshake, &mut writer).await?;
        if !handshake.is_upgraded() {
            warn!(resource_id = %peer.resource_id, "request carried no Sec-WebSocket-Key, socket not upgraded");
        }

        let mut session = SessionContext::new(config.session.clone());
        let resolution = resolver.resolve(&request, session.settings(), &peer).await?;
        session.apply(resolution);

        enter(&peer, ConnectionState::Established);
        info!(
            resource_id = %peer.resource_id,
            remote = ?peer.remote_addr,
            path = request.path(),
            anonymous = session.is_anonymous(),
            "connection established"
        );
        Ok(Self {
            peer,
            request,
            target,
            handshake,
            session,
            resolver,
            encoder: FrameEncoder::new(),
            write_timeout: config.write_timeout,
            writer: Mutex::new(Some(writer)),
            closed: AtomicBool::new(false),
        })
    }

    /// Send `message` as a text frame.
    ///
    /// # Errors
    /// Returns [`SendError::Closed`] after [`Connection::close`] and
    /// [`SendError::Io`] if the socket rejects the frame; the connection stays
    /// open after an I/O error. [`SendError::Timeout`] closes the connection,
    /// since part of the frame may already have been written.
    pub async fn send(&self, message: &str) -> Result<(), SendError> {
        self.write_frame(self.encoder.encode(message)).await
    }

    /// Send `payload` as a binary frame.
    ///
    /// # Errors
    /// Same as [`Connection::send`].
    pub async fn send_binary(&self, payload: &[u8]) -> Result<(), SendError> {
        self.write_frame(self.encoder.encode_binary(payload)).await
    }

    async fn write_frame(&self, frame: Bytes) -> Result<(), SendError> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(SendError::Closed);
        };
        let written = timeout(self.write_timeout, async {
            writer.write_all(&frame).await?;
            writer.flush().await
        })
        .await;
        match written {
            Ok(result) => Ok(result?),
            Err(_) => {
                // a partial frame may be on the wire; nothing after it would parse
                drop(guard.take());
                self.closed.store(true, Ordering::Release);
                warn!(resource_id = %self.peer.resource_id, "frame write timed out, connection closed");
                Err(SendError::Timeout)
            }
        }
    }

    /// Release the socket.
    ///
    /// Waits for an in-flight send to finish. Calling it again is a no-op.
    ///
    /// # Errors
    /// Reports a failed or timed-out shutdown; the socket is released and the
    /// connection is closed regardless.
    pub async fn close(&self) -> Result<(), CloseError> {
        let mut guard = self.writer.lock().await;
        let Some(mut writer) = guard.take() else {
            return Ok(());
        };
        self.closed.store(true, Ordering::Release);
        drop(guard);

        let result = timeout(self.write_timeout, writer.shutdown()).await;
        drop(writer);
        enter(&self.peer, ConnectionState::Closed);
        info!(resource_id = %self.peer.resource_id, "connection closed");
        match result {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(CloseError::Timeout),
        }
    }

    /// Re-run session resolution from the current cookie set.
    ///
    /// On failure the previous session state is kept.
    ///
    /// # Errors
    /// Same as the resolution step of [`Connection::accept`].
    pub async fn refresh_session_data(&mut self) -> Result<(), ResolveError> {
        let resolution = self
            .resolver
            .resolve_cookies(
                self.session.cookies().clone(),
                &self.request,
                self.session.settings(),
                &self.peer,
            )
            .await?;
        self.session.apply(resolution);
        Ok(())
    }

    /// Write the cached session record back to the store.
    ///
    /// Anonymous connections have nothing to save.
    ///
    /// # Errors
    /// Propagates store failures.
    pub async fn save_session(&self) -> Result<(), SessionError> {
        if self.session.is_anonymous() {
            return Ok(());
        }
        self.resolver
            .store()
            .save(
                self.session.session_id(),
                self.session.save_path(),
                self.session.file_prefix(),
                self.session.record(),
            )
            .await
    }
}

impl<W> Connection<W> {
    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if self.is_closed() {
            ConnectionState::Closed
        } else {
            ConnectionState::Established
        }
    }

    /// Whether [`Connection::close`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool { self.closed.load(Ordering::Acquire) }

    /// Peer identity.
    #[must_use]
    pub const fn peer(&self) -> &PeerInfo { &self.peer }

    /// Identifier assigned by the listener.
    #[must_use]
    pub const fn resource_id(&self) -> ResourceId { self.peer.resource_id }

    /// Reassign the resource id.
    pub const fn set_resource_id(&mut self, resource_id: ResourceId) -> &mut Self {
        self.peer.resource_id = resource_id;
        self
    }

    /// Remote socket address, if known.
    #[must_use]
    pub const fn remote_addr(&self) -> Option<SocketAddr> { self.peer.remote_addr }

    /// Remote port, if known.
    #[must_use]
    pub fn remote_port(&self) -> Option<u16> { self.peer.remote_addr.map(|addr| addr.port()) }

    /// Record the remote address.
    pub const fn set_remote_addr(&mut self, remote_addr: Option<SocketAddr>) -> &mut Self {
        self.peer.remote_addr = remote_addr;
        self
    }

    /// The upgrade request.
    #[must_use]
    pub const fn request(&self) -> &ParsedRequest { &self.request }

    /// Host advertised in the handshake.
    #[must_use]
    pub fn host(&self) -> &str { self.target.host() }

    /// Port advertised in the handshake.
    #[must_use]
    pub fn port(&self) -> &str { self.target.port() }

    /// Host followed by request path, i.e. how the client addressed us.
    #[must_use]
    pub fn host_and_path(&self) -> String { format!("{}{}", self.target.host(), self.request.path()) }

    /// What the handshake did.
    #[must_use]
    pub const fn handshake(&self) -> &HandshakeOutcome { &self.handshake }

    /// Session and identity data.
    #[must_use]
    pub const fn session(&self) -> &SessionContext { &self.session }

    /// Mutable session and identity data.
    pub const fn session_mut(&mut self) -> &mut SessionContext { &mut self.session }
}
