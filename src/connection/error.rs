//! Error types for connection setup and outbound traffic.

use thiserror::Error;
use tokio::io;

use crate::{handshake::HandshakeError, request::RequestError, session::ResolveError};

/// Setup failures; the connection is never handed out.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The upgrade request could not be parsed.
    #[error(transparent)]
    Request(#[from] RequestError),
    /// The upgrade reply could not be written.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),
    /// Session lookup or authentication failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Errors returned by [`super::Connection::send`].
#[derive(Debug, Error)]
pub enum SendError {
    /// The connection was already closed; nothing was written.
    #[error("connection closed")]
    Closed,
    /// The socket rejected the frame.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The frame was not written before the write timeout; the connection is
    /// closed.
    #[error("timed out writing frame")]
    Timeout,
}

/// Errors returned by [`super::Connection::close`].
#[derive(Debug, Error)]
pub enum CloseError {
    /// Shutting down the socket failed; it is released regardless.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Shutdown did not finish in time; the socket is released regardless.
    #[error("timed out closing connection")]
    Timeout,
}
