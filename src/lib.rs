//! Core library for the picows WebSocket endpoint.
//!
//! This crate implements the server side of the WebSocket upgrade: parsing
//! the HTTP request, answering the handshake, binding the connection to a
//! cookie-keyed session and framing outbound messages. The [`server`] module
//! wraps it in a Tokio TCP listener used by the `picows` binary.

pub mod auth;
pub mod connection;
pub mod frame;
pub mod handshake;
pub mod protocol;
pub mod request;
pub mod server;
pub mod session;
