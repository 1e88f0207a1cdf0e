//! Resolution of the host and port advertised in the upgrade reply.

use crate::{protocol::DEFAULT_PORT, request::HeaderMap};

/// Headers consulted for the public host, most preferred first.
const HOST_HEADERS: [&str; 3] = ["X-Forwarded-Host", "X-Forwarded-Server", "Host"];

/// Host and port the client used to reach this server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HandshakeTarget {
    host: String,
    port: String,
}

impl HandshakeTarget {
    /// Build a target from explicit parts.
    pub fn new(host: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: port.into(),
        }
    }

    /// Resolve the target from request headers.
    ///
    /// `X-Forwarded-Host` wins over `X-Forwarded-Server`, which wins over
    /// `Host`. A value containing `:` is split into host and port (only the
    /// first two segments are used); otherwise the port defaults to `443`.
    /// Without any of the headers the host is empty.
    #[must_use]
    pub fn resolve(headers: &HeaderMap) -> Self {
        let raw = HOST_HEADERS
            .iter()
            .find_map(|name| headers.get(name))
            .unwrap_or_default();
        match raw.split_once(':') {
            Some((host, rest)) => {
                let port = rest.split_once(':').map_or(rest, |(port, _)| port);
                Self::new(host, port)
            }
            None => Self::new(raw, DEFAULT_PORT),
        }
    }

    /// Advertised host name.
    #[must_use]
    pub fn host(&self) -> &str { &self.host }

    /// Advertised port, kept as text.
    #[must_use]
    pub fn port(&self) -> &str { &self.port }

    /// `ws://host:port` as sent in `WebSocket-Location`.
    #[must_use]
    pub fn location(&self) -> String { format!("ws://{}:{}", self.host, self.port) }
}
