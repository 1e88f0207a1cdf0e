//! Constants for the WebSocket upgrade handshake and outbound framing.
//!
//! The protocol module collects the literal values the handshake engine, the
//! session resolver and the frame encoder agree on. Values that are mandated
//! by the wire format (the accept GUID, opcodes) live next to the defaults
//! that deployments may override through configuration.
use std::time::Duration;

/// GUID appended to `Sec-WebSocket-Key` before hashing (RFC 6455 §1.3).
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Engine name advertised in the `X-Engine` response header.
pub const ENGINE_NAME: &str = "PicoWebSocket";

/// Port advertised in `WebSocket-Location` when the host carries none.
pub const DEFAULT_PORT: &str = "443";

/// Cookie holding the session identifier.
pub const DEFAULT_SESSION_COOKIE: &str = "PHPSESSID";

/// Prefix prepended to the session id to build the session file name.
pub const DEFAULT_SESSION_PREFIX: &str = "sess_";

/// Upper bound for the raw HTTP head read from a client.
pub const MAX_HEAD_LEN: usize = 16 * 1024;

/// Timeout for reading the upgrade request and writing the reply.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout applied to each outbound frame write.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Final fragment bit of the first frame header byte.
pub const FIN: u8 = 0x80;

/// Largest payload length encoded directly in the second header byte.
pub const MAX_INLINE_LEN: usize = 125;

/// Length marker selecting a 16-bit extended payload length.
pub const LEN_MARKER_16: u8 = 126;

/// Length marker selecting a 64-bit extended payload length.
pub const LEN_MARKER_64: u8 = 127;

/// Platform directory used for session files when none is configured.
#[must_use]
pub fn default_session_save_path() -> std::path::PathBuf { std::env::temp_dir() }
