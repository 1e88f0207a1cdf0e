//! Outbound frame encoding.
//!
//! Server-to-client frames are written as single, final, unmasked frames.
//! The historical encoder of this engine called its routine "mask" but never
//! applied a masking key, so unmasked output is both what RFC 6455 §5.1
//! requires of servers and what existing clients already receive.

use bytes::{BufMut, Bytes, BytesMut};

use crate::protocol::{FIN, LEN_MARKER_16, LEN_MARKER_64, MAX_INLINE_LEN};

/// Frame opcodes the encoder can emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// UTF-8 text payload.
    Text,
    /// Arbitrary binary payload.
    Binary,
}

impl Opcode {
    /// Numeric opcode placed in the low nibble of the first header byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Text => 0x1,
            Self::Binary => 0x2,
        }
    }
}

/// Stateless encoder for outbound frames.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameEncoder;

impl FrameEncoder {
    /// Create a new encoder.
    #[must_use]
    pub const fn new() -> Self { Self }

    /// Encode `payload` as a text frame.
    #[must_use]
    pub fn encode(self, payload: &str) -> Bytes { self.encode_frame(Opcode::Text, payload.as_bytes()) }

    /// Encode `payload` as a binary frame.
    #[must_use]
    pub fn encode_binary(self, payload: &[u8]) -> Bytes {
        self.encode_frame(Opcode::Binary, payload)
    }

    /// Encode a single final frame with the given opcode.
    #[must_use]
    pub fn encode_frame(self, opcode: Opcode, payload: &[u8]) -> Bytes {
        let len = payload.len();
        let mut buf = BytesMut::with_capacity(header_len(len) + len);
        buf.put_u8(FIN | opcode.as_u8());
        if len <= MAX_INLINE_LEN {
            // fits in seven bits
            buf.put_u8(u8::try_from(len).unwrap_or(LEN_MARKER_16));
        } else if let Ok(short) = u16::try_from(len) {
            buf.put_u8(LEN_MARKER_16);
            buf.put_u16(short);
        } else {
            buf.put_u8(LEN_MARKER_64);
            buf.put_u64(u64::try_from(len).unwrap_or(u64::MAX));
        }
        buf.put_slice(payload);
        buf.freeze()
    }
}

const fn header_len(payload_len: usize) -> usize {
    if payload_len <= MAX_INLINE_LEN {
        2
    } else if payload_len <= u16::MAX as usize {
        4
    } else {
        10
    }
}
