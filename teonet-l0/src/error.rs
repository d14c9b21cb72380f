//! Protocol error types.

use thiserror::Error;

/// Errors raised while building or reading L0 packets.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("peer name too long: {len} bytes (max {max})")]
    PeerNameTooLong { len: usize, max: usize },

    #[error("packet data too large: {len} bytes (max {max})")]
    DataTooLarge { len: usize, max: usize },

    #[error("buffer too small: packet needs {needed} bytes, capacity is {capacity}")]
    BufferTooSmall { needed: usize, capacity: usize },

    #[error("header checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    HeaderChecksum { expected: u8, actual: u8 },

    #[error("data checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    DataChecksum { expected: u8, actual: u8 },

    #[error("invalid peer name field")]
    InvalidPeerName,

    #[error("truncated packet: {len} bytes, header needs 8")]
    Truncated { len: usize },

    #[error("peer name is not NUL-terminated")]
    MissingTerminator,

    #[error("invalid UTF-8 in peer name")]
    InvalidUtf8,
}
