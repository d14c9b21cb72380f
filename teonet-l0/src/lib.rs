//! # teonet-l0
//!
//! Wire format of the Teonet L0 client protocol.
//!
//! This crate provides:
//! - The 8-byte packet header with byte checksums
//! - Login and command packet builders
//! - A streaming decoder for framed reads
//! - A lenient parser for single-buffer responses

pub mod codec;
pub mod error;
pub mod packet;

pub use codec::{build_command_packet, build_login_packet, build_packet, Decoder};
pub use error::ProtocolError;
pub use packet::{byte_checksum, Packet, PACKET_HEADER_SIZE};

/// Login command sent right after connecting.
pub const CMD_LOGIN: u8 = 0;

/// Echo request: the receiving peer sends the payload back.
pub const CMD_ECHO: u8 = 65;

/// Answer to an echo request.
pub const CMD_ECHO_ANSWER: u8 = 66;

/// Default L0 server port.
pub const DEFAULT_PORT: u16 = 9010;

/// Conventional client packet buffer size.
pub const BUFFER_SIZE: usize = 2048;

/// Longest peer name (without its NUL) that fits the one-byte length field.
pub const MAX_PEER_NAME_LEN: usize = u8::MAX as usize - 1;

/// Largest data section the two-byte length field can describe.
pub const MAX_DATA_LEN: usize = u16::MAX as usize;
