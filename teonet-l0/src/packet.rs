//! L0 client packet format.
//!
//! Packet layout (8 bytes header + peer name + data):
//!
//! ```text
//! +-----+----------+----------+----------+----------+----------+
//! | cmd | peer_len | data_len | reserved | checksum | hdr_csum |
//! | 1 B |   1 B    | 2 B (LE) |   2 B    |   1 B    |   1 B    |
//! +-----+----------+----------+----------+----------+----------+
//! | peer name + NUL (peer_len bytes) | data (data_len bytes)   |
//! +----------------------------------+-------------------------+
//! ```
//!
//! `checksum` is the wrapping byte sum of peer name and data, `hdr_csum` the
//! wrapping byte sum of the first seven header bytes.

use crate::error::ProtocolError;
use crate::{MAX_DATA_LEN, MAX_PEER_NAME_LEN};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::borrow::Cow;

/// Size of the fixed packet header in bytes.
pub const PACKET_HEADER_SIZE: usize = 8;

/// Wrapping sum of all bytes in `data`.
pub fn byte_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// A single L0 packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Command code.
    pub command: u8,
    /// Destination peer (outgoing) or originating peer (incoming).
    pub peer: String,
    /// Raw data section, including the trailing NUL of text messages.
    pub payload: Bytes,
}

impl Packet {
    /// Creates a packet with a raw data section.
    pub fn new(command: u8, peer: impl Into<String>, payload: Bytes) -> Self {
        Self {
            command,
            peer: peer.into(),
            payload,
        }
    }

    /// Creates a packet carrying `message` followed by a NUL terminator.
    pub fn text(command: u8, peer: impl Into<String>, message: &[u8]) -> Self {
        let mut data = BytesMut::with_capacity(message.len() + 1);
        data.put_slice(message);
        data.put_u8(0);
        Self::new(command, peer, data.freeze())
    }

    /// Returns the data section without its trailing NUL.
    pub fn message(&self) -> &[u8] {
        match self.payload.split_last() {
            Some((&0, rest)) => rest,
            _ => &self.payload,
        }
    }

    /// Returns the message as text, replacing invalid UTF-8.
    pub fn message_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.message())
    }

    /// Number of bytes this packet occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        PACKET_HEADER_SIZE + self.peer.len() + 1 + self.payload.len()
    }

    /// Encodes the packet into bytes.
    pub fn encode(&self) -> Result<BytesMut, ProtocolError> {
        if self.peer.as_bytes().contains(&0) {
            return Err(ProtocolError::InvalidPeerName);
        }
        if self.peer.len() > MAX_PEER_NAME_LEN {
            return Err(ProtocolError::PeerNameTooLong {
                len: self.peer.len(),
                max: MAX_PEER_NAME_LEN,
            });
        }
        if self.payload.len() > MAX_DATA_LEN {
            return Err(ProtocolError::DataTooLarge {
                len: self.payload.len(),
                max: MAX_DATA_LEN,
            });
        }

        let peer_len = self.peer.len() + 1;
        let mut buf = BytesMut::with_capacity(self.encoded_len());

        let body_checksum = byte_checksum(self.peer.as_bytes())
            .wrapping_add(byte_checksum(&self.payload));

        buf.put_u8(self.command);
        buf.put_u8(peer_len as u8);
        buf.put_u16_le(self.payload.len() as u16);
        buf.put_u8(0);
        buf.put_u8(0);
        buf.put_u8(body_checksum);
        let header_checksum = byte_checksum(&buf[..PACKET_HEADER_SIZE - 1]);
        buf.put_u8(header_checksum);

        buf.put_slice(self.peer.as_bytes());
        buf.put_u8(0);
        buf.put_slice(&self.payload);

        Ok(buf)
    }

    /// Decodes one packet from a stream buffer.
    ///
    /// Returns `Ok(Some(packet))` if a complete packet was decoded,
    /// `Ok(None)` if more data is needed, or `Err` on a corrupt packet.
    /// The buffer is only consumed on success.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, ProtocolError> {
        if buf.len() < PACKET_HEADER_SIZE {
            return Ok(None);
        }

        let header_actual = byte_checksum(&buf[..PACKET_HEADER_SIZE - 1]);
        let header_expected = buf[7];
        if header_actual != header_expected {
            return Err(ProtocolError::HeaderChecksum {
                expected: header_expected,
                actual: header_actual,
            });
        }

        let peer_len = buf[1] as usize;
        let data_len = u16::from_le_bytes([buf[2], buf[3]]) as usize;
        if peer_len == 0 {
            return Err(ProtocolError::InvalidPeerName);
        }

        let total_len = PACKET_HEADER_SIZE + peer_len + data_len;
        if buf.len() < total_len {
            return Ok(None);
        }

        let body = &buf[PACKET_HEADER_SIZE..total_len];
        let body_expected = buf[6];
        let body_actual = byte_checksum(body);
        if body_actual != body_expected {
            return Err(ProtocolError::DataChecksum {
                expected: body_expected,
                actual: body_actual,
            });
        }

        let (name, terminator) = body[..peer_len].split_at(peer_len - 1);
        if terminator != [0] {
            return Err(ProtocolError::MissingTerminator);
        }
        let peer = std::str::from_utf8(name)
            .map_err(|_| ProtocolError::InvalidUtf8)?
            .to_string();

        let command = buf[0];
        buf.advance(PACKET_HEADER_SIZE);
        let body = buf.split_to(peer_len + data_len).freeze();

        Ok(Some(Self {
            command,
            peer,
            payload: body.slice(peer_len..),
        }))
    }

    /// Parses a single received buffer without trusting the header lengths.
    ///
    /// Byte 0 is the command, bytes 1..8 are skipped, the peer name runs from
    /// byte 8 to the first NUL and everything after that NUL is the payload.
    pub fn parse(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < PACKET_HEADER_SIZE {
            return Err(ProtocolError::Truncated { len: buf.len() });
        }

        let rest = &buf[PACKET_HEADER_SIZE..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ProtocolError::MissingTerminator)?;
        let peer = std::str::from_utf8(&rest[..nul])
            .map_err(|_| ProtocolError::InvalidUtf8)?
            .to_string();

        Ok(Self {
            command: buf[0],
            peer,
            payload: Bytes::copy_from_slice(&rest[nul + 1..]),
        })
    }
}
