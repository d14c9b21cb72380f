//! Packet builders and a streaming decoder.

use crate::error::ProtocolError;
use crate::packet::Packet;
use crate::CMD_LOGIN;
use bytes::BytesMut;

/// Builds the login packet every client sends right after connecting.
///
/// The packet carries no peer and `host_name` (NUL-terminated) as data.
pub fn build_login_packet(host_name: &str, capacity: usize) -> Result<BytesMut, ProtocolError> {
    build_packet(&Packet::text(CMD_LOGIN, "", host_name.as_bytes()), capacity)
}

/// Builds a command packet addressed to `peer` with a NUL-terminated message.
pub fn build_command_packet(
    command: u8,
    peer: &str,
    message: &[u8],
    capacity: usize,
) -> Result<BytesMut, ProtocolError> {
    build_packet(&Packet::text(command, peer, message), capacity)
}

/// Encodes `packet` as is, failing if it does not fit in `capacity` bytes.
pub fn build_packet(packet: &Packet, capacity: usize) -> Result<BytesMut, ProtocolError> {
    let needed = packet.encoded_len();
    if needed > capacity {
        return Err(ProtocolError::BufferTooSmall { needed, capacity });
    }
    packet.encode()
}

/// Reassembles packets from a byte stream.
pub struct Decoder {
    buffer: BytesMut,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(crate::BUFFER_SIZE),
        }
    }

    /// Appends data to the internal buffer.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Attempts to decode the next packet from the buffer.
    pub fn decode_packet(&mut self) -> Result<Option<Packet>, ProtocolError> {
        Packet::decode(&mut self.buffer)
    }

    /// Decodes the next packet, falling back to [`Packet::parse`] when the
    /// buffered bytes are not a well-formed packet.
    ///
    /// The fallback consumes everything buffered, so it treats the bytes of
    /// the last read as one packet whose header fields are not trusted.
    pub fn decode_lenient(&mut self) -> Result<Option<Packet>, ProtocolError> {
        match Packet::decode(&mut self.buffer) {
            Ok(packet) => Ok(packet),
            Err(_) => {
                let raw = self.buffer.split();
                Packet::parse(&raw).map(Some)
            }
        }
    }

    /// Returns the number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BUFFER_SIZE, CMD_ECHO};
    use proptest::prelude::*;

    #[test]
    fn test_login_packet_length() {
        let packet = build_login_packet("C2", BUFFER_SIZE).unwrap();
        assert_eq!(packet.len(), 8 + 1 + "C2".len() + 1);
        assert_eq!(packet[0], CMD_LOGIN);
    }

    #[test]
    fn test_command_packet_exceeds_capacity() {
        let message = vec![b'x'; BUFFER_SIZE];
        let result = build_command_packet(CMD_ECHO, "ps-server", &message, BUFFER_SIZE);
        assert!(matches!(
            result,
            Err(ProtocolError::BufferTooSmall {
                capacity: BUFFER_SIZE,
                ..
            })
        ));
    }

    #[test]
    fn test_partial_packet_decoding() {
        let encoded = build_command_packet(CMD_ECHO, "ps-server", b"Hello", BUFFER_SIZE).unwrap();

        let mut decoder = Decoder::new();

        // Feed partial data
        decoder.extend(&encoded[..10]);
        assert!(decoder.decode_packet().unwrap().is_none());

        // Feed the rest
        decoder.extend(&encoded[10..]);
        let decoded = decoder.decode_packet().unwrap().unwrap();
        assert_eq!(decoded.command, CMD_ECHO);
        assert_eq!(decoded.peer, "ps-server");
        assert_eq!(decoded.message(), b"Hello");
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_lenient_decode_accepts_unchecked_header() {
        let mut raw = vec![CMD_ECHO, 0, 0, 0, 0, 0, 0, 0];
        raw.extend_from_slice(b"ps-server\0ping\0");

        let mut decoder = Decoder::default();
        decoder.extend(&raw);
        assert!(decoder.decode_packet().is_err());
        assert_eq!(decoder.buffered(), raw.len());

        let packet = decoder.decode_lenient().unwrap().unwrap();
        assert_eq!(packet.command, CMD_ECHO);
        assert_eq!(packet.peer, "ps-server");
        assert_eq!(packet.message(), b"ping");
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_lenient_decode_prefers_framing() {
        let first = build_command_packet(CMD_ECHO, "a", b"1", BUFFER_SIZE).unwrap();
        let second = build_command_packet(CMD_ECHO, "b", b"2", BUFFER_SIZE).unwrap();

        let mut decoder = Decoder::default();
        decoder.extend(&first);
        decoder.extend(&second[..4]);

        let packet = decoder.decode_lenient().unwrap().unwrap();
        assert_eq!(packet.peer, "a");
        assert!(decoder.decode_lenient().unwrap().is_none());

        decoder.extend(&second[4..]);
        assert_eq!(decoder.decode_lenient().unwrap().unwrap().peer, "b");
    }

    #[test]
    fn test_lenient_decode_drops_garbage() {
        let mut decoder = Decoder::default();
        decoder.extend(&[1, 2, 3, 4, 5, 6, 7, 8, b'x']);

        assert!(matches!(
            decoder.decode_lenient(),
            Err(ProtocolError::MissingTerminator)
        ));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_build_packet_keeps_raw_payload() {
        let packet = Packet::new(CMD_ECHO, "peer", bytes::Bytes::from_static(&[1, 2]));
        let encoded = build_packet(&packet, BUFFER_SIZE).unwrap();
        assert_eq!(encoded.len(), 8 + "peer".len() + 1 + 2);
        assert!(build_packet(&packet, 8).is_err());
    }

    proptest! {
        #[test]
        fn prop_strict_and_lenient_parsers_agree(
            command in any::<u8>(),
            peer in "[a-z0-9-]{0,32}",
            message in proptest::collection::vec(1u8..=255, 0..256),
        ) {
            let encoded = build_command_packet(command, &peer, &message, BUFFER_SIZE).unwrap();

            let lenient = Packet::parse(&encoded).unwrap();
            let mut decoder = Decoder::new();
            decoder.extend(&encoded);
            let strict = decoder.decode_packet().unwrap().unwrap();

            prop_assert_eq!(&lenient, &strict);
            prop_assert_eq!(strict.message(), &message[..]);
        }
    }
}
