//! Connection management.

use crate::error::ClientError;
use bytes::Bytes;
use teonet_l0::{
    build_command_packet, build_login_packet, build_packet, Decoder, Packet, BUFFER_SIZE,
};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default read buffer size, matching the conventional L0 packet buffer.
pub const DEFAULT_READ_BUFFER_SIZE: usize = BUFFER_SIZE;

/// Minimum read buffer size.
pub const MIN_READ_BUFFER_SIZE: usize = 64;

/// Maximum read buffer size (64 KiB).
pub const MAX_READ_BUFFER_SIZE: usize = 64 * 1024;

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server address (`host:port`, host names are resolved).
    pub addr: String,
    /// Name this client announces in its login packet.
    pub host_name: String,
    /// Read buffer size, also the capacity for outgoing packets.
    pub read_buffer_size: usize,
}

impl ConnectionConfig {
    pub fn new(addr: impl Into<String>, host_name: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            host_name: host_name.into(),
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.clamp(MIN_READ_BUFFER_SIZE, MAX_READ_BUFFER_SIZE);
        self
    }
}

/// A connection to an L0 server over any byte stream.
pub struct Connection<S> {
    config: ConnectionConfig,
    stream: S,
    buf: Vec<u8>,
    decoder: Decoder,
}

impl Connection<TcpStream> {
    /// Connects to the server. Blocks until the TCP handshake completes or fails.
    pub async fn connect(config: ConnectionConfig) -> Result<Self, ClientError> {
        tracing::debug!("Connecting to {}...", config.addr);

        let stream = TcpStream::connect(config.addr.as_str()).await.map_err(|e| {
            tracing::debug!("Connection failed: {}", e);
            ClientError::Io(e)
        })?;

        stream.set_nodelay(true).ok();
        tracing::debug!("TCP connected to {}", config.addr);

        Ok(Self::from_stream(stream, config))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Wraps an already connected stream.
    pub fn from_stream(stream: S, config: ConnectionConfig) -> Self {
        let buf = vec![0u8; config.read_buffer_size];
        Self {
            config,
            stream,
            buf,
            decoder: Decoder::new(),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Sends the login packet. Returns the number of bytes written.
    pub async fn send_login(&mut self) -> Result<usize, ClientError> {
        let packet = build_login_packet(&self.config.host_name, self.config.read_buffer_size)?;
        self.stream.write_all(&packet).await?;
        tracing::debug!("Sent {} bytes login packet", packet.len());
        Ok(packet.len())
    }

    /// Sends a command packet to `peer`. Returns the number of bytes written.
    pub async fn send_command(
        &mut self,
        command: u8,
        peer: &str,
        message: &[u8],
    ) -> Result<usize, ClientError> {
        let packet =
            build_command_packet(command, peer, message, self.config.read_buffer_size)?;
        self.stream.write_all(&packet).await?;
        tracing::debug!(
            "Sent {} bytes packet cmd={} to peer {}",
            packet.len(),
            command,
            peer
        );
        Ok(packet.len())
    }

    /// Sends `packet` with its payload unchanged. Returns the number of bytes written.
    pub async fn send_packet(&mut self, packet: &Packet) -> Result<usize, ClientError> {
        let encoded = build_packet(packet, self.config.read_buffer_size)?;
        self.stream.write_all(&encoded).await?;
        tracing::debug!(
            "Sent {} bytes packet cmd={} to peer {}",
            encoded.len(),
            packet.command,
            packet.peer
        );
        Ok(encoded.len())
    }

    /// Performs one read of at most the buffer size.
    pub async fn read_raw(&mut self) -> Result<Bytes, ClientError> {
        let n = self.stream.read(&mut self.buf).await?;
        if n == 0 {
            tracing::debug!("Connection closed (0 bytes)");
            return Err(ClientError::ConnectionClosed);
        }
        tracing::debug!("Read {} bytes from socket", n);
        Ok(Bytes::copy_from_slice(&self.buf[..n]))
    }

    /// Reads until a complete packet is buffered.
    ///
    /// Bytes that do not frame as a packet are parsed leniently, the same way
    /// [`Packet::parse`] reads a single reply. Returns `Ok(None)` once the
    /// server closes the stream. Cancel safe: bytes are only moved into the
    /// decoder after a read completes.
    pub async fn read_packet(&mut self) -> Result<Option<Packet>, ClientError> {
        loop {
            if let Some(packet) = self.decoder.decode_lenient()? {
                return Ok(Some(packet));
            }

            let n = self.stream.read(&mut self.buf).await?;
            if n == 0 {
                if self.decoder.buffered() > 0 {
                    tracing::warn!(
                        "Connection closed with {} bytes of partial packet",
                        self.decoder.buffered()
                    );
                }
                return Ok(None);
            }
            self.decoder.extend(&self.buf[..n]);
        }
    }

    /// Shuts down the write side and drops the stream.
    pub async fn close(mut self) -> Result<(), ClientError> {
        tracing::debug!("Closing connection...");
        self.stream.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teonet_l0::{CMD_ECHO, CMD_LOGIN};

    fn config() -> ConnectionConfig {
        ConnectionConfig::new("127.0.0.1:9010", "C2")
    }

    #[test]
    fn test_config_defaults() {
        let config = config();
        assert_eq!(config.read_buffer_size, DEFAULT_READ_BUFFER_SIZE);
        assert_eq!(config.host_name, "C2");
    }

    #[test]
    fn test_config_buffer_clamping() {
        let config = config().with_read_buffer_size(1); // Below minimum
        assert_eq!(config.read_buffer_size, MIN_READ_BUFFER_SIZE);

        let config = ConnectionConfig::new("127.0.0.1:9010", "C2")
            .with_read_buffer_size(10 * 1024 * 1024); // Above maximum
        assert_eq!(config.read_buffer_size, MAX_READ_BUFFER_SIZE);
    }

    #[tokio::test]
    async fn test_send_login_and_command() {
        let login = Packet::text(CMD_LOGIN, "", b"C2").encode().unwrap();
        let command = Packet::text(CMD_ECHO, "ps-server", b"Hi").encode().unwrap();

        let stream = tokio_test::io::Builder::new()
            .write(&login)
            .write(&command)
            .build();
        let mut conn = Connection::from_stream(stream, config());

        assert_eq!(conn.send_login().await.unwrap(), 12);
        assert_eq!(
            conn.send_command(CMD_ECHO, "ps-server", b"Hi").await.unwrap(),
            8 + 10 + 3
        );
    }

    #[tokio::test]
    async fn test_read_packet_across_reads() {
        let reply = Packet::text(CMD_ECHO, "ps-server", b"Hello").encode().unwrap();
        let (head, tail) = reply.split_at(5);

        let stream = tokio_test::io::Builder::new().read(head).read(tail).build();
        let mut conn = Connection::from_stream(stream, config());

        let packet = conn.read_packet().await.unwrap().unwrap();
        assert_eq!(packet.peer, "ps-server");
        assert_eq!(packet.message(), b"Hello");

        // Mock is exhausted: the stream reports EOF
        assert!(conn.read_packet().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_send_packet_keeps_payload() {
        let packet = Packet::new(CMD_ECHO, "ps-server", Bytes::from_static(&[0xAA, 0xBB]));
        let stream = tokio_test::io::Builder::new()
            .write(&packet.encode().unwrap())
            .build();
        let mut conn = Connection::from_stream(stream, config());

        assert_eq!(conn.send_packet(&packet).await.unwrap(), 8 + 10 + 2);
    }

    #[tokio::test]
    async fn test_read_packet_unframed_reply() {
        let mut reply = vec![CMD_ECHO, 0, 0, 0, 0, 0, 0, 0];
        reply.extend_from_slice(b"ps-server\0Hello\0");

        let stream = tokio_test::io::Builder::new().read(&reply).build();
        let mut conn = Connection::from_stream(stream, config());

        let packet = conn.read_packet().await.unwrap().unwrap();
        assert_eq!(packet, Packet::parse(&reply).unwrap());
        assert_eq!(packet.message(), b"Hello");
        assert!(conn.read_packet().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_raw_reports_closed() {
        let stream = tokio_test::io::Builder::new().build();
        let mut conn = Connection::from_stream(stream, config());

        let result = conn.read_raw().await;
        assert!(matches!(result, Err(ClientError::ConnectionClosed)));
    }
}
