//! Client error types.

use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] teonet_l0::ProtocolError),

    #[error("connection closed")]
    ConnectionClosed,
}

impl ClientError {
    /// Returns whether the peer went away (as opposed to a local failure).
    pub fn is_disconnect(&self) -> bool {
        match self {
            ClientError::ConnectionClosed => true,
            ClientError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ),
            ClientError::Protocol(_) => false,
        }
    }
}
