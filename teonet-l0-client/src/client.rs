//! One-shot echo exchange.

use crate::connection::Connection;
use crate::error::ClientError;
use teonet_l0::{Packet, CMD_ECHO};
use tokio::io::{AsyncRead, AsyncWrite};

/// Logs in, sends one echo command to `peer` and waits for a single reply.
///
/// The reply is whatever one read returns, parsed leniently with
/// [`Packet::parse`]: a reply split across several TCP segments is not
/// reassembled.
pub async fn exchange_echo<S>(
    conn: &mut Connection<S>,
    peer: &str,
    message: &[u8],
) -> Result<Packet, ClientError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let login = conn.send_login().await?;
    let command = conn.send_command(CMD_ECHO, peer, message).await?;
    tracing::debug!("Sent login ({} bytes) and echo ({} bytes)", login, command);

    let raw = conn.read_raw().await?;
    let reply = Packet::parse(&raw)?;
    tracing::debug!(
        "Received {} bytes reply cmd={} from peer {}",
        raw.len(),
        reply.command,
        reply.peer
    );
    Ok(reply)
}
