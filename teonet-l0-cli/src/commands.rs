//! Command execution.

use colored::Colorize;
use teonet_l0::{Packet, PACKET_HEADER_SIZE};
use teonet_l0_client::{exchange_echo, ClientError, ClientEvent, Connection, EventLoop};
use tokio::io::BufReader;
use tokio::net::TcpStream;

/// Runs the one-shot echo exchange and prints what was sent and received.
pub async fn echo(
    mut conn: Connection<TcpStream>,
    peer: &str,
    message: &str,
) -> Result<(), ClientError> {
    println!("Teonet L0 client example, ver. {}\n", env!("CARGO_PKG_VERSION"));

    let host_name = conn.config().host_name.clone();
    println!(
        "Send {} bytes initialize packet to L0 server",
        PACKET_HEADER_SIZE + 1 + host_name.len() + 1
    );
    println!(
        "Send {} bytes packet to L0 server to peer {}, data: {}",
        PACKET_HEADER_SIZE + peer.len() + 1 + message.len() + 1,
        peer.cyan(),
        message
    );

    let reply = exchange_echo(&mut conn, peer, message.as_bytes()).await?;
    println!(
        "Receive {} bytes data from L0 server, from peer {}, cmd: {}, data: {}",
        reply.payload.len(),
        reply.peer.cyan(),
        reply.command,
        reply.message_lossy()
    );

    conn.close().await?;
    println!("{}", "done".green());
    Ok(())
}

/// Runs the event loop with stdin as console until the server disconnects.
pub async fn listen(
    conn: Connection<TcpStream>,
    peer: &str,
    message: &str,
) -> Result<(), ClientError> {
    println!(
        "Teonet L0 async client example, ver. {}\n",
        env!("CARGO_PKG_VERSION")
    );

    let stdin = BufReader::new(tokio::io::stdin());
    let mut event_loop = EventLoop::new(conn, peer, message).with_console(stdin);
    event_loop
        .run(|seq, _, event| println!("{}", format_event(seq, event)))
        .await
}

fn format_event(seq: u64, event: &ClientEvent) -> String {
    match event {
        ClientEvent::Connected => format!("{}: {}", seq, "Connected".green()),
        ClientEvent::Disconnected => format!("{}: {}", seq, "Disconnected".yellow()),
        ClientEvent::Received(packet) => format_received(seq, packet),
    }
}

fn format_received(seq: u64, packet: &Packet) -> String {
    format!(
        "{}: Receive {} bytes: {} bytes data from L0 server, from peer {}, cmd: {}, data: {}",
        seq,
        packet.encoded_len(),
        packet.message().len(),
        packet.peer,
        packet.command,
        packet.message_lossy()
    )
}
