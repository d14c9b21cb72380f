//! Event-driven client loop.
//!
//! The loop owns one connection and waits on a single readiness point: the
//! socket or, when attached, a console line source. It never spawns tasks.

use crate::connection::Connection;
use crate::error::ClientError;
use teonet_l0::{Packet, CMD_ECHO, CMD_ECHO_ANSWER};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, Empty, Lines};

/// Lifecycle of an [`EventLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// TCP connection established, login not yet sent.
    Connected,
    /// Login and greeting sent, waiting on socket or console.
    AwaitingIo,
    /// Server closed the stream.
    Disconnected,
}

/// Events reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected,
    Received(Packet),
    Disconnected,
}

enum Ready {
    Socket(Result<Option<Packet>, ClientError>),
    Console(std::io::Result<Option<String>>),
}

/// Single-threaded client loop answering echo requests.
pub struct EventLoop<S, I = Empty> {
    conn: Connection<S>,
    peer: String,
    greeting: Vec<u8>,
    console: Option<Lines<I>>,
    state: ClientState,
    sequence: u64,
}

impl<S: AsyncRead + AsyncWrite + Unpin> EventLoop<S> {
    /// Creates a loop that greets `peer` with an echo of `greeting` on start.
    pub fn new(conn: Connection<S>, peer: impl Into<String>, greeting: impl Into<Vec<u8>>) -> Self {
        Self {
            conn,
            peer: peer.into(),
            greeting: greeting.into(),
            console: None,
            state: ClientState::Connected,
            sequence: 0,
        }
    }
}

impl<S, I> EventLoop<S, I>
where
    S: AsyncRead + AsyncWrite + Unpin,
    I: AsyncBufRead + Unpin,
{
    /// Attaches a console; every non-empty line is sent to the peer as an echo.
    pub fn with_console<J: AsyncBufRead + Unpin>(self, input: J) -> EventLoop<S, J> {
        EventLoop {
            conn: self.conn,
            peer: self.peer,
            greeting: self.greeting,
            console: Some(input.lines()),
            state: self.state,
            sequence: self.sequence,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Runs until the server closes the connection.
    ///
    /// `on_event` receives a running sequence number (starting at 1) and the
    /// loop state with each event. `Disconnected` is always the last event,
    /// also when the loop ends with an error.
    pub async fn run<F>(&mut self, mut on_event: F) -> Result<(), ClientError>
    where
        F: FnMut(u64, ClientState, &ClientEvent),
    {
        self.emit(ClientEvent::Connected, &mut on_event);
        let result = self.drive(&mut on_event).await;
        self.state = ClientState::Disconnected;
        self.emit(ClientEvent::Disconnected, &mut on_event);
        result
    }

    async fn drive<F>(&mut self, on_event: &mut F) -> Result<(), ClientError>
    where
        F: FnMut(u64, ClientState, &ClientEvent),
    {
        self.conn.send_login().await?;
        let peer = self.peer.clone();
        self.conn.send_command(CMD_ECHO, &peer, &self.greeting).await?;
        self.state = ClientState::AwaitingIo;

        loop {
            let ready = tokio::select! {
                packet = self.conn.read_packet() => Ready::Socket(packet),
                line = next_line(&mut self.console), if self.console.is_some() => Ready::Console(line),
            };

            match ready {
                Ready::Socket(Ok(Some(packet))) => {
                    if packet.command == CMD_ECHO {
                        let answer =
                            Packet::new(CMD_ECHO_ANSWER, packet.peer.clone(), packet.payload.clone());
                        self.conn.send_packet(&answer).await?;
                    }
                    self.emit(ClientEvent::Received(packet), on_event);
                }
                Ready::Socket(Ok(None)) => return Ok(()),
                Ready::Socket(Err(ClientError::Protocol(e))) => {
                    tracing::warn!("Dropped unreadable data from server: {}", e);
                }
                Ready::Socket(Err(e)) if e.is_disconnect() => {
                    tracing::debug!("Socket error treated as disconnect: {}", e);
                    return Ok(());
                }
                Ready::Socket(Err(e)) => return Err(e),
                Ready::Console(Ok(Some(line))) => {
                    let line = line.trim_end();
                    if !line.is_empty() {
                        self.conn.send_command(CMD_ECHO, &peer, line.as_bytes()).await?;
                    }
                }
                Ready::Console(Ok(None)) => {
                    tracing::debug!("Console closed");
                    self.console = None;
                }
                Ready::Console(Err(e)) => {
                    tracing::warn!("Console read failed: {}", e);
                    self.console = None;
                }
            }
        }
    }

    fn emit<F>(&mut self, event: ClientEvent, on_event: &mut F)
    where
        F: FnMut(u64, ClientState, &ClientEvent),
    {
        self.sequence += 1;
        on_event(self.sequence, self.state, &event);
    }
}

async fn next_line<I: AsyncBufRead + Unpin>(
    console: &mut Option<Lines<I>>,
) -> std::io::Result<Option<String>> {
    match console {
        Some(lines) => lines.next_line().await,
        None => std::future::pending().await,
    }
}
