//! # teonet-l0-client
//!
//! Client library for the Teonet L0 server.
//!
//! This crate provides:
//! - Async TCP connection sending login and command packets
//! - A one-shot echo exchange
//! - A single-threaded event loop that answers echo requests
//!
//! No timeouts are applied to connect, send or receive: an unresponsive
//! server blocks the caller until the process is stopped.

pub mod client;
pub mod connection;
pub mod error;
pub mod events;

pub use client::exchange_echo;
pub use connection::{Connection, ConnectionConfig};
pub use error::ClientError;
pub use events::{ClientEvent, ClientState, EventLoop};
