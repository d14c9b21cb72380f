//! teol0cli - example client for the Teonet L0 server
//!
//! `echo` performs one request/reply exchange, `listen` runs the event loop
//! and forwards console lines as echo commands.

mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use teonet_l0::DEFAULT_PORT;
use teonet_l0_client::{Connection, ConnectionConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "teol0cli")]
#[command(about = "Teonet L0 client example")]
#[command(version)]
struct Cli {
    /// Server address (host:port)
    #[arg(short, long, env = "TEONET_L0_SERVER", default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Host name announced in the login packet
    #[arg(long, default_value = "C2")]
    host_name: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one echo command and print the reply
    Echo {
        /// Peer that should echo the message
        #[arg(short, long, default_value = "ps-server")]
        peer: String,

        /// Message text
        #[arg(short, long, default_value = "Hello world from Teonet L0 client sample!")]
        message: String,
    },

    /// Answer echo requests and send console lines until the server disconnects
    Listen {
        /// Peer that receives the greeting and console lines
        #[arg(short, long, default_value = "ps-server")]
        peer: String,

        /// Greeting sent right after login
        #[arg(short, long, default_value = "Hello world from Teonet L0 async client sample!")]
        message: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = ConnectionConfig::new(&cli.server, &cli.host_name);
    let conn = match Connection::connect(config).await {
        Ok(conn) => {
            tracing::info!("Connected to {} as {}", cli.server, cli.host_name);
            conn
        }
        Err(e) => {
            eprintln!("{}: {}: {}", "Connection failed".red(), cli.server, e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Echo { peer, message } => commands::echo(conn, &peer, &message).await,
        Commands::Listen { peer, message } => commands::listen(conn, &peer, &message).await,
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(1);
    }
}
