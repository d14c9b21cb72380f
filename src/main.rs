//! bintray - publish Teonet build artifacts
//!
//! Uploads single files, publishes artifact directories and prunes old
//! package files. Credentials come from BINTRAY_USER and BINTRAY_PASS.

mod commands;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use teonet_bintray::{report, RepoKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bintray")]
#[command(about = "Publish Teonet packages to Bintray")]
#[command(version)]
struct Cli {
    /// Log HTTP requests and internal steps
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload one file to an explicit API path
    Upload {
        /// Remote path below the API base, e.g. /content/org/repo/pkg/ver/file
        remote_path: String,

        /// Local file to upload
        local_file: PathBuf,
    },

    /// Classify and upload every package below a directory
    Publish {
        /// Artifact directory
        directory: PathBuf,

        /// Repository kind for all files (ubuntu, debian, centos, fedora, rhel, opensuse, tar)
        #[arg(long)]
        repo_kind: Option<RepoKind>,
    },

    /// Delete all but the newest files of every package group
    Prune {
        /// Remote repository
        repo: String,

        /// Files kept per group (defaults to the configured retention)
        #[arg(short, long)]
        keep: Option<usize>,

        /// Include unpublished files
        #[arg(long)]
        include_unpublished: bool,

        /// Only report what would be deleted
        #[arg(long)]
        dry_run: bool,
    },

    /// List package files in a repository
    Files {
        /// Remote repository
        repo: String,

        /// Include unpublished files
        #[arg(long)]
        include_unpublished: bool,
    },

    /// Show the package and its versions in a repository
    Versions {
        /// Remote repository
        repo: String,
    },

    /// Show how filenames map to release targets (no network access)
    Classify {
        /// Artifact filenames
        #[arg(required = true)]
        files: Vec<String>,

        /// Repository kind overriding detection
        #[arg(long)]
        repo_kind: Option<RepoKind>,
    },
}

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => usage_error(e),
    };

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::execute(cli.command).await {
        report::error(&e);
        std::process::exit(e.exit_code());
    }
}

fn usage_error(e: clap::Error) -> ! {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        ErrorKind::InvalidSubcommand
        | ErrorKind::MissingSubcommand
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            report::error(known_commands());
        }
        _ => {
            let _ = e.print();
        }
    }
    std::process::exit(1);
}

fn known_commands() -> String {
    let mut out = String::from("Please, specify a valid command:");
    for command in Cli::command().get_subcommands() {
        if command.get_name() != "help" {
            out.push_str("\n  ");
            out.push_str(command.get_name());
        }
    }
    out
}
