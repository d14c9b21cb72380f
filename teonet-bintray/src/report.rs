//! User-facing output lines.
//!
//! Progress goes to stdout with a `BINTRAY:` prefix; warnings and errors go
//! to stderr.

use colored::Colorize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl Level {
    pub fn prefix(self) -> &'static str {
        match self {
            Level::Info => "BINTRAY:",
            Level::Warning => "BINTRAY WARNING:",
            Level::Error => "BINTRAY ERROR:",
        }
    }
}

/// Formats one output line.
pub fn line(level: Level, message: impl Display) -> String {
    let prefix = match level {
        Level::Info => level.prefix().green(),
        Level::Warning => level.prefix().yellow(),
        Level::Error => level.prefix().red(),
    };
    format!("{} {}", prefix, message)
}

pub fn info(message: impl Display) {
    println!("{}", line(Level::Info, message));
}

pub fn warning(message: impl Display) {
    eprintln!("{}", line(Level::Warning, message));
}

pub fn error(message: impl Display) {
    eprintln!("{}", line(Level::Error, message));
}
