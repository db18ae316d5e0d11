//! CLI command definitions for the `relaychat` binary.
//!
//! `serve` runs the HTTP server; the remaining commands are admin tools that
//! operate on an authenticated user's stored data.

pub mod history;
pub mod usage;

use clap::{Parser, Subcommand};

/// Chat back-end with provider fallback and per-identity message quotas.
#[derive(Parser)]
#[command(name = "relaychat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on.
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
    },

    /// Show the message quota of a user.
    Usage {
        /// Authenticated user id.
        #[arg(long)]
        user: String,
    },

    /// Reset the message quota of a user.
    ResetUsage {
        /// Authenticated user id.
        #[arg(long)]
        user: String,
    },

    /// Delete the stored chat history of a user.
    ClearHistory {
        /// Authenticated user id.
        #[arg(long)]
        user: String,
    },
}
