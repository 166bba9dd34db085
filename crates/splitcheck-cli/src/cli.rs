//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Splitcheck - Split a restaurant receipt between friends
#[derive(Parser)]
#[command(name = "splitcheck")]
#[command(about = "Receipt extraction and bill splitting", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path (attempt history and policy)
    #[arg(long, default_value = "splitcheck.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Policy TOML file used when the database holds no policy
    ///
    /// Defaults to ~/.local/share/splitcheck/config/policy.toml, then the
    /// built-in defaults.
    #[arg(long, global = true)]
    pub policy: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a saved extraction response and print the receipt
    Parse {
        /// JSON file in the extraction schema
        file: PathBuf,

        /// Write a split session file for `report`
        #[arg(long)]
        session_out: Option<PathBuf>,
    },

    /// Extract a receipt from a photo (rate limited per user)
    Extract {
        /// Receipt photo (jpg, png, webp, heic)
        #[arg(short, long)]
        image: PathBuf,

        /// User the attempt is counted against
        #[arg(short, long)]
        user: String,

        /// Translate item names into this language
        #[arg(short, long)]
        language: Option<String>,

        /// Write a split session file for `report`
        #[arg(long)]
        session_out: Option<PathBuf>,
    },

    /// Build a split report from a session file
    Report {
        #[command(subcommand)]
        mode: ReportMode,
    },

    /// Inspect or reset a user's extraction attempts
    Attempts {
        #[command(subcommand)]
        action: AttemptsAction,
    },

    /// Show or change the rate limit policy
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },
}

#[derive(Subcommand)]
pub enum ReportMode {
    /// Per-person report, every unit shared among its consumers
    All {
        /// Session JSON file
        #[arg(short, long)]
        session: PathBuf,
    },
    /// Report for one person's selected quantities
    One {
        /// Session JSON file
        #[arg(short, long)]
        session: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum AttemptsAction {
    /// Show attempts used in the current window
    Show {
        #[arg(short, long)]
        user: String,
    },
    /// Forget a user's attempt history
    Reset {
        #[arg(short, long)]
        user: String,
    },
}

#[derive(Subcommand)]
pub enum PolicyAction {
    /// Show the active policy and where it comes from
    Show,
    /// Store a policy in the database (unset fields keep their current value)
    Set {
        /// Attempt window length in milliseconds
        #[arg(long)]
        cooldown_ms: Option<i64>,

        /// Extractions allowed per window
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Prompt sent with every receipt image
        #[arg(long)]
        prompt: Option<String>,

        /// Model identifier (e.g. gemini-2.0-flash)
        #[arg(long)]
        model: Option<String>,
    },
    /// Remove the database policy (fall back to the policy file)
    Clear,
}
