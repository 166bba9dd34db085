//! Splitcheck CLI - Receipt splitter
//!
//! Usage:
//!   splitcheck extract --image photo.jpg --user me   Extract a receipt
//!   splitcheck report all --session dinner.json      Per-person split
//!   splitcheck report one --session dinner.json      Split for one person
//!   splitcheck policy show                           Show rate limits

mod cli;
mod commands;


use anyhow::{anyhow, Result};
use clap::Parser;
use splitcheck_core::ExtractionClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Parse { file, session_out } => {
            commands::cmd_parse(&file, session_out.as_deref())
        }
        Commands::Extract {
            image,
            user,
            language,
            session_out,
        } => {
            let db = commands::open_db(&cli.db)?;
            let client = ExtractionClient::from_env().ok_or_else(|| {
                anyhow!("No extraction backend configured (set GEMINI_API_KEY or EXTRACTION_BACKEND=mock)")
            })?;
            commands::cmd_extract(
                &db,
                cli.policy.as_deref(),
                client,
                &image,
                &user,
                language.as_deref(),
                session_out.as_deref(),
            )
            .await
        }
        Commands::Report { mode } => match mode {
            ReportMode::All { session } => commands::cmd_report_all(&session),
            ReportMode::One { session } => commands::cmd_report_one(&session),
        },
        Commands::Attempts { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                AttemptsAction::Show { user } => {
                    commands::cmd_attempts_show(&db, cli.policy.as_deref(), &user)
                }
                AttemptsAction::Reset { user } => commands::cmd_attempts_reset(&db, &user),
            }
        }
        Commands::Policy { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                PolicyAction::Show => commands::cmd_policy_show(&db, cli.policy.as_deref()),
                PolicyAction::Set {
                    cooldown_ms,
                    max_attempts,
                    prompt,
                    model,
                } => commands::cmd_policy_set(
                    &db,
                    cli.policy.as_deref(),
                    commands::PolicyUpdate {
                        cooldown_ms,
                        max_attempts,
                        prompt,
                        model,
                    },
                ),
                PolicyAction::Clear => commands::cmd_policy_clear(&db),
            }
        }
    }
}
