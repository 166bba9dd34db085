//! Attempt history commands

use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use splitcheck_core::{attempts_remaining, AttemptStore, Database};

use super::LayeredPolicyStore;

pub fn cmd_attempts_show(db: &Database, policy_path: Option<&Path>, user: &str) -> Result<()> {
    let state = db.get_attempts(user)?;
    let policy = LayeredPolicyStore::new(db.clone(), policy_path).resolve()?;

    println!("\n👤 {}", user);
    match &state {
        Some(s) => {
            let started = DateTime::<Utc>::from_timestamp_millis(s.last_attempt_timestamp_ms)
                .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| s.last_attempt_timestamp_ms.to_string());
            println!("   Window started: {}", started);
            println!("   Attempts used:  {}", s.attempts);
        }
        None => println!("   No attempts recorded"),
    }

    match policy {
        Some((policy, _)) => {
            let now_ms = Utc::now().timestamp_millis();
            println!(
                "   Attempts left:  {} of {}",
                attempts_remaining(state.as_ref(), &policy, now_ms),
                policy.max_attempts_per_window
            );
        }
        None => println!("   ⚠️  No rate limit policy configured"),
    }
    println!();

    Ok(())
}

pub fn cmd_attempts_reset(db: &Database, user: &str) -> Result<()> {
    db.delete_attempts(user)?;
    println!("✅ Attempt history cleared for {}", user);
    Ok(())
}
