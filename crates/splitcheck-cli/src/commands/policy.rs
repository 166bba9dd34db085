//! Rate limit policy commands

use std::path::Path;

use anyhow::{bail, Result};
use splitcheck_core::config::embedded_policy;
use splitcheck_core::{Database, RateLimitPolicy};

use super::LayeredPolicyStore;

/// Fields to change with `policy set`; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct PolicyUpdate {
    pub cooldown_ms: Option<i64>,
    pub max_attempts: Option<u32>,
    pub prompt: Option<String>,
    pub model: Option<String>,
}

impl PolicyUpdate {
    pub fn apply(self, mut policy: RateLimitPolicy) -> Result<RateLimitPolicy> {
        if let Some(cooldown) = self.cooldown_ms {
            if cooldown < 0 {
                bail!("--cooldown-ms must not be negative");
            }
            policy.cooldown_window_ms = cooldown;
        }
        if let Some(max) = self.max_attempts {
            policy.max_attempts_per_window = max;
        }
        if let Some(prompt) = self.prompt {
            policy.extraction_prompt = prompt;
        }
        if let Some(model) = self.model {
            if model.trim().is_empty() {
                bail!("--model must not be empty");
            }
            policy.model_identifier = model;
        }
        Ok(policy)
    }
}

fn print_policy(policy: &RateLimitPolicy) {
    println!("   Window:        {} ms", policy.cooldown_window_ms);
    println!("   Max attempts:  {}", policy.max_attempts_per_window);
    println!("   Model:         {}", policy.model_identifier);
    if policy.extraction_prompt.is_empty() {
        println!("   Prompt:        (default)");
    } else {
        println!("   Prompt:        {}", policy.extraction_prompt);
    }
}

pub fn cmd_policy_show(db: &Database, policy_path: Option<&Path>) -> Result<()> {
    match LayeredPolicyStore::new(db.clone(), policy_path).resolve()? {
        Some((policy, source)) => {
            println!("\n📋 Rate limit policy (from {})", source);
            print_policy(&policy);
            println!();
        }
        None => println!("⚠️  No rate limit policy configured"),
    }
    Ok(())
}

pub fn cmd_policy_set(db: &Database, policy_path: Option<&Path>, update: PolicyUpdate) -> Result<()> {
    let current = match LayeredPolicyStore::new(db.clone(), policy_path).resolve()? {
        Some((policy, _)) => policy,
        None => embedded_policy()?,
    };

    let policy = update.apply(current)?;
    db.set_policy(&policy)?;

    println!("✅ Policy saved to database");
    print_policy(&policy);
    Ok(())
}

pub fn cmd_policy_clear(db: &Database) -> Result<()> {
    db.clear_policy()?;
    println!("✅ Database policy removed (policy file applies)");
    Ok(())
}
