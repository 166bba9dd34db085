//! Rate limit policy operations

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::config::PolicyStore;
use crate::error::Result;
use crate::models::RateLimitPolicy;

impl Database {
    /// Insert or replace the global policy row
    pub fn set_policy(&self, policy: &RateLimitPolicy) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO receipt_policy
                (id, cooldown_window_ms, max_attempts_per_window, extraction_prompt, model_identifier)
             VALUES (1, ?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                cooldown_window_ms = excluded.cooldown_window_ms,
                max_attempts_per_window = excluded.max_attempts_per_window,
                extraction_prompt = excluded.extraction_prompt,
                model_identifier = excluded.model_identifier,
                updated_at = CURRENT_TIMESTAMP",
            params![
                policy.cooldown_window_ms,
                policy.max_attempts_per_window,
                policy.extraction_prompt,
                policy.model_identifier,
            ],
        )?;
        Ok(())
    }

    /// Remove the policy row; extraction is refused until one is set again
    pub fn clear_policy(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM receipt_policy", [])?;
        Ok(())
    }
}

impl PolicyStore for Database {
    fn get_policy(&self) -> Result<Option<RateLimitPolicy>> {
        let conn = self.conn()?;
        let policy = conn
            .query_row(
                "SELECT cooldown_window_ms, max_attempts_per_window, extraction_prompt, model_identifier
                 FROM receipt_policy WHERE id = 1",
                [],
                |row| {
                    Ok(RateLimitPolicy {
                        cooldown_window_ms: row.get(0)?,
                        max_attempts_per_window: row.get(1)?,
                        extraction_prompt: row.get(2)?,
                        model_identifier: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(policy)
    }
}
