//! Extraction attempt operations

use rusqlite::{params, OptionalExtension};

use super::Database;
use crate::error::Result;
use crate::models::AttemptState;
use crate::store::AttemptStore;

impl Database {
    /// Number of users with an attempt record
    pub fn count_attempt_records(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM user_attempts", [], |row| row.get(0))?;
        Ok(count)
    }
}

impl AttemptStore for Database {
    fn get_attempts(&self, user_id: &str) -> Result<Option<AttemptState>> {
        let conn = self.conn()?;
        let state = conn
            .query_row(
                "SELECT last_attempt_ms, attempts FROM user_attempts WHERE user_id = ?",
                params![user_id],
                |row| {
                    Ok(AttemptState {
                        last_attempt_timestamp_ms: row.get(0)?,
                        attempts: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    fn set_attempts(&self, user_id: &str, state: &AttemptState) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO user_attempts (user_id, last_attempt_ms, attempts)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
                last_attempt_ms = excluded.last_attempt_ms,
                attempts = excluded.attempts,
                updated_at = CURRENT_TIMESTAMP",
            params![user_id, state.last_attempt_timestamp_ms, state.attempts],
        )?;
        Ok(())
    }

    fn delete_attempts(&self, user_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM user_attempts WHERE user_id = ?",
            params![user_id],
        )?;
        Ok(())
    }
}
