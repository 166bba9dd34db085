//! Attempt state storage
//!
//! The limiter needs a per-user get/set/delete. [`crate::db::Database`] is the
//! persistent implementation; [`MemoryStore`] keeps everything in process.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::config::PolicyStore;
use crate::error::{Error, Result};
use crate::models::{AttemptState, RateLimitPolicy};

/// Per-user attempt state storage
pub trait AttemptStore: Send + Sync {
    fn get_attempts(&self, user_id: &str) -> Result<Option<AttemptState>>;

    /// Insert or overwrite the state for a user
    fn set_attempts(&self, user_id: &str, state: &AttemptState) -> Result<()>;

    /// Remove a user's record (account removal); missing records are fine
    fn delete_attempts(&self, user_id: &str) -> Result<()>;
}

/// In-process store for attempts and policy
#[derive(Default)]
pub struct MemoryStore {
    attempts: Mutex<HashMap<String, AttemptState>>,
    policy: Mutex<Option<RateLimitPolicy>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: RateLimitPolicy) -> Self {
        Self {
            attempts: Mutex::new(HashMap::new()),
            policy: Mutex::new(Some(policy)),
        }
    }

    pub fn set_policy(&self, policy: Option<RateLimitPolicy>) -> Result<()> {
        *self.policy.lock().map_err(|_| lock_error())? = policy;
        Ok(())
    }
}

fn lock_error() -> Error {
    Error::InvalidData("Memory store lock poisoned".into())
}

impl AttemptStore for MemoryStore {
    fn get_attempts(&self, user_id: &str) -> Result<Option<AttemptState>> {
        let attempts = self.attempts.lock().map_err(|_| lock_error())?;
        Ok(attempts.get(user_id).copied())
    }

    fn set_attempts(&self, user_id: &str, state: &AttemptState) -> Result<()> {
        let mut attempts = self.attempts.lock().map_err(|_| lock_error())?;
        attempts.insert(user_id.to_string(), *state);
        Ok(())
    }

    fn delete_attempts(&self, user_id: &str) -> Result<()> {
        let mut attempts = self.attempts.lock().map_err(|_| lock_error())?;
        attempts.remove(user_id);
        Ok(())
    }
}

impl PolicyStore for MemoryStore {
    fn get_policy(&self) -> Result<Option<RateLimitPolicy>> {
        Ok(self.policy.lock().map_err(|_| lock_error())?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get_attempts("u1").unwrap(), None);

        let state = AttemptState {
            last_attempt_timestamp_ms: 42,
            attempts: 2,
        };
        store.set_attempts("u1", &state).unwrap();
        assert_eq!(store.get_attempts("u1").unwrap(), Some(state));
        assert_eq!(store.get_attempts("u2").unwrap(), None);

        store.delete_attempts("u1").unwrap();
        assert_eq!(store.get_attempts("u1").unwrap(), None);
        store.delete_attempts("u1").unwrap();
    }

    #[test]
    fn test_memory_store_policy() {
        let store = MemoryStore::new();
        assert_eq!(store.get_policy().unwrap(), None);

        let policy = RateLimitPolicy {
            cooldown_window_ms: 1_000,
            max_attempts_per_window: 2,
            extraction_prompt: String::new(),
            model_identifier: "m".into(),
        };
        store.set_policy(Some(policy.clone())).unwrap();
        assert_eq!(store.get_policy().unwrap(), Some(policy));
    }
}
