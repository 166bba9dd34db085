//! Rate limit policy configuration
//!
//! The policy is global and read-only to the extraction flow. It can come
//! from the database (see [`crate::db::Database::set_policy`]) or from a TOML
//! file.
//!
//! ## File Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/splitcheck/config/policy.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::RateLimitPolicy;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/policy.toml");

/// Source of the global rate limit policy
pub trait PolicyStore: Send + Sync {
    /// The current policy, or `None` when no policy document exists
    fn get_policy(&self) -> Result<Option<RateLimitPolicy>>;
}

/// Get the default override path
pub fn default_policy_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("splitcheck").join("config").join("policy.toml"))
}

/// Parse a policy from TOML text
pub fn parse_policy(content: &str) -> Result<RateLimitPolicy> {
    let policy: RateLimitPolicy = toml::from_str(content)?;
    if policy.cooldown_window_ms < 0 {
        return Err(Error::InvalidData(
            "cooldown_window_ms must not be negative".into(),
        ));
    }
    if policy.model_identifier.trim().is_empty() {
        return Err(Error::InvalidData("model_identifier must be set".into()));
    }
    Ok(policy)
}

/// The policy compiled into the binary
pub fn embedded_policy() -> Result<RateLimitPolicy> {
    parse_policy(DEFAULT_CONFIG)
}

/// Load a policy (override first, then default)
pub fn load_policy(override_path: Option<&Path>) -> Result<RateLimitPolicy> {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(default_policy_path);

    match path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::InvalidData(format!("Failed to read {}: {}", path.display(), e))
            })?;
            parse_policy(&content)
        }
        _ => embedded_policy(),
    }
}

/// Policy store backed by a TOML file
///
/// The file is re-read on every lookup so edits apply without a restart.
/// With `strict` set, a missing file means "no policy" rather than falling
/// back to the embedded defaults.
pub struct FilePolicyStore {
    path: Option<PathBuf>,
    strict: bool,
}

impl FilePolicyStore {
    /// Resolve from the default override location, then embedded defaults
    pub fn new() -> Self {
        Self {
            path: None,
            strict: false,
        }
    }

    /// Use an explicit file, falling back to embedded defaults if it is missing
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            strict: false,
        }
    }

    /// Use an explicit file only
    pub fn strict(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            strict: true,
        }
    }
}

impl Default for FilePolicyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PolicyStore for FilePolicyStore {
    fn get_policy(&self) -> Result<Option<RateLimitPolicy>> {
        match (&self.path, self.strict) {
            (Some(path), true) if !path.exists() => Ok(None),
            (path, _) => load_policy(path.as_deref()).map(Some),
        }
    }
}
