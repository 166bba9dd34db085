//! Shared command utilities
//!
//! This module contains:
//! - `open_db` - Open the attempt/policy database
//! - `LayeredPolicyStore` - Database policy first, then the policy file

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use splitcheck_core::config::default_policy_path;
use splitcheck_core::{Database, FilePolicyStore, PolicyStore, RateLimitPolicy};

pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow!("Database path is not valid UTF-8: {}", db_path.display()))?;
    Database::open(path_str).context("Failed to open database")
}

/// Where the active policy was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    Database,
    File(PathBuf),
    Embedded,
}

impl std::fmt::Display for PolicySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicySource::Database => write!(f, "database"),
            PolicySource::File(path) => write!(f, "{}", path.display()),
            PolicySource::Embedded => write!(f, "built-in defaults"),
        }
    }
}

/// Policy lookup used by the CLI: a policy stored in the database wins,
/// otherwise the TOML file (or built-in defaults) applies
pub struct LayeredPolicyStore {
    db: Database,
    file: FilePolicyStore,
    file_path: Option<PathBuf>,
}

impl LayeredPolicyStore {
    pub fn new(db: Database, policy_path: Option<&Path>) -> Self {
        let file_path = policy_path
            .map(Path::to_path_buf)
            .or_else(default_policy_path);
        let file = match policy_path {
            Some(path) => FilePolicyStore::with_path(path.to_path_buf()),
            None => FilePolicyStore::new(),
        };
        Self {
            db,
            file,
            file_path,
        }
    }

    /// The active policy together with where it came from
    pub fn resolve(&self) -> Result<Option<(RateLimitPolicy, PolicySource)>> {
        if let Some(policy) = self.db.get_policy()? {
            return Ok(Some((policy, PolicySource::Database)));
        }

        let source = match &self.file_path {
            Some(path) if path.exists() => PolicySource::File(path.clone()),
            _ => PolicySource::Embedded,
        };
        Ok(self.file.get_policy()?.map(|policy| (policy, source)))
    }
}

impl PolicyStore for LayeredPolicyStore {
    fn get_policy(&self) -> splitcheck_core::Result<Option<RateLimitPolicy>> {
        match self.db.get_policy()? {
            Some(policy) => Ok(Some(policy)),
            None => self.file.get_policy(),
        }
    }
}
