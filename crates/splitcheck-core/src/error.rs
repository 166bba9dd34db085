//! Error types for splitcheck

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Malformed extraction: {0}")]
    MalformedExtraction(String),

    #[error("You have exceeded the maximum number of attempts")]
    RateLimitExceeded {
        /// Always zero; kept so callers can render the remaining count uniformly
        attempts_left: u32,
        wait_time_ms: i64,
    },

    #[error("Failed to load receipt constants")]
    PolicyUnavailable,

    #[error("Extraction backend error: {0}")]
    Backend(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Whole seconds the user has to wait, rounded up, for rate limit errors
    pub fn wait_seconds(&self) -> Option<i64> {
        match self {
            Error::RateLimitExceeded { wait_time_ms, .. } => {
                Some((*wait_time_ms).max(0).saturating_add(999) / 1000)
            }
            _ => None,
        }
    }

    /// Message suitable for showing to the person who triggered the error
    pub fn user_message(&self) -> String {
        match self {
            Error::RateLimitExceeded { .. } => format!(
                "You have exceeded the maximum number of attempts. No attempts left. Please try again in {} seconds.",
                self.wait_seconds().unwrap_or(0)
            ),
            Error::MalformedExtraction(_) => {
                "Could not read the receipt. Please try again with a new photo.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
