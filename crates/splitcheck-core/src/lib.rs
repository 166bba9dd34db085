//! Splitcheck Core Library
//!
//! Shared functionality for the splitcheck receipt splitter:
//! - Receipt and line item model
//! - Split expansion for the "for all" and "for one" modes
//! - Plain-text split report builders
//! - Per-user extraction attempt limiter
//! - Pluggable AI extraction backends (Gemini, mock)
//! - Attempt/policy storage (SQLite, in-memory)
//! - Split session with change-aware recomputation

pub mod ai;
pub mod config;
pub mod db;
pub mod edit;
pub mod error;
pub mod expand;
pub mod limiter;
pub mod models;
pub mod money;
pub mod report;
pub mod service;
pub mod session;
pub mod store;

pub use ai::{
    parse_extraction, parse_extraction_as, ExtractionBackend, ExtractionClient, ExtractionRequest, GeminiBackend,
    ImageInput, MockBackend, SchemaVariant,
};
pub use config::{FilePolicyStore, PolicyStore};
pub use db::Database;
pub use error::{Error, Result};
pub use expand::{expand_for_all, expand_for_one, items_fingerprint};
pub use limiter::{attempts_remaining, evaluate_attempt, AttemptDecision};
pub use models::{
    AttemptState, ConsumerSet, ExpandedUnit, LineItem, RateLimitPolicy, Receipt,
    ReceiptWithItems, SelectableUnit,
};
pub use money::round2;
pub use report::{build_report_for_all, build_report_for_one};
pub use service::{Clock, ExtractionOutcome, ExtractionService, FixedClock, SystemClock};
pub use session::{ConsumerRoster, SplitSession};
pub use store::{AttemptStore, MemoryStore};
