//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `attempts` - Attempt history commands (show, reset)
//! - `extract` - Rate-limited receipt extraction
//! - `parse` - Parse a saved extraction response
//! - `policy` - Rate limit policy commands (show, set, clear)
//! - `report` - Split report generation
//! - `session` - Split session file format
//! - `shared` - Shared utilities (open_db, policy resolution)

pub mod attempts;
pub mod extract;
pub mod parse;
pub mod policy;
pub mod report;
pub mod session;
pub mod shared;

// Re-export command functions for main.rs
pub use attempts::*;
pub use extract::*;
pub use parse::*;
pub use policy::*;
pub use report::*;
pub use session::*;
pub use shared::*;
