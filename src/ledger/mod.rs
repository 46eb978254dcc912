//! Cross-session bookkeeping for wordcue.

pub mod log;

// Re-export commonly used types
pub use log::{LedgerStats, SessionLedger};
