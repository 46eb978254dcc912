//! Core functionality for wordcue.
//!
//! This module contains:
//! - Time sources for waits and reaction times
//! - The stimulus word list and selection policy
//! - The trial loop and its records
//! - Reaction-time summaries and session manifests

pub mod clock;
pub mod manifest;
pub mod session;
pub mod summary;
pub mod trial;
pub mod words;

// Re-export commonly used types
pub use clock::{Clock, Countdown, ManualClock, Stopwatch, SystemClock};
pub use manifest::{ManifestBuilder, SessionManifest, PRODUCER_NAME};
pub use session::{EndReason, IntroOutcome, Session, SessionError, SessionOutcome, FIXATION_TEXT};
pub use summary::{summarize, ConditionSummary, SessionSummary};
pub use trial::{SkipReason, TrialResult, TrialStep};
pub use words::{WordEntry, WordList, WordListError, WordSelector};
