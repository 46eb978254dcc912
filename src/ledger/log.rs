//! Cumulative session ledger.
//!
//! Counts what this installation has run across sessions (sessions, trials,
//! triggers) and persists the counters as JSON in the data directory.

use crate::core::{EndReason, SessionOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Running counters for completed sessions.
#[derive(Debug, Clone)]
pub struct SessionLedger {
    /// Number of sessions whose trial loop ran
    sessions_run: u64,
    /// Number of sessions ended with the abort key
    sessions_aborted: u64,
    /// Number of trials written to result tables
    trials_recorded: u64,
    /// Number of trials that produced no record
    trials_skipped: u64,
    /// Number of onset triggers written
    triggers_sent: u64,
    /// When this ledger was opened
    opened_at: DateTime<Utc>,
    /// Path for persisting counters
    persist_path: Option<PathBuf>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self {
            sessions_run: 0,
            sessions_aborted: 0,
            trials_recorded: 0,
            trials_skipped: 0,
            triggers_sent: 0,
            opened_at: Utc::now(),
            persist_path: None,
        }
    }

    /// Open a ledger backed by `path`, loading existing counters if present.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut ledger = Self::new();
        ledger.persist_path = Some(path);

        if let Err(e) = ledger.load() {
            tracing::warn!("could not load previous session ledger: {e}");
        }

        ledger
    }

    /// Add a finished session to the counters.
    pub fn record_session(&mut self, outcome: &SessionOutcome) {
        self.sessions_run += 1;
        if outcome.end_reason == EndReason::Aborted {
            self.sessions_aborted += 1;
        }
        self.trials_recorded += outcome.results.len() as u64;
        self.trials_skipped += u64::from(outcome.skipped_trials());
        self.triggers_sent += outcome.triggers_sent;
    }

    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            sessions_run: self.sessions_run,
            sessions_aborted: self.sessions_aborted,
            trials_recorded: self.trials_recorded,
            trials_skipped: self.trials_skipped,
            triggers_sent: self.triggers_sent,
            opened_at: self.opened_at,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Ledger:\n\
             - Sessions run: {}\n\
             - Sessions quit early: {}\n\
             - Trials recorded: {}\n\
             - Trials skipped: {}\n\
             - Triggers sent: {}",
            stats.sessions_run,
            stats.sessions_aborted,
            stats.trials_recorded,
            stats.trials_skipped,
            stats.triggers_sent
        )
    }

    /// Save counters to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedLedger {
                sessions_run: stats.sessions_run,
                sessions_aborted: stats.sessions_aborted,
                trials_recorded: stats.trials_recorded,
                trials_skipped: stats.trials_skipped,
                triggers_sent: stats.triggers_sent,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedLedger =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.sessions_run = persisted.sessions_run;
                self.sessions_aborted = persisted.sessions_aborted;
                self.trials_recorded = persisted.trials_recorded;
                self.trials_skipped = persisted.trials_skipped;
                self.triggers_sent = persisted.triggers_sent;
            }
        }
        Ok(())
    }
}

impl Default for SessionLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of ledger counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerStats {
    pub sessions_run: u64,
    pub sessions_aborted: u64,
    pub trials_recorded: u64,
    pub trials_skipped: u64,
    pub triggers_sent: u64,
    pub opened_at: DateTime<Utc>,
}

/// On-disk format.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedLedger {
    pub sessions_run: u64,
    pub sessions_aborted: u64,
    pub trials_recorded: u64,
    pub trials_skipped: u64,
    pub triggers_sent: u64,
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn outcome(end_reason: EndReason, skipped: u32, triggers: u64) -> SessionOutcome {
        SessionOutcome {
            results: Vec::new(),
            end_reason,
            skipped_no_words: skipped,
            skipped_no_response: 0,
            triggers_sent: triggers,
            started_at: Utc::now(),
            ended_at: Utc::now(),
            elapsed: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_ledger_counting() {
        let mut ledger = SessionLedger::new();
        ledger.record_session(&outcome(EndReason::TimerExpired, 2, 40));
        ledger.record_session(&outcome(EndReason::Aborted, 1, 6));

        let stats = ledger.stats();
        assert_eq!(stats.sessions_run, 2);
        assert_eq!(stats.sessions_aborted, 1);
        assert_eq!(stats.trials_skipped, 3);
        assert_eq!(stats.triggers_sent, 46);
    }

    #[test]
    fn test_ledger_persists_across_opens() {
        let path = std::env::temp_dir()
            .join(format!("wordcue-ledger-{}", uuid::Uuid::new_v4()))
            .join("ledger.json");

        let mut ledger = SessionLedger::with_persistence(path.clone());
        ledger.record_session(&outcome(EndReason::TimerExpired, 0, 10));
        ledger.save().unwrap();

        let reopened = SessionLedger::with_persistence(path);
        assert_eq!(reopened.stats().sessions_run, 1);
        assert_eq!(reopened.stats().triggers_sent, 10);
    }

    #[test]
    fn test_summary_format() {
        let summary = SessionLedger::new().summary();
        assert!(summary.contains("Sessions run: 0"));
        assert!(summary.contains("Triggers sent"));
    }
}
