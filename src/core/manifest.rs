//! Session manifest written next to each result table.
//!
//! The manifest identifies the session (UUID, producer, host) and records how
//! it ended, so a CSV file can be matched to an EEG recording afterwards.

use crate::core::session::{EndReason, SessionOutcome};
use crate::core::summary::SessionSummary;
use crate::participant::Participant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The name of this producer.
pub const PRODUCER_NAME: &str = "wordcue";

/// Software that produced the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

/// Machine-readable record of one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionManifest {
    pub session_id: String,
    pub producer: Producer,
    pub host: String,
    pub participant: Participant,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub end_reason: EndReason,
    pub trials_recorded: usize,
    pub trials_skipped: u32,
    pub skipped_no_words: u32,
    pub skipped_no_response: u32,
    pub triggers_sent: u64,
    /// File name of the result table, if one was written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
    pub summary: SessionSummary,
}

/// Builds manifests for sessions run by this process.
pub struct ManifestBuilder {
    session_id: Uuid,
    host: String,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "unknown".to_string());

        Self {
            session_id: Uuid::new_v4(),
            host,
        }
    }

    pub fn session_id(&self) -> String {
        self.session_id.to_string()
    }

    pub fn build(
        &self,
        participant: &Participant,
        outcome: &SessionOutcome,
        summary: &SessionSummary,
        data_file: Option<String>,
    ) -> SessionManifest {
        SessionManifest {
            session_id: self.session_id(),
            producer: Producer {
                name: PRODUCER_NAME.to_string(),
                version: crate::VERSION.to_string(),
            },
            host: self.host.clone(),
            participant: participant.clone(),
            started_at: outcome.started_at,
            ended_at: outcome.ended_at,
            duration_secs: outcome.elapsed.as_secs_f64(),
            end_reason: outcome.end_reason,
            trials_recorded: outcome.results.len(),
            trials_skipped: outcome.skipped_trials(),
            skipped_no_words: outcome.skipped_no_words,
            skipped_no_response: outcome.skipped_no_response,
            triggers_sent: outcome.triggers_sent,
            data_file,
            summary: summary.clone(),
        }
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::summary::summarize;
    use crate::participant::Gender;
    use std::time::Duration;

    fn outcome() -> SessionOutcome {
        SessionOutcome {
            results: Vec::new(),
            end_reason: EndReason::Aborted,
            skipped_no_words: 2,
            skipped_no_response: 1,
            triggers_sent: 12,
            started_at: Utc::now(),
            ended_at: Utc::now(),
            elapsed: Duration::from_secs(42),
        }
    }

    #[test]
    fn test_manifest_fields() {
        let builder = ManifestBuilder::new();
        let participant = Participant::new("p05", 22, Gender::Female).unwrap();
        let outcome = outcome();
        let manifest = builder.build(&participant, &outcome, &summarize(&outcome.results), None);

        assert_eq!(manifest.session_id, builder.session_id());
        assert_eq!(manifest.producer.name, PRODUCER_NAME);
        assert_eq!(manifest.trials_skipped, 3);
        assert_eq!(manifest.triggers_sent, 12);
        assert!((manifest.duration_secs - 42.0).abs() < 1e-9);
    }

    #[test]
    fn test_manifest_json() {
        let participant = Participant::new("p05", 22, Gender::Male).unwrap();
        let outcome = outcome();
        let manifest = ManifestBuilder::new().build(
            &participant,
            &outcome,
            &summarize(&[]),
            Some("data_pp05.csv".into()),
        );
        let json = serde_json::to_value(&manifest).unwrap();

        assert_eq!(json["end_reason"], "aborted");
        assert_eq!(json["participant"]["gender"], "male");
        assert_eq!(json["data_file"], "data_pp05.csv");
        assert!(Uuid::parse_str(json["session_id"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(
            ManifestBuilder::new().session_id(),
            ManifestBuilder::new().session_id()
        );
    }
}
