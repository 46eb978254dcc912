//! Trial records.

use crate::display::Key;
use crate::participant::{Gender, Participant};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One completed trial, as written to the result table.
///
/// Field names follow the column headers of the per-participant CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    #[serde(rename = "ID")]
    pub participant_id: String,
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Condition_ID")]
    pub condition: i64,
    #[serde(rename = "Condition_Prompt")]
    pub prompt: String,
    #[serde(rename = "Word")]
    pub word: String,
    #[serde(rename = "Response")]
    pub response: Key,
    /// Seconds from word onset to key press
    #[serde(rename = "Reaction_time")]
    pub reaction_time: f64,
}

impl TrialResult {
    pub fn new(
        participant: &Participant,
        condition: i64,
        prompt: &str,
        word: &str,
        response: Key,
        reaction_time: Duration,
    ) -> Self {
        Self {
            participant_id: participant.id.clone(),
            age: participant.age,
            gender: participant.gender,
            condition,
            prompt: prompt.to_string(),
            word: word.to_string(),
            response,
            reaction_time: reaction_time.as_secs_f64(),
        }
    }
}

/// Why a trial produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Every word of the chosen condition was already shown
    NoWordsLeft,
    /// The response window closed without a key press
    NoResponse,
}

/// What a single pass through the trial loop produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TrialStep {
    Recorded(TrialResult),
    Skipped(SkipReason),
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_copies_participant_fields() {
        let participant = Participant::new("p09", 27, Gender::Other).unwrap();
        let result = TrialResult::new(
            &participant,
            2,
            "Living?",
            "horse",
            Key::Char('y'),
            Duration::from_millis(512),
        );
        assert_eq!(result.participant_id, "p09");
        assert_eq!(result.age, 27);
        assert_eq!(result.gender, Gender::Other);
        assert!((result.reaction_time - 0.512).abs() < 1e-9);
    }

    #[test]
    fn test_result_json_uses_column_names() {
        let participant = Participant::new("p09", 27, Gender::Female).unwrap();
        let result = TrialResult::new(&participant, 1, "Includes 'A'?", "apple", Key::Char('n'), Duration::ZERO);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ID"], "p09");
        assert_eq!(json["Gender"], "female");
        assert_eq!(json["Condition_ID"], 1);
        assert_eq!(json["Response"], "n");
    }
}
