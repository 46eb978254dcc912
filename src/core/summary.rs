//! Reaction-time summary for a finished session.

use crate::core::trial::TrialResult;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};
use std::collections::BTreeMap;
use std::fmt;

/// Statistics for the trials of one condition. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    pub condition: i64,
    pub prompt: String,
    pub trials: usize,
    pub mean_rt: f64,
    pub median_rt: f64,
    /// Sample standard deviation; needs at least two trials
    pub sd_rt: Option<f64>,
    /// Number of trials per response key
    pub responses: BTreeMap<String, usize>,
}

/// Per-condition statistics for a whole session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_trials: usize,
    pub conditions: Vec<ConditionSummary>,
}

/// Group results by condition, in ascending condition order.
pub fn summarize(results: &[TrialResult]) -> SessionSummary {
    let mut groups: BTreeMap<i64, Vec<&TrialResult>> = BTreeMap::new();
    for result in results {
        groups.entry(result.condition).or_default().push(result);
    }

    let conditions = groups
        .into_iter()
        .map(|(condition, trials)| summarize_condition(condition, &trials))
        .collect();

    SessionSummary {
        total_trials: results.len(),
        conditions,
    }
}

fn summarize_condition(condition: i64, trials: &[&TrialResult]) -> ConditionSummary {
    let rts: Vec<f64> = trials.iter().map(|t| t.reaction_time).collect();

    let mut responses = BTreeMap::new();
    for trial in trials {
        *responses.entry(trial.response.name()).or_insert(0) += 1;
    }

    let sd_rt = if rts.len() >= 2 {
        Some(rts.iter().std_dev())
    } else {
        None
    };

    ConditionSummary {
        condition,
        prompt: trials
            .first()
            .map(|t| t.prompt.clone())
            .unwrap_or_default(),
        trials: trials.len(),
        mean_rt: rts.iter().mean(),
        median_rt: Data::new(rts.clone()).median(),
        sd_rt,
        responses,
    }
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total_trials == 0 {
            return write!(f, "No data collected.");
        }

        writeln!(
            f,
            "Experiment Complete. {} trials recorded.",
            self.total_trials
        )?;
        for c in &self.conditions {
            let responses: Vec<String> = c
                .responses
                .iter()
                .map(|(key, n)| format!("{key}={n}"))
                .collect();
            write!(
                f,
                "\n  [{}] {}: {} trials, mean RT {:.3}s, median {:.3}s",
                c.condition, c.prompt, c.trials, c.mean_rt, c.median_rt
            )?;
            if let Some(sd) = c.sd_rt {
                write!(f, ", sd {sd:.3}s")?;
            }
            write!(f, " ({})", responses.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Key;
    use crate::participant::{Gender, Participant};
    use std::time::Duration;

    fn trial(condition: i64, key: char, rt_ms: u64) -> TrialResult {
        let participant = Participant::new("p01", 30, Gender::Male).unwrap();
        let prompt = if condition == 1 { "Includes 'A'?" } else { "Living?" };
        TrialResult::new(
            &participant,
            condition,
            prompt,
            "word",
            Key::Char(key),
            Duration::from_millis(rt_ms),
        )
    }

    #[test]
    fn test_summary_groups_by_condition() {
        let results = vec![
            trial(2, 'y', 600),
            trial(1, 'y', 400),
            trial(1, 'n', 800),
            trial(1, 'y', 600),
        ];
        let summary = summarize(&results);

        assert_eq!(summary.total_trials, 4);
        assert_eq!(summary.conditions.len(), 2);

        let first = &summary.conditions[0];
        assert_eq!(first.condition, 1);
        assert_eq!(first.trials, 3);
        assert!((first.mean_rt - 0.6).abs() < 1e-9);
        assert!((first.median_rt - 0.6).abs() < 1e-9);
        assert!((first.sd_rt.unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(first.responses["y"], 2);
        assert_eq!(first.responses["n"], 1);

        let second = &summary.conditions[1];
        assert_eq!(second.prompt, "Living?");
        assert_eq!(second.sd_rt, None);
    }

    #[test]
    fn test_empty_summary_display() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_trials, 0);
        assert_eq!(summary.to_string(), "No data collected.");
    }

    #[test]
    fn test_summary_display() {
        let summary = summarize(&[trial(1, 'y', 500), trial(1, 'n', 700)]);
        let text = summary.to_string();
        assert!(text.starts_with("Experiment Complete. 2 trials recorded."));
        assert!(text.contains("mean RT 0.600s"));
        assert!(text.contains("n=1, y=1"));
    }
}
