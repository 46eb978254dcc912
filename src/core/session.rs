//! The trial loop.
//!
//! Each pass shows a condition prompt, a word drawn for that condition, waits
//! for a response, shows the fixation cross and records the trial:
//!
//! ```text
//! SHOW_LABEL ─▶ SHOW_WORD ─▶ AWAIT_RESPONSE ─▶ SHOW_FIXATION ─▶ RECORD
//!      ▲            │ no words      │ timeout / escape                │
//!      └────────────┴───────────────┴─────────────────────────────────┘
//! ```
//!
//! The loop runs until the session countdown expires (checked before each
//! trial) or the participant presses the abort key. Every flip that shows a
//! stimulus puts a trigger code on the line and resets it to zero.

use crate::config::Config;
use crate::core::clock::{Clock, Countdown, Stopwatch};
use crate::core::trial::{SkipReason, TrialResult, TrialStep};
use crate::core::words::{WordList, WordSelector};
use crate::display::{DisplayError, Screen};
use crate::participant::Participant;
use crate::trigger::{TriggerError, TriggerPort, RESET_CODE};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Text of the fixation frame.
pub const FIXATION_TEXT: &str = "+";

/// How a session's trial loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    TimerExpired,
    Aborted,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::TimerExpired => write!(f, "timer expired"),
            EndReason::Aborted => write!(f, "quit by user"),
        }
    }
}

/// Result of the consent and instruction screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntroOutcome {
    Completed,
    Aborted,
}

/// Everything a finished trial loop produced.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub results: Vec<TrialResult>,
    pub end_reason: EndReason,
    pub skipped_no_words: u32,
    pub skipped_no_response: u32,
    /// Onset codes written (line resets are not counted)
    pub triggers_sent: u64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl SessionOutcome {
    pub fn skipped_trials(&self) -> u32 {
        self.skipped_no_words + self.skipped_no_response
    }
}

/// A running experiment session for one participant.
pub struct Session<'a> {
    config: &'a Config,
    participant: &'a Participant,
    screen: &'a mut dyn Screen,
    trigger: &'a mut dyn TriggerPort,
    clock: &'a dyn Clock,
    rng: &'a mut dyn RngCore,
    triggers_sent: u64,
}

impl<'a> Session<'a> {
    pub fn new(
        config: &'a Config,
        participant: &'a Participant,
        screen: &'a mut dyn Screen,
        trigger: &'a mut dyn TriggerPort,
        clock: &'a dyn Clock,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            config,
            participant,
            screen,
            trigger,
            clock,
            rng,
            triggers_sent: 0,
        }
    }

    /// Show the consent and instruction screens, then the pre-trial fixation.
    ///
    /// Each screen waits for the advance key; the abort key leaves early.
    pub fn run_intro(&mut self) -> Result<IntroOutcome, SessionError> {
        let config = self.config;
        let keys = [config.advance_key, config.abort_key];

        for paragraphs in [&config.consent_text, &config.instruction_text] {
            self.screen.flip_text(&paragraphs.join("\n\n"))?;
            if self.screen.wait_keys(&keys, None)? == Some(config.abort_key) {
                info!("experiment quit during intro");
                return Ok(IntroOutcome::Aborted);
            }
        }

        self.screen.flip_text(FIXATION_TEXT)?;
        self.clock.sleep(config.countdown_duration);
        self.reset_line()?;

        Ok(IntroOutcome::Completed)
    }

    /// Run trials until the countdown expires or the participant aborts.
    pub fn run(&mut self, words: &WordList) -> Result<SessionOutcome, SessionError> {
        if self.config.conditions.is_empty() {
            return Err(SessionError::NoConditions);
        }

        let started_at = Utc::now();
        let start = self.clock.now();
        let timer = Countdown::start(self.clock, self.config.session_duration);
        let mut selector = WordSelector::new(words);

        let mut results = Vec::new();
        let mut skipped_no_words = 0;
        let mut skipped_no_response = 0;
        let mut end_reason = EndReason::TimerExpired;

        info!(
            participant = %self.participant.id,
            duration_secs = self.config.session_duration.as_secs(),
            words = words.len(),
            "session started"
        );

        while !timer.expired(self.clock) {
            match self.run_trial(&mut selector)? {
                TrialStep::Recorded(result) => {
                    debug!(
                        trial = results.len() + 1,
                        word = %result.word,
                        response = %result.response,
                        rt = result.reaction_time,
                        "trial recorded"
                    );
                    results.push(result);
                }
                TrialStep::Skipped(SkipReason::NoWordsLeft) => skipped_no_words += 1,
                TrialStep::Skipped(SkipReason::NoResponse) => skipped_no_response += 1,
                TrialStep::Aborted => {
                    end_reason = EndReason::Aborted;
                    break;
                }
            }
        }

        let outcome = SessionOutcome {
            results,
            end_reason,
            skipped_no_words,
            skipped_no_response,
            triggers_sent: self.triggers_sent,
            started_at,
            ended_at: Utc::now(),
            elapsed: self.clock.now().saturating_sub(start),
        };

        info!(
            reason = %outcome.end_reason,
            recorded = outcome.results.len(),
            skipped = outcome.skipped_trials(),
            "session ended"
        );

        Ok(outcome)
    }

    fn run_trial(&mut self, selector: &mut WordSelector<'_>) -> Result<TrialStep, SessionError> {
        let config = self.config;
        let condition = config
            .conditions
            .choose(&mut *self.rng)
            .ok_or(SessionError::NoConditions)?;

        self.flip_with_trigger(&condition.prompt, condition.label_trigger)?;
        self.clock.sleep(config.label_duration);

        let Some(entry) = selector.pick(condition.id, &mut *self.rng) else {
            warn!(condition = condition.id, "no unused words left for condition");
            return Ok(TrialStep::Skipped(SkipReason::NoWordsLeft));
        };

        let mut stopwatch = Stopwatch::default();
        self.screen.flip_text(&entry.word)?;
        self.pulse(condition.word_trigger)?;
        stopwatch.reset(self.clock);
        self.reset_line()?;

        let key = self
            .screen
            .wait_keys(&config.response_keys(), config.response_timeout)?;
        let reaction_time = stopwatch.elapsed(self.clock);

        let Some(key) = key else {
            warn!(word = %entry.word, "no response before timeout");
            return Ok(TrialStep::Skipped(SkipReason::NoResponse));
        };

        if key == config.abort_key {
            info!("experiment quit by user");
            return Ok(TrialStep::Aborted);
        }

        if let Some(code) = config.response_trigger(key) {
            self.pulse(code)?;
            self.clock.sleep(config.response_pulse);
            self.reset_line()?;
        }

        self.flip_with_trigger(FIXATION_TEXT, config.fixation_trigger)?;
        self.clock.sleep(config.fixation_duration);

        Ok(TrialStep::Recorded(TrialResult::new(
            self.participant,
            condition.id,
            &condition.prompt,
            &entry.word,
            key,
            reaction_time,
        )))
    }

    /// Show `text` and mark its onset with `code`.
    fn flip_with_trigger(&mut self, text: &str, code: u8) -> Result<(), SessionError> {
        self.screen.flip_text(text)?;
        self.pulse(code)?;
        self.reset_line()
    }

    fn pulse(&mut self, code: u8) -> Result<(), SessionError> {
        self.trigger.write(code)?;
        self.triggers_sent += 1;
        Ok(())
    }

    fn reset_line(&mut self) -> Result<(), SessionError> {
        self.trigger.write(RESET_CODE)?;
        Ok(())
    }
}

/// Errors that stop a session.
#[derive(Debug)]
pub enum SessionError {
    Display(DisplayError),
    Trigger(TriggerError),
    NoConditions,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Display(e) => write!(f, "{e}"),
            SessionError::Trigger(e) => write!(f, "{e}"),
            SessionError::NoConditions => write!(f, "No conditions configured"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Display(e) => Some(e),
            SessionError::Trigger(e) => Some(e),
            SessionError::NoConditions => None,
        }
    }
}

impl From<DisplayError> for SessionError {
    fn from(e: DisplayError) -> Self {
        SessionError::Display(e)
    }
}

impl From<TriggerError> for SessionError {
    fn from(e: TriggerError) -> Self {
        SessionError::Trigger(e)
    }
}
