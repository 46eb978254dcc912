//! wordcue - word-judgement reaction-time experiments with EEG triggers.
//!
//! A session shows a condition prompt ("Includes 'A'?", "Living?"), then a
//! word drawn for that condition, waits for a yes/no key, shows a fixation
//! cross and records the response and reaction time. Every stimulus onset is
//! marked with a trigger code for the EEG amplifier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           wordcue                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │  Word list  │──▶│   Session   │──▶│   Export    │         │
//! │  │  (csv)      │   │ (trial loop)│   │ (csv+json)  │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │                      │    ▲    │                             │
//! │                      ▼    │    ▼                             │
//! │              ┌─────────────┐  ┌─────────────┐                │
//! │              │   Screen    │  │  Trigger    │                │
//! │              │ (terminal)  │  │   port      │                │
//! │              └─────────────┘  └─────────────┘                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use rand::SeedableRng;
//! use wordcue::{core, display, participant, trigger, Config};
//!
//! let config = Config::default();
//! let words = core::WordList::load(&config.word_list, b';').unwrap();
//! let person = participant::Participant::new("p01", 24, participant::Gender::Other).unwrap();
//!
//! let clock = core::SystemClock::new();
//! let mut screen = display::TerminalScreen::new(config.abort_key).unwrap();
//! let mut port = trigger::NoopTrigger::new();
//! let mut rng = rand::rngs::StdRng::from_entropy();
//!
//! let outcome = core::Session::new(&config, &person, &mut screen, &mut port, &clock, &mut rng)
//!     .run(&words)
//!     .unwrap();
//! println!("{}", core::summarize(&outcome.results));
//! ```

pub mod config;
pub mod core;
pub mod display;
pub mod export;
pub mod ledger;
pub mod participant;
pub mod trigger;

// Re-export key types at crate root for convenience
pub use config::{ConditionConfig, Config, ConfigError, ResponseConfig, TriggerConfig};
pub use core::{
    summarize, EndReason, Session, SessionError, SessionOutcome, SessionSummary, TrialResult,
    WordList,
};
pub use display::{Key, Screen};
pub use ledger::SessionLedger;
pub use participant::{Gender, Participant};
pub use trigger::{TriggerError, TriggerPort};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Human-readable table of the trigger codes a configuration emits.
pub fn trigger_code_table(config: &Config) -> String {
    let mut lines = vec![format!("{:>4}  fixation onset", config.fixation_trigger)];
    for c in &config.conditions {
        lines.push(format!(
            "{:>4}  condition {} prompt onset ({})",
            c.label_trigger, c.id, c.prompt
        ));
        lines.push(format!("{:>4}  condition {} word onset", c.word_trigger, c.id));
    }
    for r in &config.responses {
        lines.push(format!("{:>4}  response '{}'", r.trigger, r.key));
    }
    lines.push(format!("{:>4}  line reset", trigger::RESET_CODE));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_code_table_contents() {
        let table = trigger_code_table(&Config::default());
        assert!(table.contains(" 255  fixation onset"));
        assert!(table.contains("   2  condition 1 prompt onset (Includes 'A'?)"));
        assert!(table.contains("  30  condition 2 word onset"));
        assert!(table.contains("   1  response 'y'"));
    }
}
