//! Stimulus presentation and response capture.
//!
//! A [`Screen`] shows one full-screen text frame at a time and blocks for key
//! presses. The terminal back-end drives a real session; the headless back-end
//! replays scripted responses against a manual clock.

pub mod headless;
pub mod terminal;
pub mod types;

use std::time::Duration;

pub use headless::{HeadlessScreen, ScriptedResponse};
pub use terminal::TerminalScreen;
pub use types::Key;

/// A surface that presents text stimuli and reports key presses.
pub trait Screen {
    /// Replace the visible frame with `text`, centered. Returns once the frame is visible.
    fn flip_text(&mut self, text: &str) -> Result<(), DisplayError>;

    /// Block until one of `keys` is pressed.
    ///
    /// Keys pressed before the call are discarded. Returns `None` when `timeout`
    /// elapses first.
    fn wait_keys(
        &mut self,
        keys: &[Key],
        timeout: Option<Duration>,
    ) -> Result<Option<Key>, DisplayError>;
}

/// Errors raised by a display back-end.
#[derive(Debug)]
pub enum DisplayError {
    IoError(String),
    /// The headless script ran out of responses.
    ScriptExhausted,
}

impl std::fmt::Display for DisplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayError::IoError(e) => write!(f, "Display IO error: {e}"),
            DisplayError::ScriptExhausted => write!(f, "No scripted responses left"),
        }
    }
}

impl std::error::Error for DisplayError {}

impl From<std::io::Error> for DisplayError {
    fn from(e: std::io::Error) -> Self {
        DisplayError::IoError(e.to_string())
    }
}
