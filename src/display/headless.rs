//! Scripted, non-interactive display.
//!
//! This exists so whole sessions can run without a terminal: each call to
//! `wait_keys` consumes the next scripted response and advances a shared
//! [`ManualClock`] by the response's latency.

use super::{DisplayError, Key, Screen};
use crate::core::clock::ManualClock;
use std::collections::VecDeque;
use std::time::Duration;

/// A key press that arrives `after` the wait began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedResponse {
    pub key: Key,
    pub after: Duration,
}

impl ScriptedResponse {
    pub fn new(key: Key, after: Duration) -> Self {
        Self { key, after }
    }
}

/// A display that records frames and replays scripted key presses.
pub struct HeadlessScreen {
    clock: ManualClock,
    script: VecDeque<ScriptedResponse>,
    fallback: Option<ScriptedResponse>,
    frames: Vec<String>,
}

impl HeadlessScreen {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            script: VecDeque::new(),
            fallback: None,
            frames: Vec::new(),
        }
    }

    /// Queue responses to be replayed in order.
    pub fn with_responses(mut self, responses: impl IntoIterator<Item = ScriptedResponse>) -> Self {
        self.script.extend(responses);
        self
    }

    /// Response used whenever the script is empty.
    pub fn with_fallback(mut self, response: ScriptedResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Every frame shown so far, oldest first.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Next response, and whether it came from the fallback.
    fn next_response(&mut self) -> Option<(ScriptedResponse, bool)> {
        match self.script.pop_front() {
            Some(response) => Some((response, false)),
            None => self.fallback.map(|response| (response, true)),
        }
    }
}

impl Screen for HeadlessScreen {
    fn flip_text(&mut self, text: &str) -> Result<(), DisplayError> {
        self.frames.push(text.to_string());
        Ok(())
    }

    fn wait_keys(
        &mut self,
        keys: &[Key],
        timeout: Option<Duration>,
    ) -> Result<Option<Key>, DisplayError> {
        let mut waited = Duration::ZERO;

        loop {
            let (response, from_fallback) =
                self.next_response().ok_or(DisplayError::ScriptExhausted)?;

            if let Some(limit) = timeout {
                if waited + response.after > limit {
                    self.clock.advance(limit - waited);
                    return Ok(None);
                }
            }

            self.clock.advance(response.after);
            waited += response.after;

            // Presses of other keys are ignored, like a real keyboard wait.
            if keys.contains(&response.key) {
                return Ok(Some(response.key));
            }
            if from_fallback {
                return Err(DisplayError::ScriptExhausted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::Clock;

    const YES: Key = Key::Char('y');
    const NO: Key = Key::Char('n');

    #[test]
    fn test_replays_script_and_advances_clock() {
        let clock = ManualClock::new();
        let mut screen = HeadlessScreen::new(clock.clone()).with_responses([
            ScriptedResponse::new(YES, Duration::from_millis(420)),
            ScriptedResponse::new(NO, Duration::from_millis(380)),
        ]);

        assert_eq!(screen.wait_keys(&[YES, NO], None).unwrap(), Some(YES));
        assert_eq!(clock.now(), Duration::from_millis(420));
        assert_eq!(screen.wait_keys(&[YES, NO], None).unwrap(), Some(NO));
        assert_eq!(clock.now(), Duration::from_millis(800));
        assert!(matches!(
            screen.wait_keys(&[YES, NO], None),
            Err(DisplayError::ScriptExhausted)
        ));
    }

    #[test]
    fn test_ignores_keys_not_listed() {
        let clock = ManualClock::new();
        let mut screen = HeadlessScreen::new(clock.clone()).with_responses([
            ScriptedResponse::new(Key::Char('x'), Duration::from_millis(100)),
            ScriptedResponse::new(YES, Duration::from_millis(200)),
        ]);

        assert_eq!(screen.wait_keys(&[YES], None).unwrap(), Some(YES));
        assert_eq!(clock.now(), Duration::from_millis(300));
    }

    #[test]
    fn test_timeout_returns_none() {
        let clock = ManualClock::new();
        let mut screen = HeadlessScreen::new(clock.clone())
            .with_responses([ScriptedResponse::new(YES, Duration::from_secs(5))]);

        let key = screen
            .wait_keys(&[YES], Some(Duration::from_secs(2)))
            .unwrap();
        assert_eq!(key, None);
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_fallback_repeats() {
        let clock = ManualClock::new();
        let mut screen = HeadlessScreen::new(clock)
            .with_fallback(ScriptedResponse::new(NO, Duration::from_millis(10)));

        for _ in 0..3 {
            assert_eq!(screen.wait_keys(&[NO], None).unwrap(), Some(NO));
        }
    }

    #[test]
    fn test_frames_are_recorded() {
        let mut screen = HeadlessScreen::new(ManualClock::new());
        screen.flip_text("+").unwrap();
        screen.flip_text("Living?").unwrap();
        assert_eq!(screen.frames(), ["+", "Living?"]);
    }
}
