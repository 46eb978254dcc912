//! In-memory trigger port that keeps every code written to it.

use super::{TriggerError, TriggerPort, RESET_CODE};

#[derive(Debug, Default)]
pub struct RecordingTrigger {
    codes: Vec<u8>,
}

impl RecordingTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All codes in write order, resets included.
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    /// Codes other than the reset code, in write order.
    pub fn onsets(&self) -> Vec<u8> {
        self.codes
            .iter()
            .copied()
            .filter(|&c| c != RESET_CODE)
            .collect()
    }

    /// The code currently on the line.
    pub fn level(&self) -> u8 {
        self.codes.last().copied().unwrap_or(RESET_CODE)
    }
}

impl TriggerPort for RecordingTrigger {
    fn write(&mut self, code: u8) -> Result<(), TriggerError> {
        self.codes.push(code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_codes_and_level() {
        let mut port = RecordingTrigger::new();
        assert_eq!(port.level(), RESET_CODE);

        port.write(2).unwrap();
        port.write(RESET_CODE).unwrap();
        port.write(255).unwrap();

        assert_eq!(port.codes(), [2, 0, 255]);
        assert_eq!(port.onsets(), vec![2, 255]);
        assert_eq!(port.level(), 255);
    }
}
