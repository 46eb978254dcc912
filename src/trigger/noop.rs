//! Trigger port used when no hardware is attached.

use super::{TriggerError, TriggerPort};

/// Logs codes at debug level and discards them.
#[derive(Debug, Default)]
pub struct NoopTrigger {
    _private: (),
}

impl NoopTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerPort for NoopTrigger {
    fn write(&mut self, code: u8) -> Result<(), TriggerError> {
        tracing::debug!(code, "trigger (no device)");
        Ok(())
    }
}
