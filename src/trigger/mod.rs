//! Trigger output to EEG recording hardware.
//!
//! A trigger port holds a single 8-bit code on its output lines. The session
//! sets a code at each stimulus onset and resets the line to zero right after.

pub mod device;
pub mod noop;
pub mod recording;

use crate::config::TriggerConfig;

pub use device::DeviceTrigger;
pub use noop::NoopTrigger;
pub use recording::RecordingTrigger;

/// Code that clears the trigger line.
pub const RESET_CODE: u8 = 0;

/// Something that can put a code on the trigger line.
pub trait TriggerPort {
    fn write(&mut self, code: u8) -> Result<(), TriggerError>;
}

impl<T: TriggerPort + ?Sized> TriggerPort for Box<T> {
    fn write(&mut self, code: u8) -> Result<(), TriggerError> {
        (**self).write(code)
    }
}

/// Open the port described by the configuration.
///
/// Without a configured device, codes are only logged.
pub fn open_port(config: &TriggerConfig) -> Result<Box<dyn TriggerPort>, TriggerError> {
    match &config.device {
        Some(path) => Ok(Box::new(DeviceTrigger::open(path, config.offset)?)),
        None => Ok(Box::new(NoopTrigger::new())),
    }
}

/// Errors that can occur while writing triggers.
#[derive(Debug)]
pub enum TriggerError {
    OpenFailed(String),
    WriteFailed(String),
}

impl std::fmt::Display for TriggerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerError::OpenFailed(e) => write!(f, "Could not open trigger device: {e}"),
            TriggerError::WriteFailed(e) => write!(f, "Could not write trigger: {e}"),
        }
    }
}

impl std::error::Error for TriggerError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_port_without_device_is_noop() {
        let mut port = open_port(&TriggerConfig::default()).unwrap();
        assert!(port.write(255).is_ok());
        assert!(port.write(RESET_CODE).is_ok());
    }

    #[test]
    fn test_open_port_missing_device_fails() {
        let config = TriggerConfig {
            device: Some("/nonexistent/wordcue/parport".into()),
            offset: None,
        };
        assert!(matches!(open_port(&config), Err(TriggerError::OpenFailed(_))));
    }

    #[test]
    fn test_boxed_port_forwards() {
        let mut boxed: Box<RecordingTrigger> = Box::new(RecordingTrigger::new());
        boxed.write(20).unwrap();
        assert_eq!(boxed.codes(), [20]);
    }
}
