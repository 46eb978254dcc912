//! Trigger output through a device file.
//!
//! Each code is written as a single byte. This covers USB/serial trigger boxes
//! (`/dev/ttyUSB0`), which latch the byte they receive, and legacy parallel
//! ports through `/dev/port`, where the byte must land at the port's I/O
//! address (e.g. offset 0x378).

use super::{TriggerError, TriggerPort};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub struct DeviceTrigger {
    path: PathBuf,
    file: File,
    offset: Option<u64>,
}

impl DeviceTrigger {
    /// Open `path` for writing. The device must already exist.
    pub fn open(path: &Path, offset: Option<u64>) -> Result<Self, TriggerError> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| TriggerError::OpenFailed(format!("{}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), ?offset, "trigger device opened");

        Ok(Self {
            path: path.to_path_buf(),
            file,
            offset,
        })
    }
}

impl TriggerPort for DeviceTrigger {
    fn write(&mut self, code: u8) -> Result<(), TriggerError> {
        let fail = |e: std::io::Error| {
            TriggerError::WriteFailed(format!("{}: {e}", self.path.display()))
        };

        if let Some(offset) = self.offset {
            self.file.seek(SeekFrom::Start(offset)).map_err(fail)?;
        }
        self.file.write_all(&[code]).map_err(fail)?;
        self.file.flush().map_err(fail)?;

        tracing::debug!(code, "trigger");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wordcue-trigger-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn test_writes_one_byte_per_code() {
        let path = scratch_file("serial");
        let mut port = DeviceTrigger::open(&path, None).unwrap();
        for code in [2, 0, 20, 0, 255] {
            port.write(code).unwrap();
        }
        drop(port);

        assert_eq!(std::fs::read(&path).unwrap(), vec![2, 0, 20, 0, 255]);
    }

    #[test]
    fn test_offset_overwrites_same_address() {
        let path = scratch_file("port");
        let mut port = DeviceTrigger::open(&path, Some(4)).unwrap();
        port.write(30).unwrap();
        port.write(0).unwrap();
        port.write(3).unwrap();
        drop(port);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes[4], 3);
    }

    #[test]
    fn test_open_missing_device() {
        let path = std::env::temp_dir().join("wordcue-missing-dir").join("nope");
        assert!(matches!(
            DeviceTrigger::open(&path, None),
            Err(TriggerError::OpenFailed(_))
        ));
    }
}
