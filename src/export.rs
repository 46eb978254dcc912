//! Result files.
//!
//! Each participant gets `data_p{ID}.csv` in the save folder, with one row per
//! recorded trial, plus a JSON manifest for the session. Existing files are
//! never overwritten: a timestamp suffix is added, then a counter if needed.

use crate::core::{ManifestBuilder, SessionManifest, SessionOutcome, SessionSummary, TrialResult};
use crate::ledger::SessionLedger;
use crate::participant::Participant;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Paths written for a saved session.
#[derive(Debug, Clone)]
pub struct SavedSession {
    /// Result table; `None` when no trial was recorded
    pub data_file: Option<PathBuf>,
    pub manifest_file: PathBuf,
}

/// Path for a participant's result table that does not clobber an existing file.
pub fn data_file_path(folder: &Path, participant_id: &str, at: DateTime<Utc>) -> PathBuf {
    let path = folder.join(format!("data_p{participant_id}.csv"));
    if !path.exists() {
        return path;
    }
    free_path(
        folder,
        &format!("data_p{participant_id}_{}", at.format("%Y%m%d_%H%M%S")),
        "csv",
    )
}

/// Path for a session manifest that does not clobber an existing file.
pub fn manifest_file_path(folder: &Path, participant_id: &str, at: DateTime<Utc>) -> PathBuf {
    free_path(
        folder,
        &format!("session_p{participant_id}_{}", at.format("%Y%m%d_%H%M%S")),
        "json",
    )
}

/// `{stem}.{ext}`, or the first free `{stem}_{n}.{ext}` counting from 2.
fn free_path(folder: &Path, stem: &str, ext: &str) -> PathBuf {
    let path = folder.join(format!("{stem}.{ext}"));
    if !path.exists() {
        return path;
    }
    (2u32..)
        .map(|n| folder.join(format!("{stem}_{n}.{ext}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(path)
}

/// Write trial results as CSV with a header row.
pub fn write_results(path: &Path, results: &[TrialResult]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| ExportError::IoError(format!("{}: {e}", path.display())))?;
    for result in results {
        writer
            .serialize(result)
            .map_err(|e| ExportError::SerializeError(e.to_string()))?;
    }
    writer
        .flush()
        .map_err(|e| ExportError::IoError(e.to_string()))?;
    Ok(())
}

/// Read a result table written by [`write_results`].
pub fn read_results(path: &Path) -> Result<Vec<TrialResult>, ExportError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| ExportError::IoError(format!("{}: {e}", path.display())))?;
    reader
        .deserialize()
        .collect::<Result<Vec<TrialResult>, _>>()
        .map_err(|e| ExportError::ParseError(e.to_string()))
}

pub fn write_manifest(path: &Path, manifest: &SessionManifest) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| ExportError::SerializeError(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| ExportError::IoError(e.to_string()))
}

/// Write the result table (if any trial was recorded) and the session manifest.
pub fn save_session(
    folder: &Path,
    participant: &Participant,
    outcome: &SessionOutcome,
    summary: &SessionSummary,
    manifests: &ManifestBuilder,
) -> Result<SavedSession, ExportError> {
    std::fs::create_dir_all(folder).map_err(|e| ExportError::IoError(e.to_string()))?;

    let data_file = if outcome.results.is_empty() {
        None
    } else {
        let path = data_file_path(folder, &participant.id, outcome.ended_at);
        write_results(&path, &outcome.results)?;
        tracing::info!(path = %path.display(), rows = outcome.results.len(), "results saved");
        Some(path)
    };

    let data_name = data_file
        .as_ref()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned());
    let manifest = manifests.build(participant, outcome, summary, data_name);

    let manifest_file = manifest_file_path(folder, &participant.id, outcome.ended_at);
    write_manifest(&manifest_file, &manifest)?;

    Ok(SavedSession {
        data_file,
        manifest_file,
    })
}

/// Save the session, then count it in `ledger`. Nothing is counted if saving fails.
pub fn save_and_record(
    folder: &Path,
    participant: &Participant,
    outcome: &SessionOutcome,
    summary: &SessionSummary,
    manifests: &ManifestBuilder,
    ledger: &mut SessionLedger,
) -> Result<SavedSession, ExportError> {
    let saved = save_session(folder, participant, outcome, summary, manifests)?;
    ledger.record_session(outcome);
    Ok(saved)
}

/// Export errors.
#[derive(Debug)]
pub enum ExportError {
    IoError(String),
    SerializeError(String),
    ParseError(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::IoError(e) => write!(f, "IO error: {e}"),
            ExportError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ExportError::ParseError(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}
