// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Suspend/resume payload.
//
// The saved layout is a JSON object with optional keys `uri`, `result`, and
// `phase`. An absent key means "not yet set". In-flight phases are written as
// idle: nothing that was waiting on the camera survives suspension.

use std::path::Path;

use scanwerk_core::error::Result;
use scanwerk_core::types::{ImageReference, Phase, SessionState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Persisted form of a [`SessionState`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

/// Snapshot `state` for persistence.
pub fn suspend(state: &SessionState) -> SavedSession {
    let phase = state.phase.display_equivalent();
    SavedSession {
        uri: state
            .image_reference
            .as_ref()
            .filter(|reference| !reference.is_empty())
            .map(|reference| reference.as_str().to_owned()),
        result: (!state.result_text.is_empty()).then(|| state.result_text.clone()),
        phase: (phase != Phase::Idle).then_some(phase),
    }
}

/// Restore a state from a snapshot. Never schedules any work.
pub fn resume(saved: SavedSession) -> SessionState {
    SessionState {
        image_reference: saved
            .uri
            .filter(|uri| !uri.is_empty())
            .map(ImageReference::new),
        result_text: saved.result.unwrap_or_default(),
        phase: saved.phase.map(Phase::display_equivalent).unwrap_or(Phase::Idle),
        pending_request: None,
    }
}

pub fn to_json(saved: &SavedSession) -> Result<String> {
    Ok(serde_json::to_string_pretty(saved)?)
}

pub fn from_json(json: &str) -> Result<SavedSession> {
    Ok(serde_json::from_str(json)?)
}

/// Write a snapshot to `path`.
pub fn save(path: &Path, saved: &SavedSession) -> Result<()> {
    std::fs::write(path, to_json(saved)?)?;
    info!(path = %path.display(), "session suspended");
    Ok(())
}

/// Read a snapshot from `path`. A missing file is an empty session.
pub fn load(path: &Path) -> Result<SavedSession> {
    match std::fs::read_to_string(path) {
        Ok(json) => from_json(&json),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no saved session");
            Ok(SavedSession::default())
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove a snapshot. Removing one that does not exist is not an error.
pub fn clear(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanwerk_core::types::{FailureKind, RequestId};

    fn state(phase: Phase) -> SessionState {
        SessionState {
            image_reference: Some(ImageReference::new("file:///data/picture.jpg")),
            result_text: " http://example.com".into(),
            phase,
            pending_request: None,
        }
    }

    #[test]
    fn round_trip_preserves_reference_and_text() {
        let original = state(Phase::ResultsReady);
        let restored = resume(from_json(&to_json(&suspend(&original)).unwrap()).unwrap());
        assert_eq!(restored, original);
    }

    #[test]
    fn in_flight_phase_suspends_as_idle() {
        let mut capturing = state(Phase::Capturing);
        capturing.pending_request = Some(RequestId::new());

        let saved = suspend(&capturing);
        assert_eq!(saved.phase, None);

        let restored = resume(saved);
        assert_eq!(restored.phase, Phase::Idle);
        assert_eq!(restored.pending_request, None);
        assert_eq!(restored.image_reference, capturing.image_reference);
        assert_eq!(restored.result_text, capturing.result_text);
    }

    #[test]
    fn error_phase_survives() {
        let saved = suspend(&state(Phase::Error(FailureKind::DecodeFailed)));
        assert_eq!(resume(saved).phase, Phase::Error(FailureKind::DecodeFailed));
    }

    #[test]
    fn unset_fields_are_absent_keys() {
        let json = to_json(&suspend(&SessionState::default())).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[test]
    fn reads_minimal_layout() {
        let saved = from_json(r#"{"uri": "file:///x.jpg", "result": "Could not set up the detector!"}"#)
            .unwrap();
        let restored = resume(saved);
        assert_eq!(restored.image_reference, Some(ImageReference::new("file:///x.jpg")));
        assert_eq!(restored.result_text, "Could not set up the detector!");
        assert_eq!(restored.phase, Phase::Idle);
    }

    #[test]
    fn in_flight_phase_in_file_is_demoted() {
        let saved = from_json(r#"{"phase": "decoding"}"#).unwrap();
        assert_eq!(resume(saved).phase, Phase::Idle);
    }

    #[test]
    fn file_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        assert_eq!(load(&path).unwrap(), SavedSession::default());

        let saved = suspend(&state(Phase::ClassificationEmpty));
        save(&path, &saved).unwrap();
        assert_eq!(load(&path).unwrap(), saved);

        clear(&path).unwrap();
        clear(&path).unwrap();
        assert_eq!(load(&path).unwrap(), SavedSession::default());
    }
}
