// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capture session state machine.
//
// `transition` is pure: it takes the current `SessionState` and one event and
// returns the next state plus the effects the driver must perform. It never
// touches the camera, the filesystem, or the detector. A rejected event
// leaves the state untouched.

use scanwerk_core::classify::{DETECTOR_UNAVAILABLE_TEXT, NOTHING_FOUND_TEXT, accumulate_results};
use scanwerk_core::config::ScannerConfig;
use scanwerk_core::error::{Result, ScanwerkError};
use scanwerk_core::human_errors::{Notice, notice_for};
use scanwerk_core::types::{
    CaptureCompletion, CaptureOutcome, CaptureRequest, FailureKind, ImageReference,
    PermissionOutcome, Phase, RequestId, SessionState,
};
use tracing::{debug, info, warn};

use crate::persist::{self, SavedSession};
use crate::pipeline::ScanOutcome;

/// Inputs to the state machine.
#[derive(Debug)]
pub enum Event {
    RequestCapture,
    PermissionResult(PermissionOutcome),
    LaunchCapture,
    CaptureReturned(CaptureCompletion),
    CancelCapture,
    BeginDecode,
    DecodeFinished(Result<ScanOutcome>),
    Reset,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RequestCapture => "request_capture",
            Self::PermissionResult(_) => "permission_result",
            Self::LaunchCapture => "launch_capture",
            Self::CaptureReturned(_) => "capture_returned",
            Self::CancelCapture => "cancel_capture",
            Self::BeginDecode => "begin_decode",
            Self::DecodeFinished(_) => "decode_finished",
            Self::Reset => "reset",
        }
    }
}

/// Work the driver performs on behalf of the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RequestPermission,
    LaunchCapture(CaptureRequest),
    Decode(ImageReference),
    Notify(Notice),
}

/// The next state and what to do about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SessionState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(state: SessionState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Fixed facts the machine consults but never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineContext {
    /// Where the camera collaborator is asked to write each photo.
    pub capture_target: ImageReference,
    pub detector_operational: bool,
    pub clear_results_on_new_cycle: bool,
}

/// Compute the transition for `event` in `state`.
pub fn transition(state: &SessionState, ctx: &MachineContext, event: Event) -> Result<Transition> {
    let phase = state.phase;
    match (phase, event) {
        (_, Event::RequestCapture) => {
            if phase.is_in_flight() {
                return Err(ScanwerkError::CycleInProgress);
            }
            if !ctx.detector_operational {
                return Ok(detector_unavailable(state));
            }
            let result_text = if ctx.clear_results_on_new_cycle {
                String::new()
            } else {
                state.result_text.clone()
            };
            Ok(Transition::to(SessionState {
                image_reference: None,
                result_text,
                phase: Phase::AwaitingPermission,
                pending_request: None,
            })
            .with(Effect::RequestPermission))
        }

        (Phase::AwaitingPermission, Event::PermissionResult(PermissionOutcome::Granted)) => {
            Ok(Transition::to(SessionState {
                phase: Phase::PermissionGranted,
                ..state.clone()
            }))
        }

        (Phase::AwaitingPermission, Event::PermissionResult(PermissionOutcome::Denied)) => {
            Ok(Transition::to(SessionState {
                phase: Phase::PermissionDenied,
                ..state.clone()
            })
            .with(Effect::Notify(Notice::PermissionDenied)))
        }

        (Phase::PermissionGranted, Event::LaunchCapture) => {
            let request = CaptureRequest {
                id: RequestId::new(),
                reference: ctx.capture_target.clone(),
            };
            Ok(Transition::to(SessionState {
                image_reference: Some(request.reference.clone()),
                result_text: state.result_text.clone(),
                phase: Phase::Capturing,
                pending_request: Some(request.id),
            })
            .with(Effect::LaunchCapture(request)))
        }

        (Phase::Capturing, Event::CaptureReturned(completion)) => {
            capture_returned(state, completion)
        }

        (
            Phase::AwaitingPermission | Phase::PermissionGranted | Phase::Capturing,
            Event::CancelCapture,
        ) => {
            info!(%phase, "capture cancelled");
            Ok(Transition::to(SessionState {
                phase: Phase::Idle,
                pending_request: None,
                ..state.clone()
            }))
        }

        (Phase::CaptureComplete, Event::BeginDecode) => Ok(Transition::to(SessionState {
            phase: Phase::Decoding,
            ..state.clone()
        })),

        (Phase::Decoding, Event::DecodeFinished(Ok(outcome))) => {
            if outcome.is_empty() {
                Ok(Transition::to(SessionState {
                    result_text: NOTHING_FOUND_TEXT.to_owned(),
                    phase: Phase::ClassificationEmpty,
                    ..state.clone()
                })
                .with(Effect::Notify(Notice::NothingFound)))
            } else {
                Ok(Transition::to(SessionState {
                    result_text: accumulate_results(&state.result_text, &outcome.records),
                    phase: Phase::ResultsReady,
                    ..state.clone()
                }))
            }
        }

        (Phase::Decoding, Event::DecodeFinished(Err(err))) => {
            if matches!(err, ScanwerkError::DetectorUnavailable) {
                return Ok(detector_unavailable(state));
            }
            warn!(error = %err, "decode failed");
            let kind = err.failure_kind().unwrap_or(FailureKind::DecodeFailed);
            let mut next = Transition::to(SessionState {
                phase: Phase::Error(kind),
                ..state.clone()
            });
            if let Some(notice) = notice_for(&err) {
                next = next.with(Effect::Notify(notice));
            }
            Ok(next)
        }

        (_, Event::Reset) => Ok(Transition::to(SessionState::default())),

        (_, event) => Err(ScanwerkError::InvalidTransition {
            phase: phase.name().to_owned(),
            event: event.name(),
        }),
    }
}

fn capture_returned(state: &SessionState, completion: CaptureCompletion) -> Result<Transition> {
    if state.pending_request != Some(completion.id) {
        return Err(ScanwerkError::StaleCompletion {
            expected: state
                .pending_request
                .map(|id| id.to_string())
                .unwrap_or_else(|| "none".into()),
            actual: completion.id.to_string(),
        });
    }

    let settled = SessionState {
        pending_request: None,
        ..state.clone()
    };

    match completion.outcome {
        CaptureOutcome::Saved => match settled.image_reference.clone() {
            Some(reference) if !reference.is_empty() => Ok(Transition::to(SessionState {
                phase: Phase::CaptureComplete,
                ..settled
            })
            .with(Effect::Decode(reference))),
            _ => {
                warn!("capture returned without an image reference");
                Ok(Transition::to(SessionState {
                    phase: Phase::Error(FailureKind::CaptureAborted),
                    ..settled
                }))
            }
        },
        CaptureOutcome::Cancelled => {
            info!("user cancelled the capture");
            Ok(Transition::to(SessionState {
                phase: Phase::Idle,
                ..settled
            }))
        }
        CaptureOutcome::Failed(reason) => {
            warn!(%reason, "capture failed");
            Ok(Transition::to(SessionState {
                phase: Phase::Error(FailureKind::CaptureAborted),
                ..settled
            }))
        }
    }
}

fn detector_unavailable(state: &SessionState) -> Transition {
    warn!("detector is not operational");
    Transition::to(SessionState {
        image_reference: state.image_reference.clone(),
        result_text: DETECTOR_UNAVAILABLE_TEXT.to_owned(),
        phase: Phase::Error(FailureKind::DetectorUnavailable),
        pending_request: None,
    })
    .with(Effect::Notify(Notice::DetectorUnavailable))
}

/// Owns the current `SessionState` and advances it one event at a time.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    ctx: MachineContext,
    state: SessionState,
}

impl CaptureSession {
    /// Start a fresh session. A detector that is already broken puts the
    /// session straight into the detector-unavailable state.
    pub fn new(config: &ScannerConfig, capture_target: ImageReference, detector_operational: bool) -> Self {
        let ctx = MachineContext {
            capture_target,
            detector_operational,
            clear_results_on_new_cycle: config.clear_results_on_new_cycle,
        };
        let state = if detector_operational {
            SessionState::default()
        } else {
            detector_unavailable(&SessionState::default()).state
        };
        Self { ctx, state }
    }

    /// Rebuild a session from a suspended snapshot. Nothing is re-run, but a
    /// detector that is broken now overrides whatever was saved.
    pub fn resume(
        config: &ScannerConfig,
        capture_target: ImageReference,
        detector_operational: bool,
        saved: SavedSession,
    ) -> Self {
        let mut session = Self::new(config, capture_target, detector_operational);
        let restored = persist::resume(saved);
        session.state = if detector_operational {
            restored
        } else {
            detector_unavailable(&restored).state
        };
        session
    }

    /// Snapshot for persistence across suspension.
    pub fn suspend(&self) -> SavedSession {
        persist::suspend(&self.state)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn result_text(&self) -> &str {
        &self.state.result_text
    }

    pub fn image_reference(&self) -> Option<&ImageReference> {
        self.state.image_reference.as_ref()
    }

    /// Record the latest detector health check.
    pub fn set_detector_operational(&mut self, operational: bool) {
        self.ctx.detector_operational = operational;
    }

    /// Apply one event. On error the state is unchanged.
    pub fn apply(&mut self, event: Event) -> Result<Vec<Effect>> {
        let name = event.name();
        let from = self.state.phase;
        let Transition { state, effects } = transition(&self.state, &self.ctx, event)?;
        debug!(event = name, %from, to = %state.phase, effects = effects.len(), "session transition");
        self.state = state;
        Ok(effects)
    }

    pub fn request_capture(&mut self) -> Result<Vec<Effect>> {
        self.apply(Event::RequestCapture)
    }

    pub fn permission_result(&mut self, outcome: PermissionOutcome) -> Result<Vec<Effect>> {
        self.apply(Event::PermissionResult(outcome))
    }

    pub fn launch_external_capture(&mut self) -> Result<Vec<Effect>> {
        self.apply(Event::LaunchCapture)
    }

    pub fn capture_returned(&mut self, completion: CaptureCompletion) -> Result<Vec<Effect>> {
        self.apply(Event::CaptureReturned(completion))
    }

    pub fn cancel_capture(&mut self) -> Result<Vec<Effect>> {
        self.apply(Event::CancelCapture)
    }

    pub fn begin_decode(&mut self) -> Result<Vec<Effect>> {
        self.apply(Event::BeginDecode)
    }

    pub fn finish_decode(&mut self, result: Result<ScanOutcome>) -> Result<Vec<Effect>> {
        self.apply(Event::DecodeFinished(result))
    }

    pub fn reset(&mut self) -> Result<Vec<Effect>> {
        self.apply(Event::Reset)
    }
}
