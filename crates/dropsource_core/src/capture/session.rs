//! Per-take capture session state machine.
//!
//! # Responsibility
//! - Drive one recording attempt: `Idle -> Requesting -> Recording ->
//!   Stopping -> Finalizing -> Idle`.
//! - Hand the finished take to the project state manager exactly once.
//!
//! # Invariants
//! - A second `start` while a take is active is rejected as a no-op.
//! - `stop` while `Idle` is a no-op.
//! - The device is released on every exit path: permission denial, begin
//!   failure after acquisition, backend failure on finalize, and clip
//!   persistence failure.

use crate::capture::backend::{CaptureBackend, CaptureError, DeviceHandle, SessionHandle};
use crate::clock;
use crate::model::clip::Clip;
use crate::model::project::ProjectId;
use crate::repo::record_store::RecordStore;
use crate::service::state_manager::ProjectStateManager;
use log::{error, info, warn};

/// Lifecycle phase of a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Requesting,
    Recording,
    Stopping,
    Finalizing,
}

/// Result of a `start` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The session is now recording.
    Started,
    /// A take was already active; the call was a no-op.
    AlreadyActive,
}

/// Result of a `stop` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// The take was finalized and persisted as this clip.
    Saved(Clip),
    /// No take was active; the call was a no-op.
    NoSession,
}

/// One recording attempt over an abstract platform surface.
///
/// Each "Record" action constructs a session; the session returns to
/// `Idle` after every attempt and may be reused for the next take.
pub struct CaptureSession<B: CaptureBackend> {
    backend: B,
    state: CaptureState,
    device: Option<DeviceHandle>,
    capture: Option<SessionHandle>,
    project_id: Option<ProjectId>,
    started_at_ms: Option<i64>,
}

impl<B: CaptureBackend> CaptureSession<B> {
    /// Creates an idle session over the given platform surface.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: CaptureState::Idle,
            device: None,
            capture: None,
            project_id: None,
            started_at_ms: None,
        }
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Requests microphone access and starts recording a take for
    /// `project_id`.
    ///
    /// Rejected as a no-op while another take is active. Permission denial
    /// and begin failures return the machine to `Idle` with anything
    /// acquired released; both are non-fatal to the session.
    pub fn start(&mut self, project_id: ProjectId) -> Result<StartOutcome, CaptureError> {
        if self.state != CaptureState::Idle {
            return Ok(StartOutcome::AlreadyActive);
        }

        self.state = CaptureState::Requesting;
        let device = match self.backend.request_access() {
            Ok(device) => device,
            Err(err) => {
                self.state = CaptureState::Idle;
                warn!("event=capture_start module=capture status=denied error={err}");
                return Err(err);
            }
        };

        match self.backend.begin_capture(device) {
            Ok(capture) => {
                self.device = Some(device);
                self.capture = Some(capture);
                self.project_id = Some(project_id);
                self.started_at_ms = Some(clock::now_ms());
                self.state = CaptureState::Recording;
                info!("event=capture_start module=capture status=ok project={project_id}");
                Ok(StartOutcome::Started)
            }
            Err(err) => {
                // Partial acquisition: the device was granted but capture
                // never began, so it still must be released here.
                self.backend.release_device(device);
                self.state = CaptureState::Idle;
                error!("event=capture_start module=capture status=error error={err}");
                Err(err)
            }
        }
    }

    /// Stops the take, finalizes the payload and persists it through the
    /// state manager.
    ///
    /// A no-op unless recording. The device is released and the machine
    /// returns to `Idle` on every path out of this method, including
    /// persistence failure (reported as `SaveFailed`, never swallowed).
    pub fn stop<S: RecordStore>(
        &mut self,
        state: &mut ProjectStateManager<S>,
    ) -> Result<StopOutcome, CaptureError> {
        if self.state != CaptureState::Recording {
            return Ok(StopOutcome::NoSession);
        }

        self.state = CaptureState::Stopping;
        let device = self.device.take();
        let started_at_ms = self.started_at_ms.take();
        let project_id = self.project_id.take();

        let result = match (self.capture.take(), project_id) {
            (Some(capture), Some(project_id)) => {
                self.finalize(capture, project_id, started_at_ms, state)
            }
            _ => Err(CaptureError::Backend(
                "recording take lost its handles".to_string(),
            )),
        };

        if let Some(device) = device {
            self.backend.release_device(device);
        }
        self.state = CaptureState::Idle;

        if let Err(err) = &result {
            error!("event=capture_stop module=capture status=error error={err}");
        }
        result
    }

    fn finalize<S: RecordStore>(
        &mut self,
        capture: SessionHandle,
        project_id: ProjectId,
        started_at_ms: Option<i64>,
        state: &mut ProjectStateManager<S>,
    ) -> Result<StopOutcome, CaptureError> {
        let payload = self.backend.end_capture(capture)?;
        self.state = CaptureState::Finalizing;

        let duration_ms = self.estimate_duration_ms(&payload, started_at_ms);
        match state.add_clip(project_id, payload, duration_ms) {
            Ok(clip) => {
                info!(
                    "event=capture_stop module=capture status=ok project={project_id} duration_ms={duration_ms}"
                );
                Ok(StopOutcome::Saved(clip))
            }
            Err(err) => Err(CaptureError::SaveFailed(err)),
        }
    }

    /// Payload probe first, elapsed wall clock second, 0 as the last
    /// resort. Probing is more accurate but may be unavailable or fail
    /// silently.
    fn estimate_duration_ms(&self, payload: &[u8], started_at_ms: Option<i64>) -> i64 {
        if let Some(probed) = self.backend.probe_duration_ms(payload) {
            return probed.max(0);
        }
        match started_at_ms {
            Some(started) => (clock::now_ms() - started).max(0),
            None => 0,
        }
    }
}
