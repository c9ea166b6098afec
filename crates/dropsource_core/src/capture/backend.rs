//! Platform audio capture surface contract.
//!
//! Implementations wrap whatever the platform offers (a media recorder, a
//! system capture API, an external recorder process). The core only ever
//! talks to this trait.

use crate::repo::record_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque handle to an acquired input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceHandle(pub u64);

/// Opaque handle to one in-flight capture on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHandle(pub u64);

/// Capture-layer failure.
#[derive(Debug)]
pub enum CaptureError {
    /// The user or platform denied microphone access. Non-fatal.
    PermissionDenied(String),
    /// The platform surface failed mid-lifecycle.
    Backend(String),
    /// The take was captured but persisting the clip failed. The device
    /// was still released and the session reset before this surfaced.
    SaveFailed(StoreError),
}

impl Display for CaptureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied(reason) => write!(f, "microphone access denied: {reason}"),
            Self::Backend(reason) => write!(f, "capture backend failure: {reason}"),
            Self::SaveFailed(err) => write!(f, "captured take could not be saved: {err}"),
        }
    }
}

impl Error for CaptureError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SaveFailed(err) => Some(err),
            _ => None,
        }
    }
}

/// Platform recording surface.
///
/// Implementations buffer audio chunks internally between `begin_capture`
/// and `end_capture`; `end_capture` returns the assembled payload.
pub trait CaptureBackend {
    /// Requests microphone access, acquiring a device on success.
    fn request_access(&mut self) -> Result<DeviceHandle, CaptureError>;

    /// Starts buffering audio from an acquired device.
    fn begin_capture(&mut self, device: DeviceHandle) -> Result<SessionHandle, CaptureError>;

    /// Stops buffering and returns the assembled audio payload.
    fn end_capture(&mut self, session: SessionHandle) -> Result<Vec<u8>, CaptureError>;

    /// Releases an acquired device. Must be safe to call exactly once per
    /// acquisition, on success and failure paths alike.
    fn release_device(&mut self, device: DeviceHandle);

    /// Probes the duration of an assembled payload.
    ///
    /// More accurate than wall-clock elapsed time when available. The
    /// default declares probing unavailable; callers fall back to elapsed
    /// time.
    fn probe_duration_ms(&self, _payload: &[u8]) -> Option<i64> {
        None
    }
}
