//! Clip domain model.
//!
//! # Responsibility
//! - Define one recorded audio take belonging to a project.
//!
//! # Invariants
//! - Clips are immutable once created; there is no update operation.
//! - `duration_ms` is non-negative and may be 0 when estimation failed.

use crate::model::project::ProjectId;
use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a clip.
pub type ClipId = Uuid;

/// One recorded take: opaque audio bytes plus a duration estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clip {
    /// Stable clip id.
    pub id: ClipId,
    /// Owning project; clips are append-only per project.
    pub project_id: ProjectId,
    /// Opaque encoded audio payload, never empty.
    pub audio_data: Vec<u8>,
    /// Estimated length in milliseconds; 0 when estimation failed.
    pub duration_ms: i64,
    /// Recording stamp in epoch milliseconds.
    pub created_at: i64,
}

impl Clip {
    /// Checks payload presence and duration sign.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.audio_data.is_empty() {
            return Err(ValidationError::EmptyClipPayload);
        }
        if self.duration_ms < 0 {
            return Err(ValidationError::NegativeClipDuration(self.duration_ms));
        }
        Ok(())
    }
}
