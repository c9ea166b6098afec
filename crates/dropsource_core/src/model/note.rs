//! Note domain model.
//!
//! A project has at most one note: the single lyrics/ideas text blob.
//! Content may be empty; an empty save is still a save.

use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a note.
pub type NoteId = Uuid;

/// The lyrics/notes text attached to one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Stable note id.
    pub id: NoteId,
    /// Owning project; at most one note exists per project.
    pub project_id: ProjectId,
    /// Free-form text, possibly empty.
    pub content: String,
    /// Last save stamp in epoch milliseconds.
    pub updated_at: i64,
}
