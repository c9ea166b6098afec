//! Domain records for the sketchpad core.
//!
//! # Responsibility
//! - Define the Project/Note/Clip shapes shared by the record store and the
//!   project state manager.
//! - Keep validation on the models so every write path enforces it.
//!
//! # Invariants
//! - Every record carries a stable uuid assigned on creation.
//! - A project's `updated_at` never precedes its `created_at`.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod clip;
pub mod note;
pub mod project;

/// Validation failure for domain records and metadata patches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Project title is empty after trimming.
    EmptyTitle,
    /// BPM outside the accepted range.
    BpmOutOfRange(u16),
    /// Song key label is not one of the twelve pitch classes.
    UnknownSongKey(String),
    /// `updated_at` precedes `created_at`.
    TimestampOrder { created_at: i64, updated_at: i64 },
    /// Clip audio payload is empty.
    EmptyClipPayload,
    /// Clip duration is negative.
    NegativeClipDuration(i64),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "project title must not be empty"),
            Self::BpmOutOfRange(value) => write!(
                f,
                "bpm {value} is outside the accepted range {}..={}",
                project::BPM_MIN,
                project::BPM_MAX
            ),
            Self::UnknownSongKey(label) => write!(f, "unknown song key label `{label}`"),
            Self::TimestampOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at {updated_at} precedes created_at {created_at}"
            ),
            Self::EmptyClipPayload => write!(f, "clip audio payload must not be empty"),
            Self::NegativeClipDuration(value) => {
                write!(f, "clip duration {value}ms must not be negative")
            }
        }
    }
}

impl Error for ValidationError {}
