//! Project domain model and metadata validation.
//!
//! # Responsibility
//! - Define the project record that anchors notes and clips.
//! - Validate title and musical metadata before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another project.
//! - `updated_at >= created_at`; every mutation to the project or its
//!   dependents bumps `updated_at`.

use crate::model::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a project.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ProjectId = Uuid;

/// Lowest BPM accepted as project metadata.
pub const BPM_MIN: u16 = 1;
/// Highest BPM accepted as project metadata.
pub const BPM_MAX: u16 = 960;

/// The twelve pitch classes a project can be keyed in.
///
/// Wire labels use sharp spellings (`C#`); flat spellings are accepted on
/// parse and normalized to their sharp equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SongKey {
    C,
    #[serde(rename = "C#")]
    CSharp,
    D,
    #[serde(rename = "D#")]
    DSharp,
    E,
    F,
    #[serde(rename = "F#")]
    FSharp,
    G,
    #[serde(rename = "G#")]
    GSharp,
    A,
    #[serde(rename = "A#")]
    ASharp,
    B,
}

impl SongKey {
    /// All keys in chromatic order, for pickers and exhaustive tests.
    pub const ALL: [SongKey; 12] = [
        Self::C,
        Self::CSharp,
        Self::D,
        Self::DSharp,
        Self::E,
        Self::F,
        Self::FSharp,
        Self::G,
        Self::GSharp,
        Self::A,
        Self::ASharp,
        Self::B,
    ];

    /// Canonical label, as shown in pickers and stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::C => "C",
            Self::CSharp => "C#",
            Self::D => "D",
            Self::DSharp => "D#",
            Self::E => "E",
            Self::F => "F",
            Self::FSharp => "F#",
            Self::G => "G",
            Self::GSharp => "G#",
            Self::A => "A",
            Self::ASharp => "A#",
            Self::B => "B",
        }
    }

    /// Parses a pitch-class label. Accepts sharp and flat spellings.
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        match label.trim() {
            "C" => Ok(Self::C),
            "C#" | "Db" => Ok(Self::CSharp),
            "D" => Ok(Self::D),
            "D#" | "Eb" => Ok(Self::DSharp),
            "E" => Ok(Self::E),
            "F" => Ok(Self::F),
            "F#" | "Gb" => Ok(Self::FSharp),
            "G" => Ok(Self::G),
            "G#" | "Ab" => Ok(Self::GSharp),
            "A" => Ok(Self::A),
            "A#" | "Bb" => Ok(Self::ASharp),
            "B" => Ok(Self::B),
            other => Err(ValidationError::UnknownSongKey(other.to_string())),
        }
    }
}

impl std::fmt::Display for SongKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A song idea: title plus optional tempo/key metadata.
///
/// Projects anchor exactly one note and any number of clips. The record
/// store assigns `id` and both timestamps on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Stable id used by notes, clips and the active-project selection.
    pub id: ProjectId,
    /// Non-empty display title.
    pub title: String,
    /// Tempo in beats per minute, absent until the user sets it.
    pub bpm: Option<u16>,
    /// Musical key, absent until the user sets it.
    pub song_key: Option<SongKey>,
    /// Creation stamp in epoch milliseconds.
    pub created_at: i64,
    /// Bumped on every mutation to the project or its note/clips.
    pub updated_at: i64,
}

impl Project {
    /// Checks title, metadata and timestamp ordering.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if let Some(bpm) = self.bpm {
            validate_bpm(bpm)?;
        }
        if self.updated_at < self.created_at {
            return Err(ValidationError::TimestampOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

/// Rejects tempos outside `BPM_MIN..=BPM_MAX`.
pub fn validate_bpm(bpm: u16) -> Result<(), ValidationError> {
    if (BPM_MIN..=BPM_MAX).contains(&bpm) {
        Ok(())
    } else {
        Err(ValidationError::BpmOutOfRange(bpm))
    }
}
