//! Remote sync adapter contract and error envelope.
//!
//! # Responsibility
//! - Define the operations a hosted-backend adapter translates into
//!   authenticated requests: create project, upload clip, sign clip URLs.
//! - Classify adapter failures so callers can tell terminal policy
//!   failures from retryable transport ones.
//!
//! # Invariants
//! - The core never inspects credentials; authentication is wholly the
//!   adapter's concern.
//! - Storage paths are unique per clip; a path collision is a distinct
//!   error, not an overwrite.

use crate::model::project::SongKey;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RemoteSyncResult<T> = Result<T, RemoteSyncError>;

/// Project row as persisted by the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteProject {
    /// Backend-assigned row id.
    pub id: String,
    pub title: String,
    pub bpm: Option<u16>,
    pub song_key: Option<SongKey>,
    /// Backend-formatted creation stamp.
    pub created_at: String,
}

/// Clip row as persisted by the hosted backend. The payload itself lives
/// in object storage at `storage_path`; rows never carry audio bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteClip {
    pub id: String,
    pub project_id: String,
    /// Object-store path the payload was uploaded to.
    pub storage_path: String,
    pub duration_ms: i64,
    pub created_at: String,
}

/// Failure envelope for adapter operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSyncError {
    /// Not signed in, or the session expired.
    Auth(String),
    /// The backend's access policy rejected the operation.
    Policy(String),
    /// The clip's storage path already exists.
    StorageConflict { storage_path: String },
    /// The payload exceeds the backend's object size limit.
    StorageTooLarge { size_bytes: usize },
    /// Network or backend availability failure; retryable.
    Transport(String),
}

impl RemoteSyncError {
    /// Whether a caller-side retry could reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl Display for RemoteSyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(reason) => write!(f, "authentication failed: {reason}"),
            Self::Policy(reason) => write!(f, "rejected by backend policy: {reason}"),
            Self::StorageConflict { storage_path } => {
                write!(f, "storage path already exists: {storage_path}")
            }
            Self::StorageTooLarge { size_bytes } => {
                write!(f, "payload of {size_bytes} bytes exceeds the storage limit")
            }
            Self::Transport(reason) => write!(f, "transport failure: {reason}"),
        }
    }
}

impl Error for RemoteSyncError {}

/// Hosted-backend adapter: the same logical operations the local store
/// serves, expressed as authenticated remote requests.
pub trait RemoteSyncAdapter {
    /// Creates a project row (the backend also ensures its empty note row
    /// exists).
    fn create_project(
        &self,
        title: &str,
        bpm: Option<u16>,
        song_key: Option<SongKey>,
    ) -> RemoteSyncResult<RemoteProject>;

    /// Uploads a clip payload to object storage and inserts its row.
    fn upload_clip(
        &self,
        project_id: &str,
        payload: &[u8],
        duration_ms: i64,
    ) -> RemoteSyncResult<RemoteClip>;

    /// Creates a short-lived signed URL for a stored clip payload.
    fn get_clip_url(&self, storage_path: &str, ttl_secs: u32) -> RemoteSyncResult<String>;
}
