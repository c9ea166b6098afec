//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Durable keyed storage for the three entity kinds, with the lookups the
//!   state manager needs: projects by recency, the note for a project, the
//!   clips for a project newest first.
//! - Return the persisted row for every write, read back from storage, so
//!   callers patch caches from what was actually stored.
//!
//! # Invariants
//! - At most one note per project; the upsert looks up before deciding
//!   insert vs. update rather than relying on the unique index alone.
//! - Clips are insert-only; no update or delete statement exists for them.
//! - Notes and clips are never written for a project id that does not exist.

use crate::clock;
use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::clip::Clip;
use crate::model::note::{Note, NoteId};
use crate::model::project::{validate_bpm, Project, ProjectId, SongKey};
use crate::model::ValidationError;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str =
    "SELECT uuid, title, bpm, song_key, created_at, updated_at FROM projects";
const NOTE_SELECT_SQL: &str = "SELECT uuid, project_id, content, updated_at FROM notes";
const CLIP_SELECT_SQL: &str =
    "SELECT uuid, project_id, audio_data, duration_ms, created_at FROM clips";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    /// Domain validation rejected the write; nothing was persisted.
    Validation(ValidationError),
    /// The referenced project does not exist.
    ProjectNotFound(ProjectId),
    /// Transport-level database failure.
    Db(DbError),
    /// Persisted state failed to parse or validate on read.
    InvalidData(String),
    /// The connection has not been migrated to the expected schema version.
    UninitializedConnection { expected: u32, actual: u32 },
    /// A required table is missing from the connected database.
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection { expected, actual } => write!(
                f,
                "connection schema version is {actual}, expected {expected}; open it via db::open_db"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Partial update for a project row.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears an optional
/// field. `updated_at` is always bumped, even for an all-`None` patch, which
/// is how callers "touch" a project after writing a dependent note or clip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub bpm: Option<Option<u16>>,
    pub song_key: Option<Option<SongKey>>,
}

/// Durable storage contract for projects, notes and clips.
///
/// All writes return the persisted row read back from storage. The store
/// does not cache and does not re-sort; both are the state manager's job.
pub trait RecordStore {
    /// Creates a project with `created_at = updated_at = now`.
    fn create_project(&self, title: &str) -> StoreResult<Project>;
    /// Merges `patch` into an existing project, always bumping `updated_at`.
    fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> StoreResult<Project>;
    /// Overwrites the project's note, inserting it on first save.
    fn upsert_note(&self, project_id: ProjectId, content: &str) -> StoreResult<Note>;
    /// Inserts one immutable clip row.
    fn append_clip(
        &self,
        project_id: ProjectId,
        audio_data: &[u8],
        duration_ms: i64,
    ) -> StoreResult<Clip>;
    /// All projects, `updated_at` descending.
    fn list_projects_by_recency(&self) -> StoreResult<Vec<Project>>;
    /// The note for a project, when one has been saved.
    fn get_note(&self, project_id: ProjectId) -> StoreResult<Option<Note>>;
    /// All clips for a project, newest first.
    fn list_clips(&self, project_id: ProjectId) -> StoreResult<Vec<Clip>>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Constructs a store from a migrated connection.
    ///
    /// Rejects connections whose schema version does not match this build
    /// or whose required tables are absent, so misuse fails at construction
    /// instead of on the first query.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let actual: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        let expected = latest_version();
        if actual != expected {
            return Err(StoreError::UninitializedConnection { expected, actual });
        }

        for table in ["projects", "notes", "clips"] {
            let present: i64 = conn.query_row(
                "SELECT EXISTS(
                    SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
                );",
                [table],
                |row| row.get(0),
            )?;
            if present == 0 {
                return Err(StoreError::MissingRequiredTable(table));
            }
        }

        Ok(Self { conn })
    }

    fn read_project(&self, id: ProjectId) -> StoreResult<Project> {
        let row = self
            .conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_project_row(row)),
            )
            .optional()?;

        match row {
            Some(parsed) => parsed,
            None => Err(StoreError::InvalidData(format!(
                "project {id} missing on write read-back"
            ))),
        }
    }

    fn require_project(&self, id: ProjectId) -> StoreResult<()> {
        let present: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM projects WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        if present == 0 {
            return Err(StoreError::ProjectNotFound(id));
        }
        Ok(())
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn create_project(&self, title: &str) -> StoreResult<Project> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }

        let id: ProjectId = Uuid::new_v4();
        let now = clock::now_ms();
        self.conn.execute(
            "INSERT INTO projects (uuid, title, bpm, song_key, created_at, updated_at)
             VALUES (?1, ?2, NULL, NULL, ?3, ?3);",
            params![id.to_string(), title, now],
        )?;

        self.read_project(id)
    }

    fn update_project(&self, id: ProjectId, patch: &ProjectPatch) -> StoreResult<Project> {
        let mut sql = String::from("UPDATE projects SET updated_at = ?");
        let mut binds: Vec<Value> = vec![Value::Integer(clock::now_ms())];

        if let Some(title) = &patch.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(ValidationError::EmptyTitle.into());
            }
            sql.push_str(", title = ?");
            binds.push(Value::Text(title.to_string()));
        }
        if let Some(bpm) = patch.bpm {
            if let Some(value) = bpm {
                validate_bpm(value)?;
            }
            sql.push_str(", bpm = ?");
            binds.push(bpm.map_or(Value::Null, |value| Value::Integer(i64::from(value))));
        }
        if let Some(song_key) = patch.song_key {
            sql.push_str(", song_key = ?");
            binds.push(song_key.map_or(Value::Null, |key| Value::Text(key.as_str().to_string())));
        }

        sql.push_str(" WHERE uuid = ?;");
        binds.push(Value::Text(id.to_string()));

        let changed = self.conn.execute(&sql, params_from_iter(binds))?;
        if changed == 0 {
            return Err(StoreError::ProjectNotFound(id));
        }

        self.read_project(id)
    }

    fn upsert_note(&self, project_id: ProjectId, content: &str) -> StoreResult<Note> {
        self.require_project(project_id)?;

        let now = clock::now_ms();
        // No atomic upsert: look up first, then decide insert vs. update.
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT uuid FROM notes WHERE project_id = ?1;",
                [project_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(note_id) => {
                self.conn.execute(
                    "UPDATE notes SET content = ?1, updated_at = ?2 WHERE uuid = ?3;",
                    params![content, now, note_id],
                )?;
            }
            None => {
                let note_id: NoteId = Uuid::new_v4();
                self.conn.execute(
                    "INSERT INTO notes (uuid, project_id, content, updated_at)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![note_id.to_string(), project_id.to_string(), content, now],
                )?;
            }
        }

        self.get_note(project_id)?.ok_or_else(|| {
            StoreError::InvalidData(format!("note for project {project_id} missing on read-back"))
        })
    }

    fn append_clip(
        &self,
        project_id: ProjectId,
        audio_data: &[u8],
        duration_ms: i64,
    ) -> StoreResult<Clip> {
        self.require_project(project_id)?;

        let clip = Clip {
            id: Uuid::new_v4(),
            project_id,
            audio_data: audio_data.to_vec(),
            duration_ms,
            created_at: clock::now_ms(),
        };
        clip.validate()?;

        self.conn.execute(
            "INSERT INTO clips (uuid, project_id, audio_data, duration_ms, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                clip.id.to_string(),
                clip.project_id.to_string(),
                clip.audio_data,
                clip.duration_ms,
                clip.created_at,
            ],
        )?;

        let row = self
            .conn
            .query_row(
                &format!("{CLIP_SELECT_SQL} WHERE uuid = ?1;"),
                [clip.id.to_string()],
                |row| Ok(parse_clip_row(row)),
            )
            .optional()?;

        match row {
            Some(parsed) => parsed,
            None => Err(StoreError::InvalidData(format!(
                "clip {} missing on write read-back",
                clip.id
            ))),
        }
    }

    fn list_projects_by_recency(&self) -> StoreResult<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} ORDER BY updated_at DESC, uuid ASC;"))?;
        let mut rows = stmt.query([])?;

        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn get_note(&self, project_id: ProjectId) -> StoreResult<Option<Note>> {
        let row = self
            .conn
            .query_row(
                &format!("{NOTE_SELECT_SQL} WHERE project_id = ?1;"),
                [project_id.to_string()],
                |row| Ok(parse_note_row(row)),
            )
            .optional()?;

        row.transpose()
    }

    fn list_clips(&self, project_id: ProjectId) -> StoreResult<Vec<Clip>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLIP_SELECT_SQL} WHERE project_id = ?1 ORDER BY created_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;

        let mut clips = Vec::new();
        while let Some(row) = rows.next()? {
            clips.push(parse_clip_row(row)?);
        }
        Ok(clips)
    }
}

fn parse_project_row(row: &Row<'_>) -> StoreResult<Project> {
    let bpm = match row.get::<_, Option<i64>>("bpm")? {
        Some(raw) => Some(u16::try_from(raw).map_err(|_| {
            StoreError::InvalidData(format!("invalid bpm value `{raw}` in projects.bpm"))
        })?),
        None => None,
    };

    let song_key = match row.get::<_, Option<String>>("song_key")? {
        Some(label) => Some(SongKey::parse(&label).map_err(|_| {
            StoreError::InvalidData(format!(
                "invalid song key `{label}` in projects.song_key"
            ))
        })?),
        None => None,
    };

    let project = Project {
        id: parse_uuid(row, "uuid", "projects.uuid")?,
        title: row.get("title")?,
        bpm,
        song_key,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    project.validate()?;
    Ok(project)
}

fn parse_note_row(row: &Row<'_>) -> StoreResult<Note> {
    Ok(Note {
        id: parse_uuid(row, "uuid", "notes.uuid")?,
        project_id: parse_uuid(row, "project_id", "notes.project_id")?,
        content: row.get("content")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_clip_row(row: &Row<'_>) -> StoreResult<Clip> {
    let clip = Clip {
        id: parse_uuid(row, "uuid", "clips.uuid")?,
        project_id: parse_uuid(row, "project_id", "clips.project_id")?,
        audio_data: row.get("audio_data")?,
        duration_ms: row.get("duration_ms")?,
        created_at: row.get("created_at")?,
    };
    clip.validate()?;
    Ok(clip)
}

fn parse_uuid(row: &Row<'_>, column: &str, qualified: &str) -> StoreResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| StoreError::InvalidData(format!("invalid uuid `{text}` in {qualified}")))
}
