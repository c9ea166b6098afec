//! Project state manager: the single coordinator between UI intents and the
//! record store.
//!
//! # Responsibility
//! - Own the in-memory project list (recency-ordered), the active-project
//!   selection and the loading flag the rendering layer reads.
//! - Keep the cache consistent with the store after every mutation without
//!   a full reload: persist, then patch the cache from the row the store
//!   returned, then re-sort.
//!
//! # Invariants
//! - The cached list is always sorted by `updated_at` descending; the sort
//!   is stable so equal stamps keep their relative order.
//! - On any store failure the cache is left untouched; failures are logged
//!   here once and re-raised to the caller.
//! - No other component writes to the cache.

use crate::model::clip::Clip;
use crate::model::note::Note;
use crate::model::project::{Project, ProjectId, SongKey};
use crate::repo::record_store::{ProjectPatch, RecordStore, StoreResult};
use log::{error, info};

/// Partial bpm/key update for the active project's metadata panel.
///
/// Outer `None` leaves a field untouched; `Some(None)` clears it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectMeta {
    pub bpm: Option<Option<u16>>,
    pub song_key: Option<Option<SongKey>>,
}

/// In-memory cache and mutation coordinator over a record store.
///
/// The store is passed in at construction, so tests can substitute an
/// isolated or failing implementation.
pub struct ProjectStateManager<S: RecordStore> {
    store: S,
    projects: Vec<Project>,
    active_id: Option<ProjectId>,
    loading: bool,
}

impl<S: RecordStore> ProjectStateManager<S> {
    /// Creates a manager with an empty cache over the provided store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            projects: Vec::new(),
            active_id: None,
            loading: false,
        }
    }

    /// Cached projects, most recently updated first.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Currently selected project id, if any.
    pub fn active_id(&self) -> Option<ProjectId> {
        self.active_id
    }

    /// Whether a wholesale reload is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The cached entry for the active selection.
    ///
    /// `None` both when nothing is selected and when the selection points
    /// at a project absent from the cache; consumers treat either as "no
    /// active project".
    pub fn active_project(&self) -> Option<&Project> {
        let active_id = self.active_id?;
        self.projects.iter().find(|project| project.id == active_id)
    }

    /// Replaces the cache wholesale from the store and selects the most
    /// recently updated project. Used once at startup.
    pub fn load_all(&mut self) -> StoreResult<()> {
        self.loading = true;
        match self.store.list_projects_by_recency() {
            Ok(projects) => {
                self.active_id = projects.first().map(|project| project.id);
                self.projects = projects;
                self.loading = false;
                info!(
                    "event=load_all module=state status=ok count={}",
                    self.projects.len()
                );
                Ok(())
            }
            Err(err) => {
                self.loading = false;
                error!("event=load_all module=state status=error error={err}");
                Err(err)
            }
        }
    }

    /// Creates a project, prepends the persisted row to the cache and makes
    /// it active. Returns the new id.
    pub fn add_project(&mut self, title: &str) -> StoreResult<ProjectId> {
        let project = self
            .store
            .create_project(title)
            .inspect_err(|err| error!("event=project_add module=state status=error error={err}"))?;

        let id = project.id;
        // Optimistic insert: no reload round-trip after a successful create.
        self.projects.insert(0, project);
        self.resort();
        self.active_id = Some(id);
        info!("event=project_add module=state status=ok id={id}");
        Ok(id)
    }

    /// Selects a project. Pure cache mutation; an id absent from the cache
    /// is tolerated and simply reads back as "no active project".
    pub fn set_active(&mut self, id: ProjectId) {
        self.active_id = Some(id);
    }

    /// Persists a partial bpm/key update and patches the cache entry from
    /// the returned row.
    pub fn set_project_meta(&mut self, id: ProjectId, meta: ProjectMeta) -> StoreResult<()> {
        let patch = ProjectPatch {
            title: None,
            bpm: meta.bpm,
            song_key: meta.song_key,
        };
        let updated = self.store.update_project(id, &patch).inspect_err(|err| {
            error!("event=project_meta module=state status=error id={id} error={err}")
        })?;

        self.patch_cached(updated);
        Ok(())
    }

    /// Upserts the project's note, bumps the project row and re-sorts.
    ///
    /// Note content is not cached here; callers re-fetch via
    /// [`Self::get_note_for`].
    pub fn save_note(&mut self, project_id: ProjectId, content: &str) -> StoreResult<Note> {
        let note = self
            .store
            .upsert_note(project_id, content)
            .inspect_err(|err| {
                error!("event=note_save module=state status=error id={project_id} error={err}")
            })?;

        self.touch_project(project_id)?;
        Ok(note)
    }

    /// Appends a clip, bumps the project row and re-sorts.
    pub fn add_clip(
        &mut self,
        project_id: ProjectId,
        audio_data: Vec<u8>,
        duration_ms: i64,
    ) -> StoreResult<Clip> {
        let clip = self
            .store
            .append_clip(project_id, &audio_data, duration_ms)
            .inspect_err(|err| {
                error!("event=clip_add module=state status=error id={project_id} error={err}")
            })?;

        self.touch_project(project_id)?;
        Ok(clip)
    }

    /// Pass-through read; never cached.
    pub fn get_note_for(&self, project_id: ProjectId) -> StoreResult<Option<Note>> {
        self.store.get_note(project_id)
    }

    /// Pass-through read; never cached. Newest clip first.
    pub fn get_clips_for(&self, project_id: ProjectId) -> StoreResult<Vec<Clip>> {
        self.store.list_clips(project_id)
    }

    fn touch_project(&mut self, project_id: ProjectId) -> StoreResult<()> {
        let updated = self
            .store
            .update_project(project_id, &ProjectPatch::default())
            .inspect_err(|err| {
                error!("event=project_touch module=state status=error id={project_id} error={err}")
            })?;
        self.patch_cached(updated);
        Ok(())
    }

    fn patch_cached(&mut self, updated: Project) {
        if let Some(entry) = self
            .projects
            .iter_mut()
            .find(|project| project.id == updated.id)
        {
            *entry = updated;
            self.resort();
        }
    }

    fn resort(&mut self) {
        // Vec::sort_by is stable; equal stamps keep their relative order.
        self.projects
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }
}
