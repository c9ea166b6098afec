use dropsource_core::db::open_db_in_memory;
use dropsource_core::{
    ProjectMeta, ProjectStateManager, SongKey, SqliteRecordStore, StoreError, ValidationError,
};
use uuid::Uuid;

#[test]
fn load_all_on_empty_store_yields_no_projects_and_no_selection() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());

    state.load_all().unwrap();
    assert!(state.projects().is_empty());
    assert!(state.active_id().is_none());
    assert!(!state.is_loading());
}

#[test]
fn add_project_prepends_selects_and_keeps_list_sorted() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());

    let first = state.add_project("Demo").unwrap();
    assert_eq!(state.projects().len(), 1);
    assert_eq!(state.active_id(), Some(first));
    assert_eq!(state.projects()[0].title, "Demo");
    assert!(state.projects()[0].bpm.is_none());
    assert!(state.projects()[0].song_key.is_none());

    let second = state.add_project("Next up").unwrap();
    assert_eq!(state.projects().len(), 2);
    assert_eq!(state.active_id(), Some(second));
    assert_sorted_by_recency(&state);
}

#[test]
fn rejected_add_leaves_cache_and_selection_untouched() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());

    let existing = state.add_project("Keeper").unwrap();
    let err = state.add_project("   ").unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::EmptyTitle)
    ));
    assert_eq!(state.projects().len(), 1);
    assert_eq!(state.active_id(), Some(existing));
}

#[test]
fn set_project_meta_patches_cache_without_clobbering_other_fields() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    let id = state.add_project("Demo").unwrap();

    state
        .set_project_meta(
            id,
            ProjectMeta {
                bpm: Some(Some(128)),
                ..ProjectMeta::default()
            },
        )
        .unwrap();
    assert_eq!(state.projects().len(), 1);
    assert_eq!(state.projects()[0].bpm, Some(128));

    state
        .set_project_meta(
            id,
            ProjectMeta {
                song_key: Some(Some(SongKey::D)),
                ..ProjectMeta::default()
            },
        )
        .unwrap();
    let cached = &state.projects()[0];
    assert_eq!(cached.bpm, Some(128));
    assert_eq!(cached.song_key, Some(SongKey::D));
}

#[test]
fn load_all_selects_most_recently_updated_project() {
    let conn = open_db_in_memory().unwrap();

    let (a, b) = {
        let mut seed = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
        (
            seed.add_project("A").unwrap(),
            seed.add_project("B").unwrap(),
        )
    };

    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    state.load_all().unwrap();

    let ids: Vec<_> = state.projects().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![b, a]);
    assert_eq!(state.active_id(), Some(b));
}

#[test]
fn saving_a_note_floats_its_project_to_the_top() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());

    let a = state.add_project("A").unwrap();
    let b = state.add_project("B").unwrap();
    assert_eq!(state.projects()[0].id, b);

    state.save_note(a, "hook idea").unwrap();

    let ids: Vec<_> = state.projects().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![a, b]);
    assert_sorted_by_recency(&state);
}

#[test]
fn note_content_is_read_through_not_cached() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    let id = state.add_project("Words").unwrap();

    assert!(state.get_note_for(id).unwrap().is_none());

    state.save_note(id, "").unwrap();
    let note = state.get_note_for(id).unwrap().unwrap();
    assert_eq!(note.content, "");

    state.save_note(id, "second pass").unwrap();
    let reread = state.get_note_for(id).unwrap().unwrap();
    assert_eq!(reread.content, "second pass");
    assert_eq!(note.id, reread.id);
}

#[test]
fn add_clip_bumps_project_and_never_touches_prior_clips() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());

    let quiet = state.add_project("Quiet").unwrap();
    let takes = state.add_project("Takes").unwrap();
    state.set_active(quiet);
    assert_eq!(state.projects()[0].id, takes);

    state.add_clip(quiet, b"take-1".to_vec(), 1_200).unwrap();
    assert_eq!(state.projects()[0].id, quiet);
    assert_eq!(state.get_clips_for(quiet).unwrap().len(), 1);

    state.add_clip(quiet, b"take-2".to_vec(), 900).unwrap();
    let clips = state.get_clips_for(quiet).unwrap();
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[1].audio_data, b"take-1");
}

#[test]
fn set_active_tolerates_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    state.add_project("Only one").unwrap();

    let stray = Uuid::new_v4();
    state.set_active(stray);

    assert_eq!(state.active_id(), Some(stray));
    assert!(state.active_project().is_none());
}

#[test]
fn active_project_resolves_the_cached_entry() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());

    let a = state.add_project("A").unwrap();
    state.add_project("B").unwrap();
    state.set_active(a);

    assert_eq!(state.active_project().map(|p| p.id), Some(a));
}

#[test]
fn meta_update_for_unknown_project_is_not_found_and_cache_is_untouched() {
    let conn = open_db_in_memory().unwrap();
    let mut state = ProjectStateManager::new(SqliteRecordStore::try_new(&conn).unwrap());
    let id = state.add_project("Stable").unwrap();
    let before = state.projects()[0].clone();

    let missing = Uuid::new_v4();
    let err = state
        .set_project_meta(
            missing,
            ProjectMeta {
                bpm: Some(Some(100)),
                ..ProjectMeta::default()
            },
        )
        .unwrap_err();

    assert!(matches!(err, StoreError::ProjectNotFound(bad) if bad == missing));
    assert_eq!(state.projects()[0], before);
    assert_eq!(state.active_id(), Some(id));
}

fn assert_sorted_by_recency<S: dropsource_core::RecordStore>(state: &ProjectStateManager<S>) {
    let stamps: Vec<_> = state.projects().iter().map(|p| p.updated_at).collect();
    let mut sorted = stamps.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(stamps, sorted);
}
