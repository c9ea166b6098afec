//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `dropsource_core` linkage.
//! - Run one create/save/list cycle against an in-memory store.

use dropsource_core::db::open_db_in_memory;
use dropsource_core::{count_syllables, ProjectStateManager, SqliteRecordStore};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    println!("dropsource_core version={}", dropsource_core::core_version());

    let conn = open_db_in_memory()?;
    let store = SqliteRecordStore::try_new(&conn)?;
    let mut state = ProjectStateManager::new(store);

    state.load_all()?;
    let id = state.add_project("Smoke test")?;
    let lyric = "la la la";
    state.save_note(id, lyric)?;

    let note = state.get_note_for(id)?.map(|note| note.content);
    println!(
        "projects={} active={:?} note={:?} syllables={}",
        state.projects().len(),
        state.active_id(),
        note,
        count_syllables(lyric)
    );

    Ok(())
}
