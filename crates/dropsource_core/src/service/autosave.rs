//! Debounced note autosave.
//!
//! # Responsibility
//! - Coalesce rapid note edits into one save per pause in typing.
//! - Detect and discard out-of-order save completions.
//!
//! # Invariants
//! - At most one edit is pending; queueing a new edit replaces (cancels)
//!   the previous pending one and restarts the debounce window.
//! - Edit sequence numbers are strictly increasing; a completion for a
//!   sequence at or below the last applied one is discarded.
//!
//! Time is passed in by the caller as epoch milliseconds, so the component
//! is deterministic under test. Production callers pass `clock::now_ms()`.

use crate::model::project::ProjectId;
use log::warn;

/// Debounce window between the last keystroke and the save, matching the
/// sketchpad's editor behavior.
pub const DEFAULT_DEBOUNCE_MS: i64 = 500;

/// One coalesced edit waiting for its debounce window to elapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSave {
    /// Project whose note is being edited.
    pub project_id: ProjectId,
    /// Full note content as of the latest keystroke.
    pub content: String,
    /// Monotonic edit sequence number.
    pub seq: u64,
    /// Epoch-ms instant at which the save becomes due.
    pub due_at_ms: i64,
}

/// Result of reporting a save completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveCompletion {
    /// The completion carried the newest sequence seen so far.
    Applied,
    /// A newer save already completed; this result must not be surfaced.
    Discarded,
}

/// Coalesces note edits and guards completion ordering.
#[derive(Debug)]
pub struct NoteAutosave {
    window_ms: i64,
    next_seq: u64,
    last_applied_seq: Option<u64>,
    pending: Option<PendingSave>,
}

impl NoteAutosave {
    /// Creates an autosaver with the given debounce window.
    pub fn new(window_ms: i64) -> Self {
        Self {
            window_ms,
            next_seq: 0,
            last_applied_seq: None,
            pending: None,
        }
    }

    /// The edit currently waiting out its debounce window.
    pub fn pending(&self) -> Option<&PendingSave> {
        self.pending.as_ref()
    }

    /// Records an edit, replacing any pending one and restarting the
    /// window. Returns the edit's sequence number.
    pub fn queue_edit(
        &mut self,
        project_id: ProjectId,
        content: impl Into<String>,
        now_ms: i64,
    ) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending = Some(PendingSave {
            project_id,
            content: content.into(),
            seq,
            due_at_ms: now_ms + self.window_ms,
        });
        seq
    }

    /// Takes the pending edit once its window has elapsed.
    pub fn take_due(&mut self, now_ms: i64) -> Option<PendingSave> {
        if self.pending.as_ref()?.due_at_ms <= now_ms {
            self.pending.take()
        } else {
            None
        }
    }

    /// Takes the pending edit immediately, window or not. Used for explicit
    /// saves (blur, save shortcut) and project switches.
    pub fn flush(&mut self) -> Option<PendingSave> {
        self.pending.take()
    }

    /// Drops the pending edit without saving it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Reports that the save for `seq` completed. Completions that arrive
    /// after a newer save already applied are discarded, closing the
    /// last-write-wins race under variable store latency.
    pub fn complete(&mut self, seq: u64) -> SaveCompletion {
        match self.last_applied_seq {
            Some(applied) if seq <= applied => {
                warn!(
                    "event=note_autosave module=state status=discarded seq={seq} applied={applied}"
                );
                SaveCompletion::Discarded
            }
            _ => {
                self.last_applied_seq = Some(seq);
                SaveCompletion::Applied
            }
        }
    }
}

impl Default for NoteAutosave {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}
