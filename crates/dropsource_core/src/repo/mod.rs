//! Persistence layer: record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Define the durable storage contract for projects, notes and clips.
//! - Isolate SQL details from the state manager and capture flow.
//!
//! # Invariants
//! - Writes validate domain records before any SQL mutation.
//! - Reads reject invalid persisted state instead of masking it.

pub mod record_store;
