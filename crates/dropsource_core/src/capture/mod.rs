//! Audio capture: platform surface contract and the per-take session
//! state machine.
//!
//! # Responsibility
//! - Abstract the platform recording surface behind a trait so the core
//!   owns the lifecycle without owning any device code.
//! - Drive one recording attempt from permission request to persisted clip.
//!
//! # Invariants
//! - At most one active take per recording surface.
//! - The capture device is released on every exit path.

pub mod backend;
pub mod session;
