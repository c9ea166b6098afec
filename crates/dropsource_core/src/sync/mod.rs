//! Hosted-backend adapter contract.
//!
//! The multi-device variant persists through a hosted database and object
//! store. That collaborator is out of core scope; this module pins down
//! the contract it must honor.

pub mod remote;
