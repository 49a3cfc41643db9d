//! # cerebral-core
//!
//! Shared vocabulary for the Cerebral client: the canonical memory model,
//! the branch registry, the degraded-read result type, and the error taxonomy
//! used by every other crate in the workspace.

pub mod branch;
pub mod error;
pub mod types;

pub use branch::{BranchDescriptor, BranchRegistry, BRANCHES};
pub use error::{CerebralError, Result};
pub use types::*;
