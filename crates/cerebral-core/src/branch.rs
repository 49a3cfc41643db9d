//! The static table mapping logical memory branches onto backend domains.
//!
//! Adding a branch means adding a row to [`BRANCHES`]; nothing else in the
//! workspace enumerates branch names.

use serde::Serialize;

use crate::error::{CerebralError, Result};

/// One row of the branch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BranchDescriptor {
    /// Logical name shown to users, e.g. "Episodic".
    pub name: &'static str,
    /// Backend region identifier the branch's memories live in.
    pub domain: &'static str,
    /// Backend record-type label written on memories created in this branch.
    pub kind: &'static str,
    pub description: &'static str,
}

pub const BRANCHES: &[BranchDescriptor] = &[
    BranchDescriptor {
        name: "ShortTerm",
        domain: "FRONTAL_LOBE",
        kind: "session",
        description: "Immediate tasks and in-flight processing",
    },
    BranchDescriptor {
        name: "Episodic",
        domain: "TEMPORAL_LOBE",
        kind: "episodic",
        description: "Experiences and events kept for the long term",
    },
    BranchDescriptor {
        name: "Working",
        domain: "PARIETAL_LOBE",
        kind: "working",
        description: "Scratch context for the task at hand",
    },
    BranchDescriptor {
        name: "Personal",
        domain: "OCCIPITAL_LOBE",
        kind: "user",
        description: "Facts and preferences about the user",
    },
    BranchDescriptor {
        name: "System",
        domain: "CEREBELLUM",
        kind: "agent",
        description: "Knowledge recorded by agents",
    },
];

/// Lookup facade over [`BRANCHES`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchRegistry;

impl BranchRegistry {
    /// Resolve a branch by its logical name (exact match).
    pub fn resolve(name: &str) -> Result<&'static BranchDescriptor> {
        BRANCHES
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| CerebralError::UnknownBranch(name.to_string()))
    }

    /// Reverse lookup from a backend domain identifier.
    pub fn by_domain(domain: &str) -> Option<&'static BranchDescriptor> {
        BRANCHES.iter().find(|b| b.domain.eq_ignore_ascii_case(domain))
    }

    pub fn all() -> &'static [BranchDescriptor] {
        BRANCHES
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        BRANCHES.iter().map(|b| b.name)
    }
}
