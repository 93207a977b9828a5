//! Arena handles for scheduler-owned entities.

use serde::{Deserialize, Serialize};

/// Handle of a task registered with a scheduler.
///
/// Handles are plain indices into the scheduler's task arena. They are only
/// meaningful for the scheduler that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(usize);

impl TaskId {
    /// Create a handle from an arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Arena index of this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Handle of a resource registered with a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(usize);

impl ResourceId {
    /// Create a handle from an arena index.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Arena index of this handle.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "resource#{}", self.0)
    }
}
