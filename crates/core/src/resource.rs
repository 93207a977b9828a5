//! Exclusive resources and requirement sets.

use crate::error::ConstructionError;
use crate::id::{ResourceId, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An exclusive-use handle that tasks declare as a requirement.
///
/// A resource carries at most one default task, which the scheduler runs
/// whenever nothing else holds the resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    /// Name used in diagnostics
    pub name: String,

    default_task: Option<TaskId>,
}

impl Resource {
    /// Create a resource with no default task.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_task: None,
        }
    }

    /// Current default task, if any.
    pub fn default_task(&self) -> Option<TaskId> {
        self.default_task
    }

    /// Set or clear the default task.
    ///
    /// `None` always succeeds and returns the cleared task. Setting a task
    /// while one is already present fails; clear it first to re-arm.
    pub fn set_default_task(
        &mut self,
        id: ResourceId,
        task: Option<TaskId>,
    ) -> Result<Option<TaskId>, ConstructionError> {
        match task {
            None => Ok(self.default_task.take()),
            Some(_) if self.default_task.is_some() => {
                Err(ConstructionError::DefaultTaskAlreadySet { resource: id })
            }
            Some(task) => {
                self.default_task = Some(task);
                Ok(None)
            }
        }
    }
}

/// The static set of resources a task requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceSet(BTreeSet<ResourceId>);

impl ResourceSet {
    /// The empty set.
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// A set holding one resource.
    pub fn single(id: ResourceId) -> Self {
        Self(BTreeSet::from([id]))
    }

    /// Add a resource.
    pub fn insert(&mut self, id: ResourceId) -> bool {
        self.0.insert(id)
    }

    /// Whether the set contains `id`.
    pub fn contains(&self, id: ResourceId) -> bool {
        self.0.contains(&id)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = ResourceId> + '_ {
        self.0.iter().copied()
    }

    /// Add every resource of `other`.
    pub fn extend_from(&mut self, other: &ResourceSet) {
        self.0.extend(other.0.iter().copied());
    }

    /// Union of two sets.
    pub fn union(&self, other: &ResourceSet) -> ResourceSet {
        Self(self.0.union(&other.0).copied().collect())
    }

    /// Lowest resource present in both sets.
    pub fn first_shared(&self, other: &ResourceSet) -> Option<ResourceId> {
        self.0.intersection(&other.0).next().copied()
    }
}

impl FromIterator<ResourceId> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ResourceSet {
    type Item = &'a ResourceId;
    type IntoIter = std::collections::btree_set::Iter<'a, ResourceId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<ResourceId> for ResourceSet {
    fn from(id: ResourceId) -> Self {
        Self::single(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(i: usize) -> ResourceId {
        ResourceId::from_index(i)
    }

    #[test]
    fn test_default_task_set_once() {
        let mut resource = Resource::new("arm");
        let id = rid(0);

        assert_eq!(resource.set_default_task(id, Some(TaskId::from_index(1))), Ok(None));
        assert_eq!(
            resource.set_default_task(id, Some(TaskId::from_index(2))),
            Err(ConstructionError::DefaultTaskAlreadySet { resource: id })
        );
        assert_eq!(resource.default_task(), Some(TaskId::from_index(1)));
    }

    #[test]
    fn test_default_task_clear_and_rearm() {
        let mut resource = Resource::new("arm");
        let id = rid(0);

        assert_eq!(resource.set_default_task(id, None), Ok(None));
        resource.set_default_task(id, Some(TaskId::from_index(1))).unwrap();
        assert_eq!(resource.set_default_task(id, None), Ok(Some(TaskId::from_index(1))));
        assert_eq!(resource.default_task(), None);
        assert!(resource.set_default_task(id, Some(TaskId::from_index(4))).is_ok());
    }

    #[test]
    fn test_resource_set_operations() {
        let a: ResourceSet = [rid(0), rid(1)].into_iter().collect();
        let b: ResourceSet = [rid(1), rid(2)].into_iter().collect();

        assert_eq!(a.first_shared(&b), Some(rid(1)));
        assert_eq!(a.union(&b).len(), 3);
        assert!(ResourceSet::new().first_shared(&a).is_none());
        assert!(ResourceSet::single(rid(5)).contains(rid(5)));
    }
}
