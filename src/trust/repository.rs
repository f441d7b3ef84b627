//! Storage abstraction for per-entity trust records.

use crate::core::sync::KeyedSlots;
use crate::trust::record::EntityTrust;
use std::sync::{Arc, Mutex};

/// Repository of entity trust records.
///
/// Each entity lives behind its own mutex so that writers to different
/// entities never contend.
pub trait EntityRepository: Send + Sync {
    /// Existing record for `entity_id`.
    fn entity(&self, entity_id: &str) -> Option<Arc<Mutex<EntityTrust>>>;

    /// Record for `entity_id`, created empty when missing.
    fn entity_or_create(&self, entity_id: &str) -> Arc<Mutex<EntityTrust>>;

    /// Known entity identifiers, sorted.
    fn entity_ids(&self) -> Vec<String>;

    /// Clone of every record, ordered by identifier.
    fn snapshot(&self) -> Vec<EntityTrust>;
}

/// In-memory entity repository.
#[derive(Default)]
pub struct InMemoryEntityRepository {
    slots: KeyedSlots<EntityTrust>,
}

impl InMemoryEntityRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository holding `records`.
    pub fn from_records(records: Vec<EntityTrust>) -> Self {
        let repo = Self::new();
        for record in records {
            let id = record.entity_id.clone();
            repo.slots.insert_new(&id, record);
        }
        repo
    }
}

impl EntityRepository for InMemoryEntityRepository {
    fn entity(&self, entity_id: &str) -> Option<Arc<Mutex<EntityTrust>>> {
        self.slots.get(entity_id)
    }

    fn entity_or_create(&self, entity_id: &str) -> Arc<Mutex<EntityTrust>> {
        self.slots
            .get_or_insert_with(entity_id, || EntityTrust::new(entity_id))
    }

    fn entity_ids(&self) -> Vec<String> {
        self.slots.keys()
    }

    fn snapshot(&self) -> Vec<EntityTrust> {
        self.slots.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sync::lock;

    #[test]
    fn test_entity_or_create() {
        let repo = InMemoryEntityRepository::new();
        assert!(repo.entity("n1").is_none());
        let slot = repo.entity_or_create("n1");
        assert_eq!(lock(&slot).entity_id, "n1");
        assert!(repo.entity("n1").is_some());
        assert_eq!(repo.entity_ids(), vec!["n1".to_string()]);
    }

    #[test]
    fn test_from_records() {
        let repo = InMemoryEntityRepository::from_records(vec![
            EntityTrust::new("b"),
            EntityTrust::new("a"),
        ]);
        let ids: Vec<String> = repo.snapshot().into_iter().map(|e| e.entity_id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
