use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use shared_models::{Encounter, EncounterPatch, Party};

use crate::encounter_store::{ArrivalWrite, EncounterStore, EncounterStoreError};

/// Process-local encounter store for development runs and tests.
///
/// Conditional writes hold the write lock across check and set, which gives
/// the same per-key atomicity as the Redis scripts.
#[derive(Default)]
pub struct InMemoryEncounterStore {
    encounters: RwLock<HashMap<String, Encounter>>,
}

impl InMemoryEncounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.encounters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.encounters.read().await.is_empty()
    }
}

#[async_trait]
impl EncounterStore for InMemoryEncounterStore {
    async fn load(&self, encounter_id: &str) -> Result<Encounter, EncounterStoreError> {
        self.encounters
            .read()
            .await
            .get(encounter_id)
            .cloned()
            .ok_or_else(|| EncounterStoreError::NotFound(encounter_id.to_string()))
    }

    async fn create(&self, encounter_id: &str, url: &str) -> Result<Encounter, EncounterStoreError> {
        let mut encounters = self.encounters.write().await;
        if encounters.contains_key(encounter_id) {
            return Err(EncounterStoreError::AlreadyExists(encounter_id.to_string()));
        }

        let encounter = Encounter::new(url);
        encounters.insert(encounter_id.to_string(), encounter.clone());
        Ok(encounter)
    }

    async fn save(
        &self,
        encounter_id: &str,
        patch: &EncounterPatch,
    ) -> Result<Encounter, EncounterStoreError> {
        let mut encounters = self.encounters.write().await;
        let encounter = encounters
            .get_mut(encounter_id)
            .ok_or_else(|| EncounterStoreError::NotFound(encounter_id.to_string()))?;

        encounter.merge(patch);
        Ok(encounter.clone())
    }

    async fn save_arrival(
        &self,
        encounter_id: &str,
        party: Party,
        at: DateTime<Utc>,
    ) -> Result<ArrivalWrite, EncounterStoreError> {
        let mut encounters = self.encounters.write().await;
        let encounter = encounters
            .get_mut(encounter_id)
            .ok_or_else(|| EncounterStoreError::NotFound(encounter_id.to_string()))?;

        let previous = encounter.clone();
        let applied = !encounter.has_arrived(party);
        if applied {
            encounter.merge(&EncounterPatch::arrival(party, at));
        }
        debug!("Conditional {} arrival write on encounter {}: applied={}", party, encounter_id, applied);

        Ok(ArrivalWrite {
            applied,
            previous,
            encounter: encounter.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).unwrap()
    }

    #[tokio::test]
    async fn test_load_missing_encounter() {
        let store = InMemoryEncounterStore::new();
        assert_matches!(store.load("E404").await, Err(EncounterStoreError::NotFound(id)) if id == "E404");
    }

    #[tokio::test]
    async fn test_create_is_insert_only() {
        let store = InMemoryEncounterStore::new();
        store.create("E1", "https://meet.example.com/one").await.unwrap();

        assert_matches!(
            store.create("E1", "https://meet.example.com/two").await,
            Err(EncounterStoreError::AlreadyExists(_))
        );
        assert_eq!(store.load("E1").await.unwrap().url, "https://meet.example.com/one");
    }

    #[tokio::test]
    async fn test_save_merges_only_supplied_fields() {
        let store = InMemoryEncounterStore::new();
        store.create("E1", "https://meet.example.com/one").await.unwrap();

        let saved = store
            .save("E1", &EncounterPatch::arrival(Party::Practitioner, at(5)))
            .await
            .unwrap();

        assert_eq!(saved.url, "https://meet.example.com/one");
        assert_eq!(saved.practitioner_arrive_time, Some(at(5)));
        assert_eq!(store.load("E1").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_save_never_overwrites_set_fields() {
        let store = InMemoryEncounterStore::new();
        store.create("E1", "https://meet.example.com/one").await.unwrap();
        store.save_arrival("E1", Party::Patient, at(0)).await.unwrap();

        store
            .save("E1", &EncounterPatch::arrival(Party::Patient, at(30)))
            .await
            .unwrap();
        let saved = store
            .save("E1", &EncounterPatch::url("https://elsewhere.example.com/x"))
            .await
            .unwrap();

        assert_eq!(saved.url, "https://meet.example.com/one");
        assert_eq!(saved.patient_arrive_time, Some(at(0)));
        assert_eq!(store.load("E1").await.unwrap(), saved);
    }

    #[tokio::test]
    async fn test_save_requires_existing_encounter() {
        let store = InMemoryEncounterStore::new();
        assert_matches!(
            store.save("E404", &EncounterPatch::url("u")).await,
            Err(EncounterStoreError::NotFound(_))
        );
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_arrival_keeps_first_timestamp() {
        let store = InMemoryEncounterStore::new();
        store.create("E1", "u").await.unwrap();

        let first = store.save_arrival("E1", Party::Patient, at(1)).await.unwrap();
        let second = store.save_arrival("E1", Party::Patient, at(2)).await.unwrap();

        assert!(first.applied);
        assert_eq!(first.previous.patient_arrive_time, None);
        assert!(!second.applied);
        assert_eq!(second.previous, second.encounter);
        assert_eq!(second.encounter.patient_arrive_time, Some(at(1)));
    }

    #[tokio::test]
    async fn test_concurrent_same_party_arrivals_apply_once() {
        let store = Arc::new(InMemoryEncounterStore::new());
        store.create("E1", "u").await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.save_arrival("E1", Party::Patient, at(i)).await })
            })
            .collect();

        let mut applied = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().applied {
                applied += 1;
            }
        }
        assert_eq!(applied, 1);
    }

    #[tokio::test]
    async fn test_concurrent_opposite_parties_complete_pair_once() {
        let store = Arc::new(InMemoryEncounterStore::new());
        store.create("E1", "u").await.unwrap();

        let patient = {
            let store = store.clone();
            tokio::spawn(async move { store.save_arrival("E1", Party::Patient, at(1)).await })
        };
        let practitioner = {
            let store = store.clone();
            tokio::spawn(async move { store.save_arrival("E1", Party::Practitioner, at(2)).await })
        };

        let writes = [patient.await.unwrap().unwrap(), practitioner.await.unwrap().unwrap()];
        let completing = writes
            .iter()
            .filter(|w| w.applied && w.encounter.both_arrived())
            .count();

        assert_eq!(completing, 1);
    }
}
