use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use shared_models::{Encounter, EncounterPatch, Party};

#[derive(Error, Debug)]
pub enum EncounterStoreError {
    #[error("Encounter not found: {0}")]
    NotFound(String),

    #[error("Encounter already exists: {0}")]
    AlreadyExists(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Stored encounter {encounter_id} is unreadable: {message}")]
    Corrupt { encounter_id: String, message: String },
}

impl From<redis::RedisError> for EncounterStoreError {
    fn from(err: redis::RedisError) -> Self {
        EncounterStoreError::Backend(err.to_string())
    }
}

impl From<deadpool_redis::PoolError> for EncounterStoreError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        EncounterStoreError::Backend(format!("Connection pool error: {}", err))
    }
}

/// Outcome of a conditional arrival write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalWrite {
    /// False when the party's timestamp was already set and nothing changed.
    pub applied: bool,
    /// The stored encounter immediately before this write.
    pub previous: Encounter,
    /// The stored encounter as of this write.
    pub encounter: Encounter,
}

/// Typed access to encounters in the external key-value store.
///
/// Implementations never cache: every call reads or writes current state.
#[async_trait]
pub trait EncounterStore: Send + Sync {
    async fn load(&self, encounter_id: &str) -> Result<Encounter, EncounterStoreError>;

    /// Inserts a new encounter holding only its meeting url.
    async fn create(&self, encounter_id: &str, url: &str) -> Result<Encounter, EncounterStoreError>;

    /// Partial merge of the supplied fields into an existing encounter.
    /// Fields that are already set keep their stored value.
    async fn save(
        &self,
        encounter_id: &str,
        patch: &EncounterPatch,
    ) -> Result<Encounter, EncounterStoreError>;

    /// Sets `party`'s arrival time only if it is unset, as one atomic step.
    ///
    /// Among concurrent writers for the same encounter exactly one observes
    /// `applied == true` with both parties present in the returned encounter.
    async fn save_arrival(
        &self,
        encounter_id: &str,
        party: Party,
        at: DateTime<Utc>,
    ) -> Result<ArrivalWrite, EncounterStoreError>;
}
