pub mod encounter_store;
pub mod memory_store;
pub mod redis_store;

pub use encounter_store::{ArrivalWrite, EncounterStore, EncounterStoreError};
pub use memory_store::InMemoryEncounterStore;
pub use redis_store::RedisEncounterStore;
