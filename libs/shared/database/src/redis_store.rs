use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::{AsyncCommands, Script};
use tracing::{debug, info};

use shared_models::{Encounter, EncounterPatch, Party};

use crate::encounter_store::{ArrivalWrite, EncounterStore, EncounterStoreError};

const URL_FIELD: &str = "url";
const KEY_PREFIX: &str = "encounter";

// Returns nil for a missing key, otherwise the full hash after the merge.
// Fields that already hold a non-empty value are left as they are.
const MERGE_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return nil
end
for i = 1, #ARGV, 2 do
    local current = redis.call('HGET', KEYS[1], ARGV[i])
    if not current or current == '' then
        redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 1])
    end
end
return redis.call('HGETALL', KEYS[1])
";

// Returns nil for a missing key, otherwise {applied, hash before, hash after}.
const ARRIVAL_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
    return nil
end
local before = redis.call('HGETALL', KEYS[1])
local applied = redis.call('HSETNX', KEYS[1], ARGV[1], ARGV[2])
return {applied, before, redis.call('HGETALL', KEYS[1])}
";

/// Encounter store backed by one Redis hash per encounter.
pub struct RedisEncounterStore {
    pool: Pool,
    merge_script: Script,
    arrival_script: Script,
}

impl RedisEncounterStore {
    pub async fn new(redis_url: &str) -> Result<Self, EncounterStoreError> {
        let cfg = Config::from_url(redis_url);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| EncounterStoreError::Backend(format!("Failed to create Redis pool: {}", e)))?;

        // Test connection
        let mut conn = pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis encounter store initialized");

        Ok(Self {
            pool,
            merge_script: Script::new(MERGE_SCRIPT),
            arrival_script: Script::new(ARRIVAL_SCRIPT),
        })
    }

    fn key(&self, encounter_id: &str) -> String {
        format!("{}:{}", KEY_PREFIX, encounter_id)
    }

    async fn connection(&self) -> Result<Connection, EncounterStoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl EncounterStore for RedisEncounterStore {
    async fn load(&self, encounter_id: &str) -> Result<Encounter, EncounterStoreError> {
        let mut conn = self.connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(self.key(encounter_id)).await?;

        if fields.is_empty() {
            return Err(EncounterStoreError::NotFound(encounter_id.to_string()));
        }

        decode_encounter(encounter_id, &fields)
    }

    async fn create(&self, encounter_id: &str, url: &str) -> Result<Encounter, EncounterStoreError> {
        let mut conn = self.connection().await?;
        let inserted: bool = conn.hset_nx(self.key(encounter_id), URL_FIELD, url).await?;

        if !inserted {
            return Err(EncounterStoreError::AlreadyExists(encounter_id.to_string()));
        }

        info!("Created encounter {}", encounter_id);
        Ok(Encounter::new(url))
    }

    async fn save(
        &self,
        encounter_id: &str,
        patch: &EncounterPatch,
    ) -> Result<Encounter, EncounterStoreError> {
        let mut conn = self.connection().await?;

        let mut invocation = self.merge_script.key(self.key(encounter_id));
        for (field, value) in encode_patch(patch) {
            invocation.arg(field).arg(value);
        }

        let stored: Option<HashMap<String, String>> = invocation.invoke_async(&mut conn).await?;
        let fields = stored.ok_or_else(|| EncounterStoreError::NotFound(encounter_id.to_string()))?;

        debug!("Merged {} field(s) into encounter {}", encode_patch(patch).len(), encounter_id);
        decode_encounter(encounter_id, &fields)
    }

    async fn save_arrival(
        &self,
        encounter_id: &str,
        party: Party,
        at: DateTime<Utc>,
    ) -> Result<ArrivalWrite, EncounterStoreError> {
        let mut conn = self.connection().await?;

        let stored: Option<(i64, HashMap<String, String>, HashMap<String, String>)> = self
            .arrival_script
            .key(self.key(encounter_id))
            .arg(party.field_name())
            .arg(at.to_rfc3339())
            .invoke_async(&mut conn)
            .await?;

        let (applied, before, after) =
            stored.ok_or_else(|| EncounterStoreError::NotFound(encounter_id.to_string()))?;

        debug!(
            "Conditional {} arrival write on encounter {}: applied={}",
            party,
            encounter_id,
            applied == 1
        );

        Ok(ArrivalWrite {
            applied: applied == 1,
            previous: decode_encounter(encounter_id, &before)?,
            encounter: decode_encounter(encounter_id, &after)?,
        })
    }
}

fn encode_patch(patch: &EncounterPatch) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    if let Some(url) = &patch.url {
        fields.push((URL_FIELD, url.clone()));
    }
    if let Some(at) = patch.patient_arrive_time {
        fields.push((Party::Patient.field_name(), at.to_rfc3339()));
    }
    if let Some(at) = patch.practitioner_arrive_time {
        fields.push((Party::Practitioner.field_name(), at.to_rfc3339()));
    }
    fields
}

fn decode_encounter(
    encounter_id: &str,
    fields: &HashMap<String, String>,
) -> Result<Encounter, EncounterStoreError> {
    let corrupt = |message: String| EncounterStoreError::Corrupt {
        encounter_id: encounter_id.to_string(),
        message,
    };

    let url = fields
        .get(URL_FIELD)
        .cloned()
        .ok_or_else(|| corrupt("missing url".to_string()))?;

    let timestamp = |party: Party| -> Result<Option<DateTime<Utc>>, EncounterStoreError> {
        fields
            .get(party.field_name())
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| corrupt(format!("invalid {}: {}", party.field_name(), e)))
            })
            .transpose()
    };

    Ok(Encounter {
        url,
        patient_arrive_time: timestamp(Party::Patient)?,
        practitioner_arrive_time: timestamp(Party::Practitioner)?,
    })
}
