// libs/arrival-cell/src/services/meeting.rs
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_database::{EncounterStore, EncounterStoreError};

use crate::models::MeetingLinkError;

/// Produces a meeting url for a new encounter.
#[async_trait]
pub trait MeetingLinkProvider: Send + Sync {
    async fn create_link(&self, encounter_id: &str) -> Result<String, MeetingLinkError>;
}

/// Derives `{MEETING_BASE_URL}/{encounter_id}`.
pub struct TemplateMeetingLinkProvider {
    base_url: String,
}

impl TemplateMeetingLinkProvider {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base_url: config.meeting_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MeetingLinkProvider for TemplateMeetingLinkProvider {
    async fn create_link(&self, encounter_id: &str) -> Result<String, MeetingLinkError> {
        if self.base_url.is_empty() {
            return Err(MeetingLinkError::NotConfigured);
        }
        Ok(format!("{}/{}", self.base_url, encounter_id))
    }
}

/// Owns encounter creation: the only place an Encounter comes into being.
pub struct MeetingLinkService {
    store: Arc<dyn EncounterStore>,
    provider: Arc<dyn MeetingLinkProvider>,
}

impl MeetingLinkService {
    pub fn new(store: Arc<dyn EncounterStore>, provider: Arc<dyn MeetingLinkProvider>) -> Self {
        Self { store, provider }
    }

    /// The stored meeting url, or `None` for an unknown encounter.
    pub async fn find_link(&self, encounter_id: &str) -> Result<Option<String>, MeetingLinkError> {
        match self.store.load(encounter_id).await {
            Ok(encounter) => Ok(Some(encounter.url)),
            Err(EncounterStoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the existing url, creating the encounter on first request.
    pub async fn get_or_create_link(&self, encounter_id: &str) -> Result<String, MeetingLinkError> {
        if let Some(url) = self.find_link(encounter_id).await? {
            return Ok(url);
        }

        let url = self.provider.create_link(encounter_id).await?;
        match self.store.create(encounter_id, &url).await {
            Ok(encounter) => {
                info!("Created meeting link for encounter {}", encounter_id);
                Ok(encounter.url)
            }
            Err(EncounterStoreError::AlreadyExists(_)) => {
                warn!("Encounter {} created concurrently, using stored link", encounter_id);
                Ok(self.store.load(encounter_id).await?.url)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use shared_database::InMemoryEncounterStore;

    fn provider(base_url: &str) -> Arc<TemplateMeetingLinkProvider> {
        Arc::new(TemplateMeetingLinkProvider {
            base_url: base_url.to_string(),
        })
    }

    #[tokio::test]
    async fn test_first_request_creates_encounter() {
        let store = Arc::new(InMemoryEncounterStore::new());
        let service = MeetingLinkService::new(store.clone(), provider("https://meet.example.com"));

        let url = service.get_or_create_link("E1").await.unwrap();

        assert_eq!(url, "https://meet.example.com/E1");
        let stored = store.load("E1").await.unwrap();
        assert_eq!(stored.url, url);
        assert!(stored.patient_arrive_time.is_none());
    }

    #[tokio::test]
    async fn test_existing_link_is_never_overwritten() {
        let store = Arc::new(InMemoryEncounterStore::new());
        store.create("E1", "https://old.example.com/E1").await.unwrap();
        let service = MeetingLinkService::new(store.clone(), provider("https://meet.example.com"));

        let url = service.get_or_create_link("E1").await.unwrap();
        assert_eq!(url, "https://old.example.com/E1");
    }

    #[tokio::test]
    async fn test_unknown_encounter_has_no_link() {
        let service = MeetingLinkService::new(
            Arc::new(InMemoryEncounterStore::new()),
            provider("https://meet.example.com"),
        );
        assert_eq!(service.find_link("E404").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unconfigured_provider_creates_nothing() {
        let store = Arc::new(InMemoryEncounterStore::new());
        let service = MeetingLinkService::new(store.clone(), provider(""));

        assert_matches!(
            service.get_or_create_link("E1").await,
            Err(MeetingLinkError::NotConfigured)
        );
        assert!(store.is_empty().await);
    }
}
