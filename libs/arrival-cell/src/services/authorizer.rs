// libs/arrival-cell/src/services/authorizer.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::models::{AuthorizationError, FhirCredential};

const FHIR_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Decides whether a caller may report arrivals for an encounter.
#[async_trait]
pub trait EncounterAuthorizer: Send + Sync {
    async fn authorize(
        &self,
        credential: &FhirCredential,
        encounter_id: &str,
    ) -> Result<(), AuthorizationError>;
}

/// Authorizes by reading `{fhirUrl}/Encounter/{id}` with the caller's token.
///
/// Only origins in the configured allow-list are ever contacted.
pub struct FhirAuthorizer {
    client: Client,
    config: Arc<AppConfig>,
}

impl FhirAuthorizer {
    pub fn new(config: Arc<AppConfig>) -> Result<Self, AuthorizationError> {
        let client = Client::builder()
            .timeout(FHIR_REQUEST_TIMEOUT)
            // A redirect could lead outside the allow-list
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthorizationError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn encounter_url(base_url: &str, encounter_id: &str) -> Result<Url, AuthorizationError> {
        let invalid = || AuthorizationError::UntrustedOrigin(base_url.to_string());

        let mut url = Url::parse(base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("Encounter")
            .push(encounter_id);
        Ok(url)
    }
}

#[async_trait]
impl EncounterAuthorizer for FhirAuthorizer {
    async fn authorize(
        &self,
        credential: &FhirCredential,
        encounter_id: &str,
    ) -> Result<(), AuthorizationError> {
        if !self.config.is_trusted_fhir_origin(&credential.base_url) {
            warn!("Rejected arrival from untrusted FHIR origin {}", credential.base_url);
            return Err(AuthorizationError::UntrustedOrigin(credential.base_url.clone()));
        }

        let url = Self::encounter_url(&credential.base_url, encounter_id)?;
        debug!("Checking FHIR authorization at {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&credential.access_token)
            .send()
            .await
            .map_err(|e| {
                warn!("FHIR authorization request for encounter {} failed: {}", encounter_id, e);
                AuthorizationError::Network(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("FHIR server refused encounter {}: HTTP {}", encounter_id, status);
            return Err(AuthorizationError::Denied {
                encounter_id: encounter_id.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        info!("FHIR authorization granted for encounter {}", encounter_id);
        Ok(())
    }
}
