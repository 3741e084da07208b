use std::sync::Arc;

use shared_config::AppConfig;

pub const TEST_FHIR_ORIGIN: &str = "https://fhir.test.example.org/r4";

pub struct TestConfig {
    pub fhir_allowed_origins: Vec<String>,
    pub mllp_host: String,
    pub mllp_port: u16,
    pub ehr_writeback_enabled: bool,
    pub meeting_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            fhir_allowed_origins: vec![TEST_FHIR_ORIGIN.to_string()],
            mllp_host: "127.0.0.1".to_string(),
            mllp_port: 2575,
            ehr_writeback_enabled: true,
            meeting_base_url: "https://meet.test.example.org".to_string(),
        }
    }
}

impl TestConfig {
    /// Trusts only `origin`, typically a wiremock server uri.
    pub fn trusting(origin: &str) -> Self {
        Self {
            fhir_allowed_origins: vec![origin.trim_end_matches('/').to_string()],
            ..Self::default()
        }
    }

    pub fn with_mllp_port(mut self, port: u16) -> Self {
        self.mllp_port = port;
        self
    }

    pub fn with_writeback(mut self, enabled: bool) -> Self {
        self.ehr_writeback_enabled = enabled;
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            fhir_allowed_origins: self.fhir_allowed_origins.clone(),
            fhir_client_id: "test-fhir-client".to_string(),
            mllp_host: self.mllp_host.clone(),
            mllp_port: self.mllp_port,
            mllp_connect_timeout_secs: 2,
            mllp_ack_timeout_secs: 2,
            ehr_writeback_enabled: self.ehr_writeback_enabled,
            debug_logging: false,
            redis_url: None,
            meeting_base_url: self.meeting_base_url.clone(),
            server_port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct MockFhirResponses;

impl MockFhirResponses {
    pub fn encounter_response(encounter_id: &str) -> serde_json::Value {
        serde_json::json!({
            "resourceType": "Encounter",
            "id": encounter_id,
            "status": "planned",
            "class": {
                "system": "http://terminology.hl7.org/CodeSystem/v3-ActCode",
                "code": "VR",
                "display": "virtual"
            }
        })
    }

    pub fn operation_outcome(code: &str) -> serde_json::Value {
        serde_json::json!({
            "resourceType": "OperationOutcome",
            "issue": [{ "severity": "error", "code": code }]
        })
    }
}
