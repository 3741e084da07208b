#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arrival_cell::{ArrivalKind, ArrivalNotificationService, ArrivalRequest, FhirAuthorizer};
use ehr_writeback_cell::{Hl7Message, Hl7Sender, MllpAck, MllpError};
use shared_database::{EncounterStore, InMemoryEncounterStore};
use shared_utils::test_utils::{MockFhirResponses, TestConfig};

pub const MEETING_URL: &str = "https://meet.test.example.org/E1";

/// Records every message instead of opening a socket.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<Hl7Message>>,
    pub fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn messages(&self) -> Vec<Hl7Message> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Hl7Sender for RecordingSender {
    async fn send(&self, message: &Hl7Message) -> Result<MllpAck, MllpError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(MllpError::Connect {
                target: "127.0.0.1:1".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(MllpAck { raw: b"ACK".to_vec() })
    }
}

/// Mounts a FHIR server that authorizes every Encounter read.
pub async fn permissive_fhir_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/Encounter/[^/]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockFhirResponses::encounter_response("E1")))
        .mount(&server)
        .await;
    server
}

pub struct Harness {
    pub fhir: MockServer,
    pub store: Arc<InMemoryEncounterStore>,
    pub sender: Arc<RecordingSender>,
    pub service: Arc<ArrivalNotificationService>,
}

impl Harness {
    pub async fn new(writeback_enabled: bool) -> Self {
        Self::with_sender(writeback_enabled, RecordingSender::default()).await
    }

    pub async fn with_sender(writeback_enabled: bool, sender: RecordingSender) -> Self {
        Self::with_fhir(permissive_fhir_server().await, writeback_enabled, sender).await
    }

    pub async fn with_fhir(fhir: MockServer, writeback_enabled: bool, sender: RecordingSender) -> Self {
        let config = TestConfig::trusting(&fhir.uri())
            .with_writeback(writeback_enabled)
            .to_arc();

        let store = Arc::new(InMemoryEncounterStore::new());
        store.create("E1", MEETING_URL).await.unwrap();

        let sender = Arc::new(sender);
        let service = Arc::new(ArrivalNotificationService::new(
            Arc::new(FhirAuthorizer::new(config).unwrap()),
            store.clone(),
            sender.clone(),
            writeback_enabled,
        ));

        Self {
            fhir,
            store,
            sender,
            service,
        }
    }

    pub fn request(&self, kind: ArrivalKind, encounter_id: &str) -> ArrivalRequest {
        arrival_request(&self.fhir.uri(), kind, encounter_id)
    }
}

pub fn arrival_request(fhir_url: &str, kind: ArrivalKind, encounter_id: &str) -> ArrivalRequest {
    ArrivalRequest {
        fhir_url: Some(fhir_url.to_string()),
        fhir_access_token: Some("token-1".to_string()),
        event_type: Some(kind.to_string()),
        encounter_id: Some(encounter_id.to_string()),
        patient_id: Some("P1".to_string()),
        patient_name: Some("Jane Doe".to_string()),
    }
}
