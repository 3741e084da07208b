// libs/arrival-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ehr_writeback_cell::MllpError;
use shared_database::EncounterStoreError;
use shared_models::{Encounter, Party, Presence};

// ==============================================================================
// ARRIVAL EVENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArrivalKind {
    #[serde(rename = "patient_arrived")]
    PatientArrived,
    #[serde(rename = "practitioner_arrived")]
    PractitionerArrived,
}

impl ArrivalKind {
    pub fn party(&self) -> Party {
        match self {
            ArrivalKind::PatientArrived => Party::Patient,
            ArrivalKind::PractitionerArrived => Party::Practitioner,
        }
    }
}

impl FromStr for ArrivalKind {
    type Err = ArrivalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient_arrived" => Ok(ArrivalKind::PatientArrived),
            "practitioner_arrived" => Ok(ArrivalKind::PractitionerArrived),
            other => Err(ArrivalError::Validation(format!(
                "type must be patient_arrived or practitioner_arrived, got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ArrivalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrivalKind::PatientArrived => write!(f, "patient_arrived"),
            ArrivalKind::PractitionerArrived => write!(f, "practitioner_arrived"),
        }
    }
}

/// FHIR origin and bearer token presented with an arrival event.
#[derive(Clone, PartialEq, Eq)]
pub struct FhirCredential {
    pub base_url: String,
    pub access_token: String,
}

impl fmt::Debug for FhirCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FhirCredential")
            .field("base_url", &self.base_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Inbound arrival report as received on the wire. Every field is optional
/// here so that missing values surface as validation errors.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalRequest {
    pub fhir_url: Option<String>,
    pub fhir_access_token: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub encounter_id: Option<String>,
    pub patient_id: Option<String>,
    pub patient_name: Option<String>,
}

/// A validated arrival event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalEvent {
    pub kind: ArrivalKind,
    pub encounter_id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub credential: FhirCredential,
}

impl ArrivalRequest {
    pub fn validate(self) -> Result<ArrivalEvent, ArrivalError> {
        let fhir_url = required(self.fhir_url, "fhirUrl")?;
        let access_token = required(self.fhir_access_token, "fhirAccessToken")?;
        let kind = required(self.event_type, "type")?.parse::<ArrivalKind>()?;

        Ok(ArrivalEvent {
            kind,
            encounter_id: required(self.encounter_id, "encounterId")?,
            patient_id: required(self.patient_id, "patientId")?,
            patient_name: required(self.patient_name, "patientName")?,
            credential: FhirCredential {
                base_url: fhir_url,
                access_token,
            },
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ArrivalError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ArrivalError::Validation(format!("{} is required", field))),
    }
}

// ==============================================================================
// STATE MACHINE & OUTCOME MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    Applied,
    AlreadyArrived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// The EHR acknowledged the HL7 message.
    Sent,
    /// Only one party has arrived so far.
    PairIncomplete,
    /// Both parties arrived but EHR writeback is switched off.
    WritebackDisabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrivalOutcome {
    Applied {
        encounter: Encounter,
        notification: NotificationStatus,
    },
    /// The party had already arrived; nothing was written.
    DuplicateAccepted { encounter: Encounter },
}

impl ArrivalOutcome {
    pub fn encounter(&self) -> &Encounter {
        match self {
            ArrivalOutcome::Applied { encounter, .. } => encounter,
            ArrivalOutcome::DuplicateAccepted { encounter } => encounter,
        }
    }

    pub fn ehr_notified(&self) -> bool {
        matches!(
            self,
            ArrivalOutcome::Applied {
                notification: NotificationStatus::Sent,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ArrivalResponse {
    pub outcome: &'static str,
    pub ehr_notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationStatus>,
    pub presence: Presence,
    pub encounter: Encounter,
}

impl From<ArrivalOutcome> for ArrivalResponse {
    fn from(outcome: ArrivalOutcome) -> Self {
        let ehr_notified = outcome.ehr_notified();
        match outcome {
            ArrivalOutcome::Applied {
                encounter,
                notification,
            } => Self {
                outcome: "applied",
                ehr_notified,
                notification: Some(notification),
                presence: encounter.presence(),
                encounter,
            },
            ArrivalOutcome::DuplicateAccepted { encounter } => Self {
                outcome: "duplicate",
                ehr_notified,
                notification: None,
                presence: encounter.presence(),
                encounter,
            },
        }
    }
}

// ==============================================================================
// MEETING LINK MODELS
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHangoutRequest {
    pub encounter_id: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Error, Debug)]
pub enum AuthorizationError {
    #[error("FHIR origin is not trusted: {0}")]
    UntrustedOrigin(String),

    #[error("FHIR server denied access to encounter {encounter_id}: {reason}")]
    Denied { encounter_id: String, reason: String },

    #[error("FHIR server unreachable: {0}")]
    Network(String),
}

#[derive(Error, Debug)]
pub enum ArrivalError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Authorization check failed: {0}")]
    AuthorizationUnavailable(String),

    #[error("Encounter not found: {0}")]
    NotFound(String),

    #[error("Encounter store error: {0}")]
    Store(String),

    /// The arrival was persisted but the EHR notification failed.
    #[error("Encounter {encounter_id} updated but EHR notification failed: {source}")]
    Transport {
        encounter_id: String,
        encounter: Encounter,
        #[source]
        source: MllpError,
    },
}

impl From<EncounterStoreError> for ArrivalError {
    fn from(err: EncounterStoreError) -> Self {
        match err {
            EncounterStoreError::NotFound(id) => ArrivalError::NotFound(id),
            other => ArrivalError::Store(other.to_string()),
        }
    }
}

impl From<AuthorizationError> for ArrivalError {
    fn from(err: AuthorizationError) -> Self {
        match err {
            AuthorizationError::Network(message) => ArrivalError::AuthorizationUnavailable(message),
            other => ArrivalError::Unauthorized(other.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum MeetingLinkError {
    #[error("Meeting links are not configured")]
    NotConfigured,

    #[error("Meeting link provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Store(#[from] EncounterStoreError),
}
