// libs/arrival-cell/src/lib.rs
//! # Arrival Cell
//!
//! Accepts "patient arrived" / "practitioner arrived" reports for a virtual
//! visit, records them on the encounter, and notifies the EHR once both
//! parties are present.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------------------+
//! |                   Arrival Cell                      |
//! +-----------------------------------------------------+
//! |  handlers.rs    |  HTTP endpoint handlers           |
//! |  router.rs      |  Route definitions                |
//! |  models.rs      |  Events, outcomes, errors         |
//! |  state.rs       |  Collaborator wiring              |
//! |  services/      |  Business logic layer             |
//! |    authorizer.rs|  FHIR allow-list + read check     |
//! |    state_machine.rs| Per-party arrival transitions  |
//! |    notification.rs| Arrival pipeline orchestrator   |
//! |    meeting.rs   |  Meeting link / encounter creation|
//! +-----------------------------------------------------+
//! ```
//!
//! ## API Endpoints
//!
//! - `POST /arrivals` - Report an arrival event
//! - `GET /hangouts/{encounter_id}` - Meeting url of an encounter
//! - `POST /hangouts` - Get or create the meeting url of an encounter
//! - `GET /settings` - Public client settings
//! - `GET /health` - Health check
//!
//! ## Pipeline
//!
//! Each event is authorized against its FHIR origin before the encounter is
//! read. The arrival is then written with a conditional store write, so among
//! any number of concurrent or repeated events exactly one completes the
//! pair, and only that one sends the HL7 message. A failed MLLP send is
//! reported as an error even though the arrival was already persisted.
//!
//! ## Concurrency
//!
//! Correctness relies on `EncounterStore::save_arrival` being atomic per
//! encounter. Both shipped stores guarantee this.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use models::{
    ArrivalError, ArrivalEvent, ArrivalKind, ArrivalOutcome, ArrivalRequest, ArrivalResponse,
    AuthorizationError, FhirCredential, NotificationStatus, TransitionResult,
};

pub use services::{
    ArrivalNotificationService, ArrivalStateMachine, EncounterAuthorizer, FhirAuthorizer,
    MeetingLinkProvider, MeetingLinkService, TemplateMeetingLinkProvider,
};

pub use router::arrival_routes;
pub use state::ArrivalCellState;
