// libs/arrival-cell/src/services/mod.rs

pub mod authorizer;
pub mod meeting;
pub mod notification;
pub mod state_machine;

pub use authorizer::{EncounterAuthorizer, FhirAuthorizer};
pub use meeting::{MeetingLinkProvider, MeetingLinkService, TemplateMeetingLinkProvider};
pub use notification::ArrivalNotificationService;
pub use state_machine::ArrivalStateMachine;
