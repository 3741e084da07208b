// libs/arrival-cell/src/state.rs
use std::sync::Arc;

use ehr_writeback_cell::{Hl7Sender, MllpClient};
use shared_config::AppConfig;
use shared_database::EncounterStore;

use crate::models::AuthorizationError;
use crate::services::{
    ArrivalNotificationService, EncounterAuthorizer, FhirAuthorizer, MeetingLinkProvider,
    MeetingLinkService, TemplateMeetingLinkProvider,
};

/// Shared handler state for the arrival routes.
pub struct ArrivalCellState {
    pub config: Arc<AppConfig>,
    pub notifications: ArrivalNotificationService,
    pub meetings: MeetingLinkService,
}

impl ArrivalCellState {
    /// Wires the production collaborators from configuration.
    pub fn new(
        config: Arc<AppConfig>,
        store: Arc<dyn EncounterStore>,
    ) -> Result<Self, AuthorizationError> {
        let authorizer = Arc::new(FhirAuthorizer::new(config.clone())?);
        let sender = Arc::new(MllpClient::new(&config));
        let links = Arc::new(TemplateMeetingLinkProvider::new(&config));

        Ok(Self::with_collaborators(config, store, authorizer, sender, links))
    }

    pub fn with_collaborators(
        config: Arc<AppConfig>,
        store: Arc<dyn EncounterStore>,
        authorizer: Arc<dyn EncounterAuthorizer>,
        sender: Arc<dyn Hl7Sender>,
        links: Arc<dyn MeetingLinkProvider>,
    ) -> Self {
        let notifications = ArrivalNotificationService::new(
            authorizer,
            store.clone(),
            sender,
            config.ehr_writeback_enabled,
        );
        let meetings = MeetingLinkService::new(store, links);

        Self {
            config,
            notifications,
            meetings,
        }
    }
}
