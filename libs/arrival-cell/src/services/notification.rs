// libs/arrival-cell/src/services/notification.rs
use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::{debug, error, info, warn};

use ehr_writeback_cell::{build_arrival_message, Hl7Sender};
use shared_database::EncounterStore;

use crate::models::{
    ArrivalError, ArrivalEvent, ArrivalOutcome, ArrivalRequest, NotificationStatus,
    TransitionResult,
};
use crate::services::authorizer::EncounterAuthorizer;
use crate::services::state_machine::ArrivalStateMachine;

/// Runs one arrival event through authorize -> load -> transition -> persist
/// -> notify, strictly in that order.
pub struct ArrivalNotificationService {
    authorizer: Arc<dyn EncounterAuthorizer>,
    store: Arc<dyn EncounterStore>,
    sender: Arc<dyn Hl7Sender>,
    state_machine: ArrivalStateMachine,
    writeback_enabled: bool,
}

impl ArrivalNotificationService {
    pub fn new(
        authorizer: Arc<dyn EncounterAuthorizer>,
        store: Arc<dyn EncounterStore>,
        sender: Arc<dyn Hl7Sender>,
        writeback_enabled: bool,
    ) -> Self {
        Self {
            authorizer,
            store,
            sender,
            state_machine: ArrivalStateMachine::new(),
            writeback_enabled,
        }
    }

    pub fn writeback_enabled(&self) -> bool {
        self.writeback_enabled
    }

    pub async fn handle_request(&self, request: ArrivalRequest) -> Result<ArrivalOutcome, ArrivalError> {
        let event = request.validate().map_err(|e| {
            warn!("Rejected arrival event: {}", e);
            e
        })?;
        self.handle_event(event).await
    }

    pub async fn handle_event(&self, event: ArrivalEvent) -> Result<ArrivalOutcome, ArrivalError> {
        let encounter_id = event.encounter_id.as_str();
        let party = event.kind.party();
        info!("Processing {} for encounter {}", event.kind, encounter_id);

        self.authorizer
            .authorize(&event.credential, encounter_id)
            .await?;

        let current = self.store.load(encounter_id).await.map_err(|e| {
            warn!("Could not load encounter {}: {}", encounter_id, e);
            ArrivalError::from(e)
        })?;

        let now = Utc::now();
        let (_, transition) = self.state_machine.apply_arrival(&current, event.kind, now);
        if transition == TransitionResult::AlreadyArrived {
            info!("Duplicate {} for encounter {} accepted", event.kind, encounter_id);
            return Ok(ArrivalOutcome::DuplicateAccepted { encounter: current });
        }

        let write = self.store.save_arrival(encounter_id, party, now).await?;
        if !write.applied {
            // Another request set this party's arrival between our load and write
            info!("Concurrent {} for encounter {} already persisted", event.kind, encounter_id);
            return Ok(ArrivalOutcome::DuplicateAccepted { encounter: write.encounter });
        }

        let completes_pair = self.state_machine.completes_pair(&write.previous, &write.encounter);
        let stored = write.encounter;
        if !completes_pair {
            debug!("Encounter {} now {:?}, waiting for other party", encounter_id, stored.presence());
            return Ok(ArrivalOutcome::Applied {
                encounter: stored,
                notification: NotificationStatus::PairIncomplete,
            });
        }

        if !self.writeback_enabled {
            info!("Both parties arrived for encounter {}; EHR writeback disabled", encounter_id);
            return Ok(ArrivalOutcome::Applied {
                encounter: stored,
                notification: NotificationStatus::WritebackDisabled,
            });
        }

        info!("Both parties arrived for encounter {}; notifying EHR", encounter_id);
        let message = build_arrival_message(
            encounter_id,
            &event.patient_id,
            &event.patient_name,
            &now.with_timezone(&Local),
        );

        match self.sender.send(&message).await {
            Ok(_) => Ok(ArrivalOutcome::Applied {
                encounter: stored,
                notification: NotificationStatus::Sent,
            }),
            Err(e) => {
                error!("EHR notification for encounter {} failed after commit: {}", encounter_id, e);
                Err(ArrivalError::Transport {
                    encounter_id: encounter_id.to_string(),
                    encounter: stored,
                    source: e,
                })
            }
        }
    }
}
