// libs/arrival-cell/src/services/state_machine.rs
use chrono::{DateTime, Utc};
use tracing::debug;

use shared_models::{Encounter, EncounterPatch};

use crate::models::{ArrivalKind, TransitionResult};

/// Per-party arrival transitions: Unset -> Set, never back.
///
/// Patient and practitioner compose into Neither / PatientOnly /
/// PractitionerOnly / Both, and Both is terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrivalStateMachine;

impl ArrivalStateMachine {
    pub fn new() -> Self {
        Self
    }

    /// Applies one arrival to a copy of `encounter`.
    pub fn apply_arrival(
        &self,
        encounter: &Encounter,
        kind: ArrivalKind,
        now: DateTime<Utc>,
    ) -> (Encounter, TransitionResult) {
        let party = kind.party();

        if encounter.has_arrived(party) {
            debug!("{} already arrived, leaving encounter unchanged", party);
            return (encounter.clone(), TransitionResult::AlreadyArrived);
        }

        let mut updated = encounter.clone();
        updated.merge(&EncounterPatch::arrival(party, now));
        debug!("{} arrival applied: {:?} -> {:?}", party, encounter.presence(), updated.presence());

        (updated, TransitionResult::Applied)
    }

    /// True only for the transition that moved the encounter into Both.
    pub fn completes_pair(&self, before: &Encounter, after: &Encounter) -> bool {
        !before.both_arrived() && after.both_arrived()
    }
}
