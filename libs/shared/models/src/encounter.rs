use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One scheduled telehealth visit, keyed by the EHR's encounter identifier.
///
/// `url` is written once when the meeting link is created. Each arrival
/// timestamp moves from unset to set at most once and is never overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_arrive_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practitioner_arrive_time: Option<DateTime<Utc>>,
}

impl Encounter {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            patient_arrive_time: None,
            practitioner_arrive_time: None,
        }
    }

    pub fn arrive_time(&self, party: Party) -> Option<DateTime<Utc>> {
        match party {
            Party::Patient => self.patient_arrive_time,
            Party::Practitioner => self.practitioner_arrive_time,
        }
    }

    pub fn has_arrived(&self, party: Party) -> bool {
        self.arrive_time(party).is_some()
    }

    /// True iff both parties have an arrival timestamp.
    pub fn both_arrived(&self) -> bool {
        self.patient_arrive_time.is_some() && self.practitioner_arrive_time.is_some()
    }

    pub fn presence(&self) -> Presence {
        match (self.patient_arrive_time, self.practitioner_arrive_time) {
            (None, None) => Presence::Neither,
            (Some(_), None) => Presence::PatientOnly,
            (None, Some(_)) => Presence::PractitionerOnly,
            (Some(_), Some(_)) => Presence::Both,
        }
    }

    /// Applies a partial update. Only unset fields are filled; `url` and the
    /// arrival timestamps are never overwritten once present.
    pub fn merge(&mut self, patch: &EncounterPatch) {
        if self.url.is_empty() {
            if let Some(url) = &patch.url {
                self.url = url.clone();
            }
        }
        if self.patient_arrive_time.is_none() {
            self.patient_arrive_time = patch.patient_arrive_time;
        }
        if self.practitioner_arrive_time.is_none() {
            self.practitioner_arrive_time = patch.practitioner_arrive_time;
        }
    }
}

/// The party reporting an arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Patient,
    Practitioner,
}

impl Party {
    /// Name of the persisted field holding this party's arrival time.
    pub fn field_name(&self) -> &'static str {
        match self {
            Party::Patient => "patient_arrive_time",
            Party::Practitioner => "practitioner_arrive_time",
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Patient => write!(f, "patient"),
            Party::Practitioner => write!(f, "practitioner"),
        }
    }
}

/// Product of the two per-party arrival states. `Both` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Neither,
    PatientOnly,
    PractitionerOnly,
    Both,
}

/// Partial set of encounter fields for a merge write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncounterPatch {
    pub url: Option<String>,
    pub patient_arrive_time: Option<DateTime<Utc>>,
    pub practitioner_arrive_time: Option<DateTime<Utc>>,
}

impl EncounterPatch {
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn arrival(party: Party, at: DateTime<Utc>) -> Self {
        match party {
            Party::Patient => Self {
                patient_arrive_time: Some(at),
                ..Self::default()
            },
            Party::Practitioner => Self {
                practitioner_arrive_time: Some(at),
                ..Self::default()
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.patient_arrive_time.is_none()
            && self.practitioner_arrive_time.is_none()
    }
}
