// libs/ehr-writeback-cell/src/services/hl7.rs
use std::fmt::Display;

use chrono::{DateTime, TimeZone};

use crate::models::Hl7Message;

// Fixed header values agreed with the receiving EHR interface.
const ENCODING_CHARACTERS: &str = "^~\\&";
const SENDING_APPLICATION: &str = "Google";
const SENDING_FACILITY: &str = "CHA";
const RECEIVING_APPLICATION: &str = "EPIC";
const RECEIVING_FACILITY: &str = "CHA";
const MESSAGE_TYPE: &str = "SIU^S14";
const MESSAGE_CONTROL_ID: &str = "1058";
const PROCESSING_ID: &str = "P";
const VERSION_ID: &str = "2.6";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Field counts per segment, segment id included.
const MSH_FIELDS: usize = 14;
const SCH_FIELDS: usize = 26;
const PID_FIELDS: usize = 31;
const PV1_FIELDS: usize = 37;

/// PID-3 patient identifier.
pub const PID_PATIENT_ID: usize = 3;
/// PID-5 patient name.
pub const PID_PATIENT_NAME: usize = 5;
/// PV1-19 visit number, carrying the appointment id.
pub const PV1_VISIT_NUMBER: usize = 19;

/// Builds the SIU^S14 "both parties arrived" schedule update.
///
/// Field values are inserted verbatim. A patient name containing `|`, `^`
/// or a carriage return will shift the EHR's column layout.
pub fn build_arrival_message<Tz>(
    appointment_id: &str,
    patient_id: &str,
    patient_name: &str,
    timestamp: &DateTime<Tz>,
) -> Hl7Message
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let sent_at = timestamp.format(TIMESTAMP_FORMAT).to_string();

    let msh = segment(
        "MSH",
        MSH_FIELDS,
        &[
            (1, ENCODING_CHARACTERS),
            (2, SENDING_APPLICATION),
            (3, SENDING_FACILITY),
            (4, RECEIVING_APPLICATION),
            (5, RECEIVING_FACILITY),
            (6, sent_at.as_str()),
            (8, MESSAGE_TYPE),
            (9, MESSAGE_CONTROL_ID),
            (10, PROCESSING_ID),
            (11, VERSION_ID),
        ],
    );

    let sch = segment(
        "SCH",
        SCH_FIELDS,
        &[
            (6, "^Google Update"),
            (16, "^Both parties arrived"),
            (20, "^Google"),
            (25, "6^ARRIVED"),
        ],
    );

    let pid = segment(
        "PID",
        PID_FIELDS,
        &[(PID_PATIENT_ID, patient_id), (PID_PATIENT_NAME, patient_name)],
    );

    let pv1 = segment("PV1", PV1_FIELDS, &[(PV1_VISIT_NUMBER, appointment_id)]);

    Hl7Message::from_segments(&[msh, sch, pid, pv1])
}

/// Lays out a pipe-delimited segment of `width` fields, empty except for `values`.
fn segment(id: &str, width: usize, values: &[(usize, &str)]) -> String {
    let mut fields = vec![""; width];
    fields[0] = id;
    for &(index, value) in values {
        fields[index] = value;
    }
    fields.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Utc, TimeZone};

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 15, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_exact_wire_layout() {
        let message = build_arrival_message("APPT1", "P1", "Jane Doe", &fixed_time());

        let expected = concat!(
            "MSH|^~\\&|Google|CHA|EPIC|CHA|20200615140509||SIU^S14|1058|P|2.6||\r",
            "SCH||||||^Google Update||||||||||^Both parties arrived||||^Google|||||6^ARRIVED\r",
            "PID|||P1||Jane Doe|||||||||||||||||||||||||\r",
            "PV1|||||||||||||||||||APPT1|||||||||||||||||\r",
        );
        assert_eq!(message.as_str(), expected);
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let first = build_arrival_message("A", "P", "N", &fixed_time());
        let second = build_arrival_message("A", "P", "N", &fixed_time());
        assert_eq!(first, second);
    }

    #[test]
    fn test_documented_field_positions() {
        let message = build_arrival_message("APPT1", "P1", "Jane Doe", &fixed_time());

        assert_eq!(message.field("PID", PID_PATIENT_ID), Some("P1"));
        assert_eq!(message.field("PID", PID_PATIENT_NAME), Some("Jane Doe"));
        assert_eq!(message.field("PV1", PV1_VISIT_NUMBER), Some("APPT1"));
        assert_eq!(message.field("MSH", 8), Some("SIU^S14"));
        assert_eq!(message.field("SCH", 25), Some("6^ARRIVED"));
    }

    #[test]
    fn test_patient_name_does_not_move_other_segments() {
        let short = build_arrival_message("APPT1", "P1", "Jo", &fixed_time());
        let long = build_arrival_message("APPT1", "P1", "Bartholomew Longname-Smythe", &fixed_time());

        for id in ["MSH", "SCH", "PV1"] {
            assert_eq!(short.segment(id), long.segment(id));
        }
        assert_eq!(
            short.segment("PID").unwrap().matches('|').count(),
            long.segment("PID").unwrap().matches('|').count()
        );
    }

    #[test]
    fn test_every_segment_is_cr_terminated() {
        let message = build_arrival_message("A", "P", "N", &fixed_time());

        assert!(message.as_str().ends_with('\r'));
        assert_eq!(message.as_str().matches('\r').count(), 4);
        assert_eq!(message.segments().count(), 4);
    }

    #[test]
    fn test_timestamp_uses_24_hour_clock() {
        let evening = Utc.with_ymd_and_hms(2021, 1, 2, 23, 59, 1).unwrap();
        let message = build_arrival_message("A", "P", "N", &evening);
        assert_eq!(message.field("MSH", 6), Some("20210102235901"));
    }
}
