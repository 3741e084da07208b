// libs/ehr-writeback-cell/src/services/mod.rs

pub mod ack;
pub mod hl7;
pub mod mllp;

pub use ack::{AcceptAnyByte, AckPolicy};
pub use hl7::build_arrival_message;
pub use mllp::{framed, Hl7Sender, MllpClient};
