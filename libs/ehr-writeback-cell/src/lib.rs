// libs/ehr-writeback-cell/src/lib.rs
//! # EHR Writeback Cell
//!
//! Tells the EHR that both parties of a virtual visit have arrived, using an
//! HL7v2 SIU^S14 schedule update sent over MLLP.
//!
//! ```text
//! +-----------------------------------------------------+
//! |                 EHR Writeback Cell                  |
//! +-----------------------------------------------------+
//! |  models.rs      |  Hl7Message, MllpTarget, errors   |
//! |  services/      |                                   |
//! |    hl7.rs       |  Fixed-layout message builder     |
//! |    mllp.rs      |  Framing and one-shot TCP client  |
//! |    ack.rs       |  Acknowledgment acceptance policy |
//! +-----------------------------------------------------+
//! ```
//!
//! ## Configuration
//!
//! - `MLLP_HOST` / `MLLP_PORT` - EHR listener
//! - `MLLP_CONNECT_TIMEOUT_SECS` - bound on the TCP connect
//! - `MLLP_ACK_TIMEOUT_SECS` - bound on the acknowledgment wait
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ehr_writeback_cell::{build_arrival_message, Hl7Sender, MllpClient};
//! use shared_config::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env();
//! let message = build_arrival_message("E1", "P1", "Jane Doe", &chrono::Utc::now());
//! MllpClient::new(&config).send(&message).await?;
//! # Ok(())
//! # }
//! ```

pub mod models;
pub mod services;

pub use models::{Hl7Message, MllpAck, MllpError, MllpTarget};
pub use services::{build_arrival_message, framed, AcceptAnyByte, AckPolicy, Hl7Sender, MllpClient};
