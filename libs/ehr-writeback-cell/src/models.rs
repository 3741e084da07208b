// libs/ehr-writeback-cell/src/models.rs
use std::fmt;

use thiserror::Error;

// ==============================================================================
// HL7 / MLLP WIRE CONSTANTS
// ==============================================================================

/// MLLP start block (vertical tab).
pub const START_BLOCK: u8 = 0x0B;
/// MLLP end block (file separator).
pub const END_BLOCK: u8 = 0x1C;
/// Carriage return; terminates the MLLP frame and every HL7 segment.
pub const CARRIAGE_RETURN: u8 = 0x0D;

pub const SEGMENT_TERMINATOR: char = '\r';
pub const FIELD_SEPARATOR: char = '|';

// ==============================================================================
// HL7 MESSAGE
// ==============================================================================

/// A built HL7v2 message. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hl7Message {
    text: String,
}

impl Hl7Message {
    pub(crate) fn from_segments(segments: &[String]) -> Self {
        let mut text = String::new();
        for segment in segments {
            text.push_str(segment);
            text.push(SEGMENT_TERMINATOR);
        }
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Segments without their terminators.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.text
            .split(SEGMENT_TERMINATOR)
            .filter(|segment| !segment.is_empty())
    }

    /// Looks up a segment by its three-letter id.
    pub fn segment(&self, id: &str) -> Option<&str> {
        self.segments()
            .find(|segment| segment.split(FIELD_SEPARATOR).next() == Some(id))
    }

    /// Returns field `index` of the segment `id`, counting the segment id as field 0.
    pub fn field(&self, id: &str, index: usize) -> Option<&str> {
        self.segment(id)
            .and_then(|segment| segment.split(FIELD_SEPARATOR).nth(index))
    }
}

impl fmt::Display for Hl7Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // HL7 uses bare CR between segments; show one per line
        for segment in self.segments() {
            writeln!(f, "{}", segment)?;
        }
        Ok(())
    }
}

// ==============================================================================
// MLLP TRANSPORT TYPES
// ==============================================================================

/// Host and port of the EHR's MLLP listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MllpTarget {
    pub host: String,
    pub port: u16,
}

impl MllpTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for MllpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Raw acknowledgment bytes returned by the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MllpAck {
    pub raw: Vec<u8>,
}

#[derive(Error, Debug)]
pub enum MllpError {
    #[error("Failed to connect to MLLP peer {target}: {message}")]
    Connect { target: String, message: String },

    #[error("Failed to write HL7 frame to {target}: {message}")]
    Write { target: String, message: String },

    #[error("No acknowledgment from {target}: {message}")]
    NoResponse { target: String, message: String },

    #[error("Timed out after {seconds}s waiting to {stage} {target}")]
    Timeout {
        target: String,
        stage: &'static str,
        seconds: u64,
    },

    #[error("Acknowledgment rejected: {message}")]
    Rejected { message: String },
}
