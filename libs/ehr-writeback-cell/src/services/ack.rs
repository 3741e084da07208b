// libs/ehr-writeback-cell/src/services/ack.rs
use crate::models::{MllpAck, MllpError};

/// Decides whether the bytes returned by the EHR count as an acknowledgment.
///
/// Framing and socket handling stay in the transport; a policy only sees the
/// first chunk the peer sent back.
pub trait AckPolicy: Send + Sync {
    fn evaluate(&self, response: &[u8]) -> Result<MllpAck, MllpError>;
}

/// Treats any response bytes as success. The content is not parsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAnyByte;

impl AckPolicy for AcceptAnyByte {
    fn evaluate(&self, response: &[u8]) -> Result<MllpAck, MllpError> {
        if response.is_empty() {
            return Err(MllpError::Rejected {
                message: "empty acknowledgment".to_string(),
            });
        }

        Ok(MllpAck {
            raw: response.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_any_byte_is_accepted() {
        let policy = AcceptAnyByte;

        let ack = policy.evaluate(b"\x0bMSA|AE|1058\x1c\r").unwrap();
        assert_eq!(ack.raw, b"\x0bMSA|AE|1058\x1c\r".to_vec());

        assert!(policy.evaluate(b"?").is_ok());
    }

    #[test]
    fn test_empty_response_is_rejected() {
        assert_matches!(AcceptAnyByte.evaluate(b""), Err(MllpError::Rejected { .. }));
    }
}
