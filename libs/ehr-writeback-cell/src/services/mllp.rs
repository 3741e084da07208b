// libs/ehr-writeback-cell/src/services/mllp.rs
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use shared_config::AppConfig;

use crate::models::{Hl7Message, MllpAck, MllpError, MllpTarget, CARRIAGE_RETURN, END_BLOCK, START_BLOCK};
use crate::services::ack::{AcceptAnyByte, AckPolicy};

const ACK_BUFFER_SIZE: usize = 4096;

/// Wraps a message as `0x0B <message> 0x1C 0x0D`.
pub fn framed(message: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(message.len() + 3);
    frame.push(START_BLOCK);
    frame.extend_from_slice(message);
    frame.push(END_BLOCK);
    frame.push(CARRIAGE_RETURN);
    frame
}

/// Delivers a built HL7 message to the EHR.
#[async_trait]
pub trait Hl7Sender: Send + Sync {
    async fn send(&self, message: &Hl7Message) -> Result<MllpAck, MllpError>;
}

/// One-shot MLLP client: one connection per message, no retries.
pub struct MllpClient {
    target: MllpTarget,
    connect_timeout: Duration,
    ack_timeout: Duration,
    ack_policy: Arc<dyn AckPolicy>,
}

impl MllpClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_target(
            MllpTarget::new(config.mllp_host.clone(), config.mllp_port),
            Duration::from_secs(config.mllp_connect_timeout_secs),
            Duration::from_secs(config.mllp_ack_timeout_secs),
        )
    }

    pub fn with_target(target: MllpTarget, connect_timeout: Duration, ack_timeout: Duration) -> Self {
        Self {
            target,
            connect_timeout,
            ack_timeout,
            ack_policy: Arc::new(AcceptAnyByte),
        }
    }

    pub fn with_ack_policy(mut self, ack_policy: Arc<dyn AckPolicy>) -> Self {
        self.ack_policy = ack_policy;
        self
    }

    pub fn target(&self) -> &MllpTarget {
        &self.target
    }

    async fn connect(&self) -> Result<TcpStream, MllpError> {
        let target = self.target.to_string();
        debug!("Connecting to MLLP peer {}", target);

        match timeout(
            self.connect_timeout,
            TcpStream::connect((self.target.host.as_str(), self.target.port)),
        )
        .await
        {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => {
                error!("MLLP connect to {} failed: {}", target, e);
                Err(MllpError::Connect {
                    target,
                    message: e.to_string(),
                })
            }
            Err(_) => {
                warn!("MLLP connect to {} timed out", target);
                Err(MllpError::Timeout {
                    target,
                    stage: "connect to",
                    seconds: self.connect_timeout.as_secs(),
                })
            }
        }
    }

    async fn await_ack(&self, stream: &mut TcpStream) -> Result<MllpAck, MllpError> {
        let target = self.target.to_string();
        let mut buffer = vec![0u8; ACK_BUFFER_SIZE];

        match timeout(self.ack_timeout, stream.read(&mut buffer)).await {
            Ok(Ok(0)) => {
                warn!("MLLP peer {} closed the connection without acknowledging", target);
                Err(MllpError::NoResponse {
                    target,
                    message: "connection closed before acknowledgment".to_string(),
                })
            }
            Ok(Ok(read)) => {
                debug!("Received {} acknowledgment byte(s) from {}", read, target);
                self.ack_policy.evaluate(&buffer[..read])
            }
            Ok(Err(e)) => {
                error!("MLLP read from {} failed: {}", target, e);
                Err(MllpError::NoResponse {
                    target,
                    message: e.to_string(),
                })
            }
            Err(_) => {
                warn!("No MLLP acknowledgment from {} within {:?}", target, self.ack_timeout);
                Err(MllpError::Timeout {
                    target,
                    stage: "receive acknowledgment from",
                    seconds: self.ack_timeout.as_secs(),
                })
            }
        }
    }
}

#[async_trait]
impl Hl7Sender for MllpClient {
    async fn send(&self, message: &Hl7Message) -> Result<MllpAck, MllpError> {
        let mut stream = self.connect().await?;
        let frame = framed(message.as_bytes());

        let written = match stream.write_all(&frame).await {
            Ok(()) => stream.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            error!("MLLP write to {} failed: {}", self.target, e);
            return Err(MllpError::Write {
                target: self.target.to_string(),
                message: e.to_string(),
            });
        }
        debug!("Wrote {} byte MLLP frame to {}", frame.len(), self.target);

        let ack = self.await_ack(&mut stream).await;

        // Best effort; the ack has already been decided
        let _ = stream.shutdown().await;

        if ack.is_ok() {
            info!("EHR at {} acknowledged HL7 message", self.target);
        }
        ack
    }
}
