//! Write handle feeding the connection's outbound queue.
//!
//! Subscription registries emit through this handle; the connection loop
//! drains the queue into the socket.

use crate::connection::ConnectionState;
use crate::error::{WsError, WsResult};
use crate::message::OutboundEnvelope;
use crate::subscription::EnvelopeSink;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

#[derive(Debug, Clone)]
pub struct WsWriteHandle {
    tx: mpsc::Sender<String>,
    state: Arc<RwLock<ConnectionState>>,
}

impl WsWriteHandle {
    pub fn new(tx: mpsc::Sender<String>, state: Arc<RwLock<ConnectionState>>) -> Self {
        Self { tx, state }
    }

    /// Queue a text frame, waiting for queue capacity.
    pub async fn send_text(&self, text: String) -> WsResult<()> {
        if !self.is_connected() {
            return Err(WsError::NotConnected);
        }
        self.tx
            .send(text)
            .await
            .map_err(|_| WsError::SendFailed("outbound channel closed".to_string()))
    }

    /// Queue a text frame without waiting.
    pub fn try_send_text(&self, text: String) -> WsResult<()> {
        if !self.is_connected() {
            return Err(WsError::NotConnected);
        }
        self.tx.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => WsError::SendFailed("outbound queue full".to_string()),
            TrySendError::Closed(_) => WsError::SendFailed("outbound channel closed".to_string()),
        })
    }

    pub fn is_connected(&self) -> bool {
        *self.state.read() == ConnectionState::Connected && !self.tx.is_closed()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.read()
    }
}

impl EnvelopeSink for WsWriteHandle {
    fn emit(&self, envelope: OutboundEnvelope) -> WsResult<()> {
        let text = envelope.to_json()?;
        trace!(channel = %envelope.channel, kind = ?envelope.kind, "Queueing envelope");
        self.try_send_text(text)
    }
}
