//! Stream error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WsError {
    /// The server could not be reached or refused the websocket upgrade.
    #[error("Could not connect to the stream server: {0}")]
    Handshake(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed: code={code}, reason={reason}")]
    ConnectionClosed { code: u16, reason: String },

    #[error("Stream transport is not connected")]
    NotConnected,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Tungstenite error: {0}")]
    Tungstenite(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WsError {
    /// True when the failure happened while reaching the server.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Handshake(_))
    }
}

pub type WsResult<T> = Result<T, WsError>;
