//! Client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    Api(#[from] ocean_api::ApiError),

    #[error("Stream error: {0}")]
    Stream(#[from] ocean_ws::WsError),

    #[error("Key error: {0}")]
    Key(#[from] ocean_trade::KeyError),

    #[error("Trade error: {0}")]
    Trade(#[from] ocean_trade::TradeError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] ocean_telemetry::TelemetryError),
}

pub type ClientResult<T> = Result<T, ClientError>;
