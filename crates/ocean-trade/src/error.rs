//! Trade error types.
//!
//! Each relayer-facing step has its own variant so callers can tell a failed
//! reservation from a failed signature or a failed submission. The inner
//! error is carried unchanged.

use ocean_api::ApiError;
use thiserror::Error;

use crate::signer::SignerError;

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Reservation failed: {0}")]
    Reservation(#[source] ApiError),

    #[error("Incomplete reservation: {0}")]
    IncompleteReservation(String),

    #[error("Signing failed: {0}")]
    Signing(#[from] SignerError),

    #[error("Submission failed: {0}")]
    Submission(#[source] ApiError),

    #[error("Request failed: {0}")]
    Request(#[source] ApiError),
}

pub type TradeResult<T> = Result<T, TradeError>;
