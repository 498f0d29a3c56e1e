//! REST client for the relayer.
//!
//! - `RestClient::auth_request`: the authenticated request wrapper with
//!   refresh-and-replay on 401
//! - `AuthContext`, `Credentials`: per-client credential state and headers
//! - trading endpoints (reserve, place, cancel, history, balances) and
//!   unauthenticated market data endpoints

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod market;
pub mod trade;

pub use auth::{sign_request, AuthContext, Credentials, SessionTokens};
pub use client::{RequestSpec, RestClient, DEFAULT_AUTH_RETRIES};
pub use config::{ApiConfig, Endpoints};
pub use error::{ApiError, ApiResult};
pub use market::{CandlestickParams, OrderBookParams, PairParams};
