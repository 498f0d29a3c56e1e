//! Order placement against the relayer.
//!
//! # Key Components
//!
//! - [`OrderWorkflow`]: reserve, sign, serialize, submit
//! - [`OrderSigner`]: signing capability; [`LocalOrderSigner`] holds a key
//!   loaded by [`KeyManager`]
//! - [`TradeApi`]: relayer calls the workflow needs; [`RestTradeApi`] is the
//!   REST implementation, [`MockTradeApi`] the test double
//! - [`order_hash`]: keccak-256 of the packed order fields

pub mod api;
pub mod error;
pub mod rest_api;
pub mod signer;
pub mod workflow;

pub use api::{BoxFuture, MockTradeApi, TradeApi, TradeCall};
pub use error::{TradeError, TradeResult};
pub use rest_api::RestTradeApi;
pub use signer::{
    ec_signature_from_bytes, order_hash, order_hash_hex, KeyError, KeyManager, KeySource,
    LocalOrderSigner, MockOrderSigner, OrderSigner, SignerError,
};
pub use workflow::{OnReserved, OrderWorkflow};
