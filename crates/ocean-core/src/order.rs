//! Order data model.
//!
//! An `UnsignedOrder` is what the relayer hands back from a reservation.
//! Once the wallet has signed its hash it becomes a `SignedOrder`, which the
//! serializer converts into the wire shape.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::Amount;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Which token the relayer fee is charged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeeOption {
    #[default]
    FeeInZrx,
    FeeInNative,
}

/// Order fields as returned by a reservation, before signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedOrder {
    pub exchange_contract_address: String,
    /// Empty until the workflow fills in the signing account.
    #[serde(default)]
    pub maker: String,
    pub taker: String,
    pub maker_token_address: String,
    pub taker_token_address: String,
    pub fee_recipient: String,
    pub maker_token_amount: Amount,
    pub taker_token_amount: Amount,
    pub maker_fee: Amount,
    pub taker_fee: Amount,
    pub expiration_unix_timestamp_sec: Amount,
    pub salt: Amount,
}

impl UnsignedOrder {
    /// Returns a copy with `maker` set to `account`.
    pub fn with_maker(&self, account: &str) -> Self {
        Self {
            maker: account.to_string(),
            ..self.clone()
        }
    }
}

/// ECDSA signature over an order hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcSignature {
    /// Recovery id, 27 or 28.
    pub v: u8,
    /// `0x`-prefixed 32-byte hex.
    pub r: String,
    /// `0x`-prefixed 32-byte hex.
    pub s: String,
}

/// Order carrying its hash and the maker's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedOrder {
    #[serde(flatten)]
    pub order: UnsignedOrder,
    pub order_hash: String,
    pub ec_signature: EcSignature,
}
