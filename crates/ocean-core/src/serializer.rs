//! Wire form of signed orders.
//!
//! The relayer expects every numeric field as a base-10 string and the
//! address, hash and signature fields passed through untouched.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::order::{EcSignature, SignedOrder, UnsignedOrder};

/// Signed order as sent to the relayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOrder {
    pub exchange_contract_address: String,
    pub maker: String,
    pub taker: String,
    pub maker_token_address: String,
    pub taker_token_address: String,
    pub fee_recipient: String,
    pub maker_token_amount: String,
    pub taker_token_amount: String,
    pub taker_fee: String,
    pub maker_fee: String,
    pub expiration_unix_timestamp_sec: String,
    pub salt: String,
    pub order_hash: String,
    pub ec_signature: EcSignature,
}

/// Convert a signed order into its wire form.
pub fn serialize_order(signed: &SignedOrder) -> WireOrder {
    let order = &signed.order;
    WireOrder {
        exchange_contract_address: order.exchange_contract_address.clone(),
        maker: order.maker.clone(),
        taker: order.taker.clone(),
        maker_token_address: order.maker_token_address.clone(),
        taker_token_address: order.taker_token_address.clone(),
        fee_recipient: order.fee_recipient.clone(),
        maker_token_amount: order.maker_token_amount.to_string(),
        taker_token_amount: order.taker_token_amount.to_string(),
        taker_fee: order.taker_fee.to_string(),
        maker_fee: order.maker_fee.to_string(),
        expiration_unix_timestamp_sec: order.expiration_unix_timestamp_sec.to_string(),
        salt: order.salt.to_string(),
        order_hash: signed.order_hash.clone(),
        ec_signature: signed.ec_signature.clone(),
    }
}

impl From<&SignedOrder> for WireOrder {
    fn from(signed: &SignedOrder) -> Self {
        serialize_order(signed)
    }
}

impl TryFrom<&WireOrder> for SignedOrder {
    type Error = CoreError;

    fn try_from(wire: &WireOrder) -> Result<Self, Self::Error> {
        Ok(SignedOrder {
            order: UnsignedOrder {
                exchange_contract_address: wire.exchange_contract_address.clone(),
                maker: wire.maker.clone(),
                taker: wire.taker.clone(),
                maker_token_address: wire.maker_token_address.clone(),
                taker_token_address: wire.taker_token_address.clone(),
                fee_recipient: wire.fee_recipient.clone(),
                maker_token_amount: wire.maker_token_amount.parse()?,
                taker_token_amount: wire.taker_token_amount.parse()?,
                maker_fee: wire.maker_fee.parse()?,
                taker_fee: wire.taker_fee.parse()?,
                expiration_unix_timestamp_sec: wire.expiration_unix_timestamp_sec.parse()?,
                salt: wire.salt.parse()?,
            },
            order_hash: wire.order_hash.clone(),
            ec_signature: wire.ec_signature.clone(),
        })
    }
}
