//! Account query types shared by the REST client and the trade workflow.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Cancel a single open order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderParams {
    pub order_hash: String,
}

/// Cancel all open orders, optionally limited to one token pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAllParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_token_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_token_address: Option<String>,
}

/// User history / user data lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Balance lookup for one token held by one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceQuery {
    pub wallet_address: String,
    pub token_address: String,
}

/// Balance result: a parsed amount when the expected field is present,
/// otherwise the raw response.
#[derive(Debug, Clone, PartialEq)]
pub enum MaybeAmount {
    Amount(Decimal),
    Raw(Value),
}

impl MaybeAmount {
    /// Extract `field` from `response` as a decimal, falling back to `Raw`.
    pub fn from_field(response: Value, field: &str) -> Self {
        let parsed = match response.get(field) {
            Some(Value::String(s)) => Decimal::from_str(s).ok(),
            Some(Value::Number(n)) => Decimal::from_str(&n.to_string()).ok(),
            _ => None,
        };
        match parsed {
            Some(amount) => Self::Amount(amount),
            None => Self::Raw(response),
        }
    }

    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Amount(amount) => Some(*amount),
            Self::Raw(_) => None,
        }
    }
}
