//! Reservation requests, reservation responses and order submissions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::order::{FeeOption, OrderSide, UnsignedOrder};
use crate::serializer::WireOrder;

/// Caller parameters for a market or limit order.
///
/// `price` is required by the relayer for limit orders and ignored for
/// market orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParams {
    pub base_token_address: String,
    pub quote_token_address: String,
    pub side: OrderSide,
    pub order_amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_option: Option<FeeOption>,
}

/// Body of a reserve request: the caller's params plus the wallet address.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest<'a> {
    pub wallet_address: &'a str,
    #[serde(flatten)]
    pub params: &'a OrderParams,
}

/// One side of a reservation.
///
/// The relayer marks a fragment it cannot fill with an `error` field; such a
/// fragment is never signed. `Rejected` is tried first so an object that
/// carries both order fields and `error` is still treated as rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    Rejected {
        error: Value,
        #[serde(flatten)]
        details: Map<String, Value>,
    },
    Order(UnsignedOrder),
}

impl Fragment {
    /// The signable order, if this fragment is not rejected.
    pub fn as_order(&self) -> Option<&UnsignedOrder> {
        match self {
            Self::Order(order) => Some(order),
            Self::Rejected { .. } => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Relayer response to a reserve request.
///
/// Fields the client does not interpret are kept in `extra` so callbacks can
/// inspect the full response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(
        rename = "matchingOrderID",
        alias = "marketOrderID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub matching_order_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsigned_matching_order: Option<Fragment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsigned_target_order: Option<Fragment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Reservation {
    /// Signable matching fragment, if present and not rejected.
    pub fn matching_order(&self) -> Option<&UnsignedOrder> {
        self.unsigned_matching_order.as_ref().and_then(Fragment::as_order)
    }

    /// Signable target fragment, if present and not rejected.
    pub fn target_order(&self) -> Option<&UnsignedOrder> {
        self.unsigned_target_order.as_ref().and_then(Fragment::as_order)
    }
}

/// Body of a market order placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketOrderSubmission {
    pub signed_matching_order: WireOrder,
    #[serde(
        rename = "matchingOrderID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub matching_order_id: Option<String>,
}

/// Body of a limit order placement.
///
/// Either signed order may be absent: a limit order can rest on the book
/// entirely, fill entirely, or split between the two.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrderSubmission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_target_order: Option<WireOrder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_matching_order: Option<WireOrder>,
    #[serde(
        rename = "matchingOrderID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub matching_order_id: Option<String>,
}

/// How much of a limit order can be matched immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitPlacement {
    /// Rests on the book only.
    NotImmediatelyPlaceable,
    /// Part fills now, the rest rests.
    PartiallyImmediatelyPlaceable,
    /// Fills entirely against the book.
    CompletelyImmediatelyPlaceable,
    /// Neither fragment was signable.
    Empty,
}

impl LimitOrderSubmission {
    pub fn placement(&self) -> LimitPlacement {
        match (
            self.signed_target_order.is_some(),
            self.signed_matching_order.is_some(),
        ) {
            (true, false) => LimitPlacement::NotImmediatelyPlaceable,
            (true, true) => LimitPlacement::PartiallyImmediatelyPlaceable,
            (false, true) => LimitPlacement::CompletelyImmediatelyPlaceable,
            (false, false) => LimitPlacement::Empty,
        }
    }
}
