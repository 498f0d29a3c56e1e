//! Relayer trading capability.
//!
//! `OrderWorkflow` talks to the relayer only through [`TradeApi`], so the
//! workflow can be driven by [`MockTradeApi`] in tests and by
//! [`crate::RestTradeApi`] in production.

use std::pin::Pin;
use std::sync::Arc;

use ocean_api::{ApiError, ApiResult};
use ocean_core::{
    CancelAllParams, CancelOrderParams, LimitOrderSubmission, MarketOrderSubmission, OrderParams,
    Reservation, ReservationRequest, TokenBalanceQuery, UserQuery,
};
use serde_json::{json, Value};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Authenticated relayer calls used by the order workflow.
pub trait TradeApi: Send + Sync {
    fn reserve_market_order<'a>(
        &'a self,
        request: &'a ReservationRequest<'a>,
    ) -> BoxFuture<'a, ApiResult<Reservation>>;

    fn reserve_limit_order<'a>(
        &'a self,
        request: &'a ReservationRequest<'a>,
    ) -> BoxFuture<'a, ApiResult<Reservation>>;

    fn place_market_order<'a>(
        &'a self,
        order: &'a MarketOrderSubmission,
    ) -> BoxFuture<'a, ApiResult<Value>>;

    fn place_limit_order<'a>(
        &'a self,
        order: &'a LimitOrderSubmission,
    ) -> BoxFuture<'a, ApiResult<Value>>;

    fn cancel_order<'a>(&'a self, params: &'a CancelOrderParams)
        -> BoxFuture<'a, ApiResult<Value>>;

    fn cancel_all_orders<'a>(
        &'a self,
        params: &'a CancelAllParams,
    ) -> BoxFuture<'a, ApiResult<Value>>;

    fn user_history<'a>(&'a self, params: &'a UserQuery) -> BoxFuture<'a, ApiResult<Value>>;

    fn user_data(&self) -> BoxFuture<'_, ApiResult<Value>>;

    fn token_available_balance<'a>(
        &'a self,
        query: &'a TokenBalanceQuery,
    ) -> BoxFuture<'a, ApiResult<Value>>;

    fn token_committed_amount<'a>(
        &'a self,
        query: &'a TokenBalanceQuery,
    ) -> BoxFuture<'a, ApiResult<Value>>;
}

impl<T: TradeApi + ?Sized> TradeApi for Arc<T> {
    fn reserve_market_order<'a>(
        &'a self,
        request: &'a ReservationRequest<'a>,
    ) -> BoxFuture<'a, ApiResult<Reservation>> {
        (**self).reserve_market_order(request)
    }

    fn reserve_limit_order<'a>(
        &'a self,
        request: &'a ReservationRequest<'a>,
    ) -> BoxFuture<'a, ApiResult<Reservation>> {
        (**self).reserve_limit_order(request)
    }

    fn place_market_order<'a>(
        &'a self,
        order: &'a MarketOrderSubmission,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        (**self).place_market_order(order)
    }

    fn place_limit_order<'a>(
        &'a self,
        order: &'a LimitOrderSubmission,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        (**self).place_limit_order(order)
    }

    fn cancel_order<'a>(
        &'a self,
        params: &'a CancelOrderParams,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        (**self).cancel_order(params)
    }

    fn cancel_all_orders<'a>(
        &'a self,
        params: &'a CancelAllParams,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        (**self).cancel_all_orders(params)
    }

    fn user_history<'a>(&'a self, params: &'a UserQuery) -> BoxFuture<'a, ApiResult<Value>> {
        (**self).user_history(params)
    }

    fn user_data(&self) -> BoxFuture<'_, ApiResult<Value>> {
        (**self).user_data()
    }

    fn token_available_balance<'a>(
        &'a self,
        query: &'a TokenBalanceQuery,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        (**self).token_available_balance(query)
    }

    fn token_committed_amount<'a>(
        &'a self,
        query: &'a TokenBalanceQuery,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        (**self).token_committed_amount(query)
    }
}

/// Call recorded by [`MockTradeApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum TradeCall {
    ReserveMarket {
        wallet_address: String,
        params: OrderParams,
    },
    ReserveLimit {
        wallet_address: String,
        params: OrderParams,
    },
    PlaceMarket(MarketOrderSubmission),
    PlaceLimit(LimitOrderSubmission),
    Cancel(CancelOrderParams),
    CancelAll(CancelAllParams),
    UserHistory(UserQuery),
    UserData,
    AvailableBalance(TokenBalanceQuery),
    CommittedAmount(TokenBalanceQuery),
}

/// Mock relayer for testing.
///
/// Serves a configurable reservation and response, records every call in
/// order, and can fail the next reservation or placement with an HTTP status.
#[derive(Debug)]
pub struct MockTradeApi {
    calls: parking_lot::Mutex<Vec<TradeCall>>,
    reservation: parking_lot::Mutex<Reservation>,
    response: parking_lot::Mutex<Value>,
    reserve_status: parking_lot::Mutex<Option<u16>>,
    place_status: parking_lot::Mutex<Option<u16>>,
}

impl Default for MockTradeApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTradeApi {
    pub fn new() -> Self {
        Self {
            calls: parking_lot::Mutex::new(Vec::new()),
            reservation: parking_lot::Mutex::new(Reservation::default()),
            response: parking_lot::Mutex::new(json!({ "status": "ok" })),
            reserve_status: parking_lot::Mutex::new(None),
            place_status: parking_lot::Mutex::new(None),
        }
    }

    /// Reservation returned by both reserve calls.
    pub fn set_reservation(&self, reservation: Reservation) {
        *self.reservation.lock() = reservation;
    }

    /// Response returned by every non-reserve call.
    pub fn set_response(&self, response: Value) {
        *self.response.lock() = response;
    }

    /// Fail reserve calls with this HTTP status.
    pub fn fail_reservation(&self, status: u16) {
        *self.reserve_status.lock() = Some(status);
    }

    /// Fail place calls with this HTTP status.
    pub fn fail_placement(&self, status: u16) {
        *self.place_status.lock() = Some(status);
    }

    pub fn calls(&self) -> Vec<TradeCall> {
        self.calls.lock().clone()
    }

    pub fn market_submissions(&self) -> Vec<MarketOrderSubmission> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TradeCall::PlaceMarket(order) => Some(order.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn limit_submissions(&self) -> Vec<LimitOrderSubmission> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                TradeCall::PlaceLimit(order) => Some(order.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TradeCall) {
        self.calls.lock().push(call);
    }

    fn reserve_result(&self) -> ApiResult<Reservation> {
        match *self.reserve_status.lock() {
            Some(status) => Err(http_error(status)),
            None => Ok(self.reservation.lock().clone()),
        }
    }

    fn place_result(&self) -> ApiResult<Value> {
        match *self.place_status.lock() {
            Some(status) => Err(http_error(status)),
            None => Ok(self.response.lock().clone()),
        }
    }

    fn respond(&self, call: TradeCall) -> BoxFuture<'_, ApiResult<Value>> {
        Box::pin(async move {
            self.record(call);
            Ok(self.response.lock().clone())
        })
    }
}

fn http_error(status: u16) -> ApiError {
    ApiError::Http {
        status,
        body: format!("mock status {status}"),
    }
}

impl TradeApi for MockTradeApi {
    fn reserve_market_order<'a>(
        &'a self,
        request: &'a ReservationRequest<'a>,
    ) -> BoxFuture<'a, ApiResult<Reservation>> {
        Box::pin(async move {
            self.record(TradeCall::ReserveMarket {
                wallet_address: request.wallet_address.to_string(),
                params: request.params.clone(),
            });
            self.reserve_result()
        })
    }

    fn reserve_limit_order<'a>(
        &'a self,
        request: &'a ReservationRequest<'a>,
    ) -> BoxFuture<'a, ApiResult<Reservation>> {
        Box::pin(async move {
            self.record(TradeCall::ReserveLimit {
                wallet_address: request.wallet_address.to_string(),
                params: request.params.clone(),
            });
            self.reserve_result()
        })
    }

    fn place_market_order<'a>(
        &'a self,
        order: &'a MarketOrderSubmission,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        Box::pin(async move {
            self.record(TradeCall::PlaceMarket(order.clone()));
            self.place_result()
        })
    }

    fn place_limit_order<'a>(
        &'a self,
        order: &'a LimitOrderSubmission,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        Box::pin(async move {
            self.record(TradeCall::PlaceLimit(order.clone()));
            self.place_result()
        })
    }

    fn cancel_order<'a>(
        &'a self,
        params: &'a CancelOrderParams,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        self.respond(TradeCall::Cancel(params.clone()))
    }

    fn cancel_all_orders<'a>(
        &'a self,
        params: &'a CancelAllParams,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        self.respond(TradeCall::CancelAll(params.clone()))
    }

    fn user_history<'a>(&'a self, params: &'a UserQuery) -> BoxFuture<'a, ApiResult<Value>> {
        self.respond(TradeCall::UserHistory(params.clone()))
    }

    fn user_data(&self) -> BoxFuture<'_, ApiResult<Value>> {
        self.respond(TradeCall::UserData)
    }

    fn token_available_balance<'a>(
        &'a self,
        query: &'a TokenBalanceQuery,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        self.respond(TradeCall::AvailableBalance(query.clone()))
    }

    fn token_committed_amount<'a>(
        &'a self,
        query: &'a TokenBalanceQuery,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        self.respond(TradeCall::CommittedAmount(query.clone()))
    }
}
