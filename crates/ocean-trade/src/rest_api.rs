//! REST implementation of `TradeApi`.
//!
//! Delegates each call to the shared `ocean_api::RestClient`, so every
//! request goes through the authenticated request wrapper.

use std::sync::Arc;

use ocean_api::{ApiResult, RestClient};
use ocean_core::{
    CancelAllParams, CancelOrderParams, LimitOrderSubmission, MarketOrderSubmission, Reservation,
    ReservationRequest, TokenBalanceQuery, UserQuery,
};
use serde_json::Value;

use crate::api::{BoxFuture, TradeApi};

/// Production `TradeApi` backed by the relayer REST client.
#[derive(Clone)]
pub struct RestTradeApi {
    client: Arc<RestClient>,
}

impl RestTradeApi {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<RestClient> {
        &self.client
    }
}

impl TradeApi for RestTradeApi {
    fn reserve_market_order<'a>(
        &'a self,
        request: &'a ReservationRequest<'a>,
    ) -> BoxFuture<'a, ApiResult<Reservation>> {
        Box::pin(self.client.reserve_market_order(request))
    }

    fn reserve_limit_order<'a>(
        &'a self,
        request: &'a ReservationRequest<'a>,
    ) -> BoxFuture<'a, ApiResult<Reservation>> {
        Box::pin(self.client.reserve_limit_order(request))
    }

    fn place_market_order<'a>(
        &'a self,
        order: &'a MarketOrderSubmission,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        Box::pin(self.client.place_market_order(order))
    }

    fn place_limit_order<'a>(
        &'a self,
        order: &'a LimitOrderSubmission,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        Box::pin(self.client.place_limit_order(order))
    }

    fn cancel_order<'a>(
        &'a self,
        params: &'a CancelOrderParams,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        Box::pin(self.client.cancel_order(params))
    }

    fn cancel_all_orders<'a>(
        &'a self,
        params: &'a CancelAllParams,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        Box::pin(self.client.cancel_all_orders(params))
    }

    fn user_history<'a>(&'a self, params: &'a UserQuery) -> BoxFuture<'a, ApiResult<Value>> {
        Box::pin(self.client.user_history(params))
    }

    fn user_data(&self) -> BoxFuture<'_, ApiResult<Value>> {
        Box::pin(self.client.user_data())
    }

    fn token_available_balance<'a>(
        &'a self,
        query: &'a TokenBalanceQuery,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        Box::pin(self.client.token_available_balance(query))
    }

    fn token_committed_amount<'a>(
        &'a self,
        query: &'a TokenBalanceQuery,
    ) -> BoxFuture<'a, ApiResult<Value>> {
        Box::pin(self.client.token_committed_amount(query))
    }
}
