//! Authenticated trading endpoints.

use ocean_core::{
    CancelAllParams, CancelOrderParams, LimitOrderSubmission, MarketOrderSubmission, Reservation,
    ReservationRequest, TokenBalanceQuery, UserQuery,
};
use serde_json::Value;
use tracing::debug;

use crate::client::{RequestSpec, RestClient};
use crate::error::ApiResult;

impl RestClient {
    pub async fn reserve_market_order(
        &self,
        request: &ReservationRequest<'_>,
    ) -> ApiResult<Reservation> {
        let spec = RequestSpec::post(
            self.config().endpoints.market_order_reserve.clone(),
            serde_json::to_value(request)?,
        );
        let response = self.auth_request(&spec).await?;
        debug!("Market order reserved");
        Ok(serde_json::from_value(response)?)
    }

    pub async fn reserve_limit_order(
        &self,
        request: &ReservationRequest<'_>,
    ) -> ApiResult<Reservation> {
        let spec = RequestSpec::post(
            self.config().endpoints.limit_order_reserve.clone(),
            serde_json::to_value(request)?,
        );
        let response = self.auth_request(&spec).await?;
        debug!("Limit order reserved");
        Ok(serde_json::from_value(response)?)
    }

    pub async fn place_market_order(&self, order: &MarketOrderSubmission) -> ApiResult<Value> {
        let spec = RequestSpec::post(
            self.config().endpoints.market_order_place.clone(),
            serde_json::to_value(order)?,
        );
        self.auth_request(&spec).await
    }

    pub async fn place_limit_order(&self, order: &LimitOrderSubmission) -> ApiResult<Value> {
        let spec = RequestSpec::post(
            self.config().endpoints.limit_order_place.clone(),
            serde_json::to_value(order)?,
        );
        self.auth_request(&spec).await
    }

    /// `DELETE {order}/{orderHash}`
    pub async fn cancel_order(&self, params: &CancelOrderParams) -> ApiResult<Value> {
        let path = format!("{}/{}", self.config().endpoints.order, params.order_hash);
        self.auth_request(&RequestSpec::delete(path)).await
    }

    /// `DELETE {order}`, optionally limited to one pair.
    pub async fn cancel_all_orders(&self, params: &CancelAllParams) -> ApiResult<Value> {
        let spec = RequestSpec::delete(self.config().endpoints.order.clone()).with_query(params)?;
        self.auth_request(&spec).await
    }

    pub async fn user_history(&self, params: &UserQuery) -> ApiResult<Value> {
        let spec =
            RequestSpec::get(self.config().endpoints.user_history.clone()).with_query(params)?;
        self.auth_request(&spec).await
    }

    pub async fn user_data(&self) -> ApiResult<Value> {
        let spec = RequestSpec::get(self.config().endpoints.user_data.clone());
        self.auth_request(&spec).await
    }

    pub async fn token_available_balance(&self, query: &TokenBalanceQuery) -> ApiResult<Value> {
        let spec =
            RequestSpec::get(self.config().endpoints.available_balance.clone()).with_query(query)?;
        self.auth_request(&spec).await
    }

    pub async fn token_committed_amount(&self, query: &TokenBalanceQuery) -> ApiResult<Value> {
        let spec =
            RequestSpec::get(self.config().endpoints.committed_amount.clone()).with_query(query)?;
        self.auth_request(&spec).await
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::{AuthContext, Credentials, SessionTokens};
    use crate::config::ApiConfig;
    use crate::RestClient;
    use httpmock::prelude::*;
    use ocean_core::{
        CancelAllParams, CancelOrderParams, OrderParams, OrderSide, ReservationRequest,
        TokenBalanceQuery, UserQuery,
    };
    use rust_decimal_macros::dec;
    use serde_json::json;

    const WALLET: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    const ZRX: &str = "0xe41d2489571d322189246dafa5ebde1f4699f498";
    const WETH: &str = "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2";

    fn client(server: &MockServer) -> RestClient {
        let auth = AuthContext::new(
            Some(Credentials::Session {
                username: "alice".to_string(),
            }),
            Some(SessionTokens::new("id-0", Some("r-0".to_string()))),
        );
        RestClient::with_auth(ApiConfig::with_base_url(server.base_url()), auth).unwrap()
    }

    #[tokio::test]
    async fn test_reserve_market_order_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/market_order/reserve").json_body(json!({
                    "walletAddress": WALLET,
                    "baseTokenAddress": ZRX,
                    "quoteTokenAddress": WETH,
                    "side": "sell",
                    "orderAmount": "100"
                }));
                then.status(200).json_body(json!({ "matchingOrderID": "m-1" }));
            })
            .await;

        let params = OrderParams {
            base_token_address: ZRX.to_string(),
            quote_token_address: WETH.to_string(),
            side: OrderSide::Sell,
            order_amount: dec!(100),
            price: None,
            fee_option: None,
        };
        let reservation = client(&server)
            .reserve_market_order(&ReservationRequest {
                wallet_address: WALLET,
                params: &params,
            })
            .await
            .unwrap();

        assert_eq!(reservation.matching_order_id.as_deref(), Some("m-1"));
        mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_cancel_order_uses_hash_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/order/0xdeadbeef");
                then.status(200).json_body(json!({ "canceled": true }));
            })
            .await;

        let response = client(&server)
            .cancel_order(&CancelOrderParams {
                order_hash: "0xdeadbeef".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response["canceled"], true);
        mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_cancel_all_orders_pair_filter() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/order")
                    .query_param("baseTokenAddress", ZRX)
                    .query_param("quoteTokenAddress", WETH);
                then.status(200).json_body(json!([]));
            })
            .await;

        client(&server)
            .cancel_all_orders(&CancelAllParams {
                base_token_address: Some(ZRX.to_string()),
                quote_token_address: Some(WETH.to_string()),
            })
            .await
            .unwrap();
        mock.assert_calls_async(1).await;
    }

    #[tokio::test]
    async fn test_user_history_and_balance_queries() {
        let server = MockServer::start_async().await;
        let history = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/user_history")
                    .query_param("userId", "u-1");
                then.status(200).json_body(json!([{ "orderHash": "0x1" }]));
            })
            .await;
        let balance = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/available_balance")
                    .query_param("walletAddress", WALLET)
                    .query_param("tokenAddress", ZRX);
                then.status(200)
                    .json_body(json!({ "availableBalance": "1000" }));
            })
            .await;

        let client = client(&server);
        let rows = client
            .user_history(&UserQuery {
                user_id: Some("u-1".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(rows.as_array().map(Vec::len), Some(1));

        let response = client
            .token_available_balance(&TokenBalanceQuery {
                wallet_address: WALLET.to_string(),
                token_address: ZRX.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response["availableBalance"], "1000");

        history.assert_calls_async(1).await;
        balance.assert_calls_async(1).await;
    }
}
