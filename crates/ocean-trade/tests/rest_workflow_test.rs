//! End-to-end order placement against a mock relayer over HTTP.

use std::sync::Arc;

use httpmock::prelude::*;
use ocean_api::{ApiConfig, AuthContext, Credentials, RestClient, SessionTokens};
use ocean_core::{FeeOption, OrderParams, OrderSide};
use ocean_trade::{KeyManager, LocalOrderSigner, OrderWorkflow, RestTradeApi, TradeError};
use rust_decimal_macros::dec;
use serde_json::json;

const TEST_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const ACCOUNT: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

fn unsigned_matching_order() -> serde_json::Value {
    json!({
        "exchangeContractAddress": "0x12459c951127e0c374ff9105dda097662a027093",
        "maker": "",
        "taker": "0x0000000000000000000000000000000000000000",
        "makerTokenAddress": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
        "takerTokenAddress": "0xe41d2489571d322189246dafa5ebde1f4699f498",
        "feeRecipient": "0x88a64b5e882e5ad851bea5e7a3c8ba7c523fecbe",
        "makerTokenAmount": "250000000000000000",
        "takerTokenAmount": 100000000000000000000u128.to_string(),
        "makerFee": "0",
        "takerFee": "0",
        "expirationUnixTimestampSec": 1700000000,
        "salt": "7236186437153425362544564137182396584761"
    })
}

fn workflow(server: &MockServer) -> OrderWorkflow<RestTradeApi, LocalOrderSigner> {
    let auth = AuthContext::new(
        Some(Credentials::Session {
            username: "alice".to_string(),
        }),
        Some(SessionTokens::new("id-0", Some("r-0".to_string()))),
    );
    let client =
        Arc::new(RestClient::with_auth(ApiConfig::with_base_url(server.base_url()), auth).unwrap());
    let keys = Arc::new(KeyManager::from_hex(TEST_PRIVATE_KEY, None).unwrap());
    OrderWorkflow::new(RestTradeApi::new(client), LocalOrderSigner::new(keys))
}

fn params() -> OrderParams {
    OrderParams {
        base_token_address: "0xe41d2489571d322189246dafa5ebde1f4699f498".to_string(),
        quote_token_address: "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2".to_string(),
        side: OrderSide::Buy,
        order_amount: dec!(100),
        price: None,
        fee_option: Some(FeeOption::FeeInZrx),
    }
}

#[tokio::test]
async fn test_market_order_round_trip() {
    let server = MockServer::start_async().await;
    let reserve = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/market_order/reserve")
                .header("Authorization", "Bearer id-0");
            then.status(200).json_body(json!({
                "matchingOrderID": "abc",
                "unsignedMatchingOrder": unsigned_matching_order()
            }));
        })
        .await;
    let place = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/market_order/place")
                .body_includes(r#""matchingOrderID":"abc""#)
                .body_includes(format!(r#""maker":"{ACCOUNT}""#))
                .body_includes(r#""expirationUnixTimestampSec":"1700000000""#)
                .body_includes(r#""ecSignature":{"v":"#);
            then.status(200).json_body(json!({ "filled": true }));
        })
        .await;

    let response = workflow(&server)
        .new_market_order(&params(), ACCOUNT, None)
        .await
        .unwrap();

    assert_eq!(response["filled"], true);
    reserve.assert_calls_async(1).await;
    place.assert_calls_async(1).await;
}

#[tokio::test]
async fn test_reservation_http_error_is_reported_as_reservation_step() {
    let server = MockServer::start_async().await;
    let reserve = server
        .mock_async(|when, then| {
            when.method(POST).path("/market_order/reserve");
            then.status(500).body("relayer down");
        })
        .await;
    let place = server
        .mock_async(|when, then| {
            when.method(POST).path("/market_order/place");
            then.status(200);
        })
        .await;

    let err = workflow(&server)
        .new_market_order(&params(), ACCOUNT, None)
        .await
        .unwrap_err();

    assert!(matches!(err, TradeError::Reservation(ref e) if e.status() == Some(500)));
    reserve.assert_calls_async(1).await;
    place.assert_calls_async(0).await;
}

#[tokio::test]
async fn test_limit_order_with_rejected_target() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/limit_order/reserve");
            then.status(200).json_body(json!({
                "matchingOrderID": "m-2",
                "unsignedMatchingOrder": unsigned_matching_order(),
                "unsignedTargetOrder": { "error": "amount below minimum" }
            }));
        })
        .await;
    let place = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/limit_order/place")
                .body_includes(r#""signedMatchingOrder""#)
                .body_excludes(r#""signedTargetOrder""#);
            then.status(200)
                .json_body(json!({ "completelyImmediatelyPlaceable": true }));
        })
        .await;

    let mut limit = params();
    limit.price = Some(dec!(0.0025));
    let response = workflow(&server)
        .new_limit_order(&limit, ACCOUNT, None)
        .await
        .unwrap();

    assert_eq!(response["completelyImmediatelyPlaceable"], true);
    place.assert_calls_async(1).await;
}
