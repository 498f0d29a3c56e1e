//! Unauthenticated market data endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{RequestSpec, RestClient};
use crate::error::{ApiError, ApiResult};

/// A base/quote token pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairParams {
    pub base_token_address: String,
    pub quote_token_address: String,
}

impl PairParams {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base_token_address: base.into(),
            quote_token_address: quote.into(),
        }
    }

    fn validate(&self) -> ApiResult<()> {
        if self.base_token_address.is_empty() || self.quote_token_address.is_empty() {
            return Err(ApiError::Validation(format!(
                "Expected two token addresses, got {:?} and {:?}",
                self.base_token_address, self.quote_token_address
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookParams {
    #[serde(flatten)]
    pub pair: PairParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandlestickParams {
    #[serde(flatten)]
    pub pair: PairParams,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// Interval in seconds, as listed by `candlesticks_intervals`.
    pub interval: u64,
}

impl RestClient {
    pub async fn token_pairs(&self) -> ApiResult<Value> {
        self.send(&RequestSpec::get(self.config().endpoints.token_pairs.clone()))
            .await
    }

    pub async fn ticker(&self, pair: &PairParams) -> ApiResult<Value> {
        let spec = RequestSpec::get(self.config().endpoints.ticker.clone()).with_query(pair)?;
        self.send(&spec).await
    }

    pub async fn tickers(&self) -> ApiResult<Value> {
        self.send(&RequestSpec::get(self.config().endpoints.tickers.clone()))
            .await
    }

    /// Fails with a validation error, before any request, if either token is missing.
    pub async fn order_book(&self, params: &OrderBookParams) -> ApiResult<Value> {
        params.pair.validate()?;
        let spec =
            RequestSpec::get(self.config().endpoints.order_book.clone()).with_query(params)?;
        self.send(&spec).await
    }

    pub async fn trade_history(&self, pair: &PairParams) -> ApiResult<Value> {
        let spec =
            RequestSpec::get(self.config().endpoints.trade_history.clone()).with_query(pair)?;
        self.send(&spec).await
    }

    pub async fn candlesticks(&self, params: &CandlestickParams) -> ApiResult<Value> {
        let spec =
            RequestSpec::get(self.config().endpoints.candlesticks.clone()).with_query(params)?;
        self.send(&spec).await
    }

    pub async fn candlesticks_intervals(&self) -> ApiResult<Value> {
        self.send(&RequestSpec::get(
            self.config().endpoints.candlesticks_intervals.clone(),
        ))
        .await
    }

    pub async fn order_info(&self, order_hash: &str) -> ApiResult<Value> {
        let path = format!("{}/{}", self.config().endpoints.order, order_hash);
        self.send(&RequestSpec::get(path)).await
    }

    pub async fn fee_components(&self) -> ApiResult<Value> {
        self.send(&RequestSpec::get(self.config().endpoints.fee_components.clone()))
            .await
    }
}
