//! REST API configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Relayer REST settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout (ms). Default: 10,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_base_url() -> String {
    "http://localhost:3000/api/v0".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            endpoints: Endpoints::default(),
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Join the base URL and an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Endpoint paths relative to `base_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub market_order_reserve: String,
    pub market_order_place: String,
    pub limit_order_reserve: String,
    pub limit_order_place: String,
    /// Cancel (`DELETE /order/{hash}`, `DELETE /order`) and order info (`GET /order/{hash}`).
    pub order: String,
    pub user_history: String,
    pub user_data: String,
    pub available_balance: String,
    pub committed_amount: String,
    pub token_pairs: String,
    pub ticker: String,
    pub tickers: String,
    pub order_book: String,
    pub trade_history: String,
    pub candlesticks: String,
    pub candlesticks_intervals: String,
    pub fee_components: String,
    pub auth_token: String,
    pub auth_refresh: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            market_order_reserve: "/market_order/reserve".to_string(),
            market_order_place: "/market_order/place".to_string(),
            limit_order_reserve: "/limit_order/reserve".to_string(),
            limit_order_place: "/limit_order/place".to_string(),
            order: "/order".to_string(),
            user_history: "/user_history".to_string(),
            user_data: "/user_data".to_string(),
            available_balance: "/available_balance".to_string(),
            committed_amount: "/committed_amount".to_string(),
            token_pairs: "/token_pairs".to_string(),
            ticker: "/ticker".to_string(),
            tickers: "/tickers".to_string(),
            order_book: "/order_book".to_string(),
            trade_history: "/trade_history".to_string(),
            candlesticks: "/candlesticks".to_string(),
            candlesticks_intervals: "/candlesticks/intervals".to_string(),
            fee_components: "/fee_components".to_string(),
            auth_token: "/auth/token".to_string(),
            auth_refresh: "/auth/refresh".to_string(),
        }
    }
}
