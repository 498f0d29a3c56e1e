//! Stream subscription target for the `ocean-watch` binary.

use crate::error::{ClientError, ClientResult};
use ocean_core::validate_address;
use ocean_ws::{Channel, KeyStrategy};
use serde_json::{Map, Value};

/// What to subscribe to, as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub channel: Channel,
    pub base_token: Option<String>,
    pub quote_token: Option<String>,
    pub interval: Option<u64>,
    pub user_id: Option<String>,
}

impl WatchTarget {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            base_token: None,
            quote_token: None,
            interval: None,
            user_id: None,
        }
    }

    /// Check the fields the channel's key needs are present and well formed.
    pub fn validate(&self) -> ClientResult<()> {
        for address in [&self.base_token, &self.quote_token].into_iter().flatten() {
            validate_address(address).map_err(|e| ClientError::Config(e.to_string()))?;
        }
        let has_pair = self.base_token.is_some() && self.quote_token.is_some();
        match KeyStrategy::for_channel(self.channel) {
            KeyStrategy::Candlestick if !has_pair || self.interval.is_none() => {
                Err(ClientError::Config(format!(
                    "{} needs --base, --quote and --interval",
                    self.channel
                )))
            }
            KeyStrategy::Pair if self.base_token.is_some() != self.quote_token.is_some() => Err(
                ClientError::Config("--base and --quote go together".to_string()),
            ),
            _ => Ok(()),
        }
    }

    /// Subscribe payload in the relayer's field names.
    pub fn payload(&self) -> Value {
        let mut payload = Map::new();
        if let Some(base) = &self.base_token {
            payload.insert("baseTokenAddress".to_string(), Value::from(base.as_str()));
        }
        if let Some(quote) = &self.quote_token {
            payload.insert("quoteTokenAddress".to_string(), Value::from(quote.as_str()));
        }
        if let Some(interval) = self.interval {
            payload.insert("interval".to_string(), Value::from(interval));
        }
        if let Some(user_id) = &self.user_id {
            payload.insert("userId".to_string(), Value::from(user_id.as_str()));
        }
        Value::Object(payload)
    }
}
