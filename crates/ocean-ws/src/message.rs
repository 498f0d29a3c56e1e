//! Stream envelopes and channel names.
//!
//! Outbound frames are `{"type", "channel", "payload"}`; inbound frames are
//! `{"channel", "channelId", "payload"}`. Both travel as JSON text frames.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{WsError, WsResult};

/// Stream topics multiplexed over one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    OrderBook,
    Candlesticks,
    TradeHistory,
    UserHistory,
    UserData,
    TickerStats,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::OrderBook,
        Channel::Candlesticks,
        Channel::TradeHistory,
        Channel::UserHistory,
        Channel::UserData,
        Channel::TickerStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderBook => "order_book",
            Self::Candlesticks => "candlesticks",
            Self::TradeHistory => "trade_history",
            Self::UserHistory => "user_history",
            Self::UserData => "user_data",
            Self::TickerStats => "ticker_stats",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = WsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.as_str() == s)
            .ok_or_else(|| WsError::UnknownChannel(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeType {
    Subscribe,
    Unsubscribe,
}

/// Client to server frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    #[serde(rename = "type")]
    pub kind: EnvelopeType,
    pub channel: Channel,
    pub payload: Value,
}

impl OutboundEnvelope {
    pub fn subscribe(channel: Channel, payload: Value) -> Self {
        Self {
            kind: EnvelopeType::Subscribe,
            channel,
            payload,
        }
    }

    pub fn unsubscribe(channel: Channel, payload: Value) -> Self {
        Self {
            kind: EnvelopeType::Unsubscribe,
            channel,
            payload,
        }
    }

    pub fn to_json(&self) -> WsResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Server to client frame.
///
/// `channel` stays a string so frames for channels this client does not know
/// still parse and can be logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    pub channel: String,
    #[serde(rename = "channelId", default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl InboundEnvelope {
    pub fn parse(text: &str) -> WsResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
