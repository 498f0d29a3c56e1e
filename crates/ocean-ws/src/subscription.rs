//! Per-channel subscription bookkeeping.
//!
//! Each channel owns one [`SubscriptionRegistry`]. A registry derives a
//! subscription key from the subscribe payload with its [`KeyStrategy`],
//! stores one callback per key and routes inbound payloads to it. Subscribing
//! again under an existing key replaces the previous entry.

use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

use crate::error::{WsError, WsResult};
use crate::message::{Channel, OutboundEnvelope};

const BASE_TOKEN: &str = "baseTokenAddress";
const QUOTE_TOKEN: &str = "quoteTokenAddress";
const INTERVAL: &str = "interval";
const USER_ID: &str = "userId";

/// Callback invoked with the payload of every message routed to a subscription.
pub type MessageCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Destination for subscribe and unsubscribe frames.
pub trait EnvelopeSink: Send + Sync {
    fn emit(&self, envelope: OutboundEnvelope) -> WsResult<()>;
}

impl<T: EnvelopeSink + ?Sized> EnvelopeSink for Arc<T> {
    fn emit(&self, envelope: OutboundEnvelope) -> WsResult<()> {
        (**self).emit(envelope)
    }
}

/// How a channel turns a payload into a subscription key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStrategy {
    /// `{channel}_{base}_{quote}`, or the bare channel name without a pair.
    Pair,
    /// `{channel}_{base}_{quote}_{interval}`.
    Candlestick,
    /// The `userId` of the payload, or the channel name.
    User,
}

impl KeyStrategy {
    pub fn for_channel(channel: Channel) -> Self {
        match channel {
            Channel::Candlesticks => Self::Candlestick,
            Channel::UserHistory | Channel::UserData => Self::User,
            Channel::OrderBook | Channel::TradeHistory | Channel::TickerStats => Self::Pair,
        }
    }

    pub fn subscription_key(&self, channel: Channel, payload: &Value) -> String {
        match self {
            Self::Pair => match (field(payload, BASE_TOKEN), field(payload, QUOTE_TOKEN)) {
                (Some(base), Some(quote)) => format!("{channel}_{base}_{quote}"),
                _ => channel.to_string(),
            },
            Self::Candlestick => format!(
                "{channel}_{}_{}_{}",
                field(payload, BASE_TOKEN).unwrap_or_default(),
                field(payload, QUOTE_TOKEN).unwrap_or_default(),
                field(payload, INTERVAL).unwrap_or_default(),
            ),
            Self::User => field(payload, USER_ID).unwrap_or_else(|| channel.to_string()),
        }
    }

    /// Payload sent with the unsubscribe frame for a subscription.
    pub fn unsubscribe_params(&self, payload: &Value) -> Value {
        let fields: &[&str] = match self {
            Self::Pair => &[BASE_TOKEN, QUOTE_TOKEN],
            Self::Candlestick => &[BASE_TOKEN, QUOTE_TOKEN, INTERVAL],
            Self::User => &[USER_ID],
        };
        let params: Map<String, Value> = fields
            .iter()
            .filter_map(|name| {
                payload
                    .get(*name)
                    .filter(|v| !v.is_null())
                    .map(|v| (name.to_string(), v.clone()))
            })
            .collect();
        Value::Object(params)
    }
}

fn field(payload: &Value, name: &str) -> Option<String> {
    match payload.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

struct Entry {
    id: u64,
    callback: MessageCallback,
    payload: Value,
    params: Value,
}

struct RegistryInner {
    channel: Channel,
    strategy: KeyStrategy,
    sink: Arc<dyn EnvelopeSink>,
    entries: RwLock<HashMap<String, Entry>>,
    next_id: AtomicU64,
}

impl RegistryInner {
    fn remove_if_current(&self, key: &str, id: u64) -> Option<Entry> {
        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|entry| entry.id == id) {
            entries.remove(key)
        } else {
            None
        }
    }
}

/// Subscriptions of a single channel.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriptionRegistry {
    pub fn new(channel: Channel, sink: Arc<dyn EnvelopeSink>) -> Self {
        Self::with_strategy(channel, KeyStrategy::for_channel(channel), sink)
    }

    pub fn with_strategy(
        channel: Channel,
        strategy: KeyStrategy,
        sink: Arc<dyn EnvelopeSink>,
    ) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                channel,
                strategy,
                sink,
                entries: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn channel(&self) -> Channel {
        self.inner.channel
    }

    pub fn strategy(&self) -> KeyStrategy {
        self.inner.strategy
    }

    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Emit a subscribe frame and record `callback` under the derived key.
    ///
    /// Nothing is recorded when the frame cannot be emitted.
    pub fn subscribe<F>(&self, payload: Value, callback: F) -> WsResult<SubscriptionHandle>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let inner = &self.inner;
        let key = inner.strategy.subscription_key(inner.channel, &payload);
        let params = inner.strategy.unsubscribe_params(&payload);

        inner
            .sink
            .emit(OutboundEnvelope::subscribe(inner.channel, payload.clone()))?;

        let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
        let replaced = inner.entries.write().insert(
            key.clone(),
            Entry {
                id,
                callback: Arc::new(callback),
                payload,
                params,
            },
        );
        debug!(
            channel = %inner.channel,
            key = %key,
            replaced = replaced.is_some(),
            "Subscribed"
        );

        Ok(SubscriptionHandle {
            registry: Arc::downgrade(inner),
            channel: inner.channel,
            key,
            id,
        })
    }

    /// Unsubscribe every entry of this channel. Returns how many were removed.
    pub fn unsubscribe_all(&self) -> usize {
        let drained: Vec<(String, Entry)> = self.inner.entries.write().drain().collect();
        let count = drained.len();
        for (key, entry) in drained {
            if let Err(e) = self
                .inner
                .sink
                .emit(OutboundEnvelope::unsubscribe(self.inner.channel, entry.params))
            {
                warn!(
                    channel = %self.inner.channel,
                    key = %key,
                    error = %e,
                    "Unsubscribe frame not sent"
                );
            }
        }
        if count > 0 {
            debug!(channel = %self.inner.channel, count, "Unsubscribed all");
        }
        count
    }

    /// Route an inbound payload to its subscription.
    ///
    /// The key is `channel_id` when the server supplies one, otherwise it is
    /// derived from the payload. Returns whether a callback ran.
    pub fn handle_message(&self, channel_id: Option<&str>, payload: &Value) -> bool {
        let key = match channel_id {
            Some(id) => id.to_string(),
            None => self.inner.strategy.subscription_key(self.inner.channel, payload),
        };

        let callback = self
            .inner
            .entries
            .read()
            .get(&key)
            .map(|entry| Arc::clone(&entry.callback));

        match callback {
            Some(callback) => {
                trace!(channel = %self.inner.channel, key = %key, "Dispatching message");
                callback(payload);
                true
            }
            None => {
                debug!(channel = %self.inner.channel, key = %key, "No subscription for message");
                false
            }
        }
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionInfo> {
        let mut infos: Vec<SubscriptionInfo> = self
            .inner
            .entries
            .read()
            .iter()
            .map(|(key, entry)| SubscriptionInfo {
                channel: self.inner.channel,
                key: key.clone(),
                payload: entry.payload.clone(),
                params: entry.params.clone(),
                handle: SubscriptionHandle {
                    registry: Arc::downgrade(&self.inner),
                    channel: self.inner.channel,
                    key: key.clone(),
                    id: entry.id,
                },
            })
            .collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("channel", &self.inner.channel)
            .field("strategy", &self.inner.strategy)
            .field("len", &self.len())
            .finish()
    }
}

/// Handle to one recorded subscription.
///
/// Handles go stale once their entry is replaced or removed, or once the
/// registry is gone; stale handles do nothing.
#[derive(Clone)]
pub struct SubscriptionHandle {
    registry: Weak<RegistryInner>,
    channel: Channel,
    key: String,
    id: u64,
}

impl SubscriptionHandle {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_active(&self) -> bool {
        let Some(inner) = self.registry.upgrade() else {
            return false;
        };
        let active = inner
            .entries
            .read()
            .get(&self.key)
            .is_some_and(|entry| entry.id == self.id);
        active
    }

    /// Remove the entry and emit its unsubscribe frame.
    ///
    /// Returns `Ok(false)` for a stale handle.
    pub fn unsubscribe(&self) -> WsResult<bool> {
        let Some(inner) = self.registry.upgrade() else {
            return Ok(false);
        };
        let Some(entry) = inner.remove_if_current(&self.key, self.id) else {
            return Ok(false);
        };
        debug!(channel = %self.channel, key = %self.key, "Unsubscribed");
        inner
            .sink
            .emit(OutboundEnvelope::unsubscribe(self.channel, entry.params))?;
        Ok(true)
    }

    /// Emit the subscribe frame again with the original payload.
    ///
    /// Returns `Ok(false)` for a stale handle.
    pub fn resubscribe(&self) -> WsResult<bool> {
        let Some(inner) = self.registry.upgrade() else {
            return Ok(false);
        };
        let payload = match inner.entries.read().get(&self.key) {
            Some(entry) if entry.id == self.id => entry.payload.clone(),
            _ => return Ok(false),
        };
        inner
            .sink
            .emit(OutboundEnvelope::subscribe(self.channel, payload))?;
        Ok(true)
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("channel", &self.channel)
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

/// Snapshot of an active subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionInfo {
    pub channel: Channel,
    pub key: String,
    /// Payload the subscription was made with.
    pub payload: Value,
    /// Payload its unsubscribe frame will carry.
    pub params: Value,
    pub handle: SubscriptionHandle,
}

/// Sink that records emitted envelopes instead of sending them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<OutboundEnvelope>>,
    failure: Mutex<Option<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundEnvelope> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    /// Make every following emit fail with `SendFailed(reason)`.
    pub fn set_failure(&self, reason: Option<&str>) {
        *self.failure.lock() = reason.map(str::to_string);
    }
}

impl EnvelopeSink for RecordingSink {
    fn emit(&self, envelope: OutboundEnvelope) -> WsResult<()> {
        if let Some(reason) = self.failure.lock().clone() {
            return Err(WsError::SendFailed(reason));
        }
        self.sent.lock().push(envelope);
        Ok(())
    }
}
