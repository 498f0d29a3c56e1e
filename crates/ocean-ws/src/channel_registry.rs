//! One subscription registry per stream channel.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::error::WsResult;
use crate::message::{Channel, InboundEnvelope};
use crate::subscription::{EnvelopeSink, SubscriptionHandle, SubscriptionInfo, SubscriptionRegistry};

/// Routes inbound envelopes to the registry of their channel.
#[derive(Debug)]
pub struct ChannelRegistry {
    registries: BTreeMap<Channel, SubscriptionRegistry>,
}

impl ChannelRegistry {
    pub fn new(sink: Arc<dyn EnvelopeSink>) -> Self {
        let registries = Channel::ALL
            .into_iter()
            .map(|channel| (channel, SubscriptionRegistry::new(channel, Arc::clone(&sink))))
            .collect();
        Self { registries }
    }

    pub fn registry(&self, channel: Channel) -> Option<&SubscriptionRegistry> {
        self.registries.get(&channel)
    }

    pub fn subscribe<F>(
        &self,
        channel: Channel,
        payload: Value,
        callback: F,
    ) -> WsResult<SubscriptionHandle>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.channel(channel).subscribe(payload, callback)
    }

    /// Drop every subscription of `channel`. Returns how many were removed.
    pub fn unsubscribe(&self, channel: Channel) -> usize {
        self.channel(channel).unsubscribe_all()
    }

    pub fn unsubscribe_all(&self) -> usize {
        self.registries.values().map(SubscriptionRegistry::unsubscribe_all).sum()
    }

    /// Route an envelope. Unknown channels and unmatched keys are dropped.
    pub fn dispatch(&self, envelope: &InboundEnvelope) -> bool {
        match envelope.channel.parse::<Channel>() {
            Ok(channel) => self
                .channel(channel)
                .handle_message(envelope.channel_id.as_deref(), &envelope.payload),
            Err(_) => {
                debug!(channel = %envelope.channel, "Message for unknown channel");
                false
            }
        }
    }

    /// Parse and route a text frame.
    pub fn dispatch_text(&self, text: &str) -> bool {
        match InboundEnvelope::parse(text) {
            Ok(envelope) => self.dispatch(&envelope),
            Err(e) => {
                debug!(error = %e, "Unparseable stream frame");
                false
            }
        }
    }

    /// Active subscriptions grouped by channel. Channels without any are omitted.
    pub fn subscriptions(&self) -> BTreeMap<Channel, Vec<SubscriptionInfo>> {
        self.registries
            .iter()
            .filter_map(|(channel, registry)| {
                let infos = registry.subscriptions();
                (!infos.is_empty()).then_some((*channel, infos))
            })
            .collect()
    }

    fn channel(&self, channel: Channel) -> &SubscriptionRegistry {
        // Every channel is registered in `new`.
        &self.registries[&channel]
    }
}
