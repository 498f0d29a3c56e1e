//! Streaming client for the relayer.
//!
//! One websocket carries every channel. Subscriptions are tracked per channel
//! in a [`SubscriptionRegistry`] whose [`KeyStrategy`] decides how a subscribe
//! payload maps to a key; inbound envelopes are routed by that key.

pub mod channel_registry;
pub mod connection;
pub mod error;
pub mod message;
pub mod subscription;
pub mod ws_write_handle;

pub use channel_registry::ChannelRegistry;
pub use connection::{ConnectionState, StreamConfig, StreamTransport};
pub use error::{WsError, WsResult};
pub use message::{Channel, EnvelopeType, InboundEnvelope, OutboundEnvelope};
pub use subscription::{
    EnvelopeSink, KeyStrategy, MessageCallback, RecordingSink, SubscriptionHandle,
    SubscriptionInfo, SubscriptionRegistry,
};
pub use ws_write_handle::WsWriteHandle;

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Install the rustls crypto provider. Call before the first `wss://` connect.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
