//! Stream transport.
//!
//! Owns one websocket connection. Each successful `connect` builds a fresh
//! [`ChannelRegistry`] and spawns the read/write loop; the registry is dropped
//! when the connection ends. There is no automatic reconnect.

use crate::channel_registry::ChannelRegistry;
use crate::error::{WsError, WsResult};
use crate::message::Channel;
use crate::subscription::{SubscriptionHandle, SubscriptionInfo};
use crate::ws_write_handle::WsWriteHandle;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async_tls_with_config, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Stream connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_url")]
    pub url: String,
    /// Capacity of the outbound frame queue.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

fn default_url() -> String {
    "ws://localhost:3001".to_string()
}

fn default_outbound_buffer() -> usize {
    256
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

impl StreamConfig {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Connection URL, carrying the session token as `token=` when given.
    pub fn connect_url(&self, auth_token: Option<&str>) -> String {
        match auth_token {
            Some(token) => {
                let mut url = self.url.clone();
                let has_path = url
                    .split_once("://")
                    .is_some_and(|(_, rest)| rest.contains('/'));
                if !has_path && !url.contains('?') {
                    url.push('/');
                }
                let separator = if url.contains('?') { '&' } else { '?' };
                format!("{url}{separator}token={token}")
            }
            None => self.url.clone(),
        }
    }
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

struct Session {
    id: u64,
    registry: Arc<ChannelRegistry>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

/// Websocket transport multiplexing every channel over one connection.
pub struct StreamTransport {
    config: StreamConfig,
    state: Arc<RwLock<ConnectionState>>,
    session: Arc<RwLock<Option<Session>>>,
    next_session: AtomicU64,
}

impl StreamTransport {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            session: Arc::new(RwLock::new(None)),
            next_session: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected && self.session.read().is_some()
    }

    /// Open the connection. Resolves once the websocket handshake completes.
    ///
    /// Calling `connect` while connected is a no-op.
    pub async fn connect(&self, auth_token: Option<&str>) -> WsResult<()> {
        if self.is_connected() {
            debug!("Stream transport already connected");
            return Ok(());
        }

        *self.state.write() = ConnectionState::Connecting;
        info!(url = %self.config.url, authenticated = auth_token.is_some(), "Connecting to stream");

        let url = self.config.connect_url(auth_token);
        let ws_stream = match connect_async_tls_with_config(url, None, true, None).await {
            Ok((ws_stream, _response)) => ws_stream,
            Err(e) => {
                *self.state.write() = ConnectionState::Disconnected;
                let err = classify_connect_error(e);
                error!(error = %err, "Stream connection failed");
                return Err(err);
            }
        };
        let (write, read) = ws_stream.split();

        let (outbound_tx, outbound_rx) = mpsc::channel(self.config.outbound_buffer.max(1));
        let handle = WsWriteHandle::new(outbound_tx, Arc::clone(&self.state));
        let registry = Arc::new(ChannelRegistry::new(Arc::new(handle)));
        let shutdown = CancellationToken::new();
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);

        {
            // The session must be registered before the loop can observe it,
            // so the guard is held across the spawn.
            let mut current = self.session.write();
            *self.state.write() = ConnectionState::Connected;

            let task = tokio::spawn(run_connection(
                id,
                write,
                read,
                outbound_rx,
                Arc::clone(&registry),
                shutdown.clone(),
                Arc::clone(&self.state),
                Arc::clone(&self.session),
            ));

            *current = Some(Session {
                id,
                registry,
                shutdown,
                task,
            });
        }
        info!(session = id, "Stream connected");
        Ok(())
    }

    /// Close the connection and drop every subscription.
    pub async fn disconnect(&self) {
        let session = self.session.write().take();
        *self.state.write() = ConnectionState::Disconnected;

        let Some(session) = session else {
            return;
        };
        session.shutdown.cancel();
        if let Err(e) = session.task.await {
            warn!(error = %e, "Stream loop ended abnormally");
        }
        info!(session = session.id, "Stream disconnected");
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
        self.registry()?.subscribe(channel, payload, callback)
    }

    /// Unsubscribe everything on `channel`. Returns how many were removed.
    pub fn unsubscribe(&self, channel: Channel) -> WsResult<usize> {
        Ok(self.registry()?.unsubscribe(channel))
    }

    pub fn unsubscribe_all(&self) -> WsResult<usize> {
        Ok(self.registry()?.unsubscribe_all())
    }

    pub fn subscriptions(&self) -> WsResult<BTreeMap<Channel, Vec<SubscriptionInfo>>> {
        Ok(self.registry()?.subscriptions())
    }

    fn registry(&self) -> WsResult<Arc<ChannelRegistry>> {
        self.session
            .read()
            .as_ref()
            .map(|session| Arc::clone(&session.registry))
            .ok_or(WsError::NotConnected)
    }
}

impl Drop for StreamTransport {
    fn drop(&mut self) {
        if let Some(session) = self.session.write().take() {
            session.shutdown.cancel();
        }
    }
}

fn classify_connect_error(e: tungstenite::Error) -> WsError {
    match e {
        tungstenite::Error::Io(_)
        | tungstenite::Error::Tls(_)
        | tungstenite::Error::Http(_)
        | tungstenite::Error::Protocol(_) => WsError::Handshake(e.to_string()),
        other => WsError::ConnectionFailed(other.to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_connection(
    id: u64,
    mut write: WsSink,
    mut read: WsSource,
    mut outbound: mpsc::Receiver<String>,
    registry: Arc<ChannelRegistry>,
    shutdown: CancellationToken,
    state: Arc<RwLock<ConnectionState>>,
    session: Arc<RwLock<Option<Session>>>,
) {
    let result = message_loop(&mut write, &mut read, &mut outbound, &registry, &shutdown).await;
    drop(registry);
    match result {
        Ok(()) => debug!(session = id, "Stream loop finished"),
        Err(e) => warn!(session = id, error = %e, "Stream loop ended"),
    }

    // Only the current session may clear shared state.
    let mut current = session.write();
    if current.as_ref().is_some_and(|s| s.id == id) {
        *current = None;
        *state.write() = ConnectionState::Disconnected;
        info!(session = id, "Stream closed, subscriptions dropped");
    }
}

async fn message_loop(
    write: &mut WsSink,
    read: &mut WsSource,
    outbound: &mut mpsc::Receiver<String>,
    registry: &ChannelRegistry,
    shutdown: &CancellationToken,
) -> WsResult<()> {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                // Flush frames queued before the shutdown, e.g. unsubscribes.
                while let Ok(text) = outbound.try_recv() {
                    write.send(Message::Text(text)).await?;
                }
                if let Err(e) = write.send(Message::Close(None)).await {
                    warn!(error = %e, "Failed to send Close frame");
                }
                return Ok(());
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        registry.dispatch_text(&text);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        debug!("Received ping, sending pong");
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (f.code.into(), f.reason.to_string()))
                            .unwrap_or((1000, "Normal close".to_string()));
                        warn!(code, %reason, "Stream closed by server");
                        return Err(WsError::ConnectionClosed { code, reason });
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "Stream read error");
                        return Err(e.into());
                    }
                    None => {
                        warn!("Stream ended");
                        return Ok(());
                    }
                    _ => {}
                }
            }

            Some(text) = outbound.recv() => {
                write.send(Message::Text(text)).await?;
            }
        }
    }
}
