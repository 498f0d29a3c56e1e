//! Mock stream server for integration tests.
//!
//! Provides a websocket server that can:
//! - Accept connections and record the request URI
//! - Record received text frames
//! - Push frames to, or close, every open connection

use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Clone)]
enum Command {
    Text(String),
    Close,
}

/// A mock stream server for testing.
pub struct MockWsServer {
    addr: SocketAddr,
    shutdown_tx: mpsc::Sender<()>,
    commands: broadcast::Sender<Command>,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
    uris: Arc<Mutex<Vec<String>>>,
}

impl MockWsServer {
    /// Start a new mock server on an available port.
    pub async fn start() -> Self {
        Self::start_with(false).await
    }

    /// Start a server that sends Close right after every handshake.
    pub async fn start_closing() -> Self {
        Self::start_with(true).await
    }

    async fn start_with(close_on_accept: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let messages: Arc<Mutex<VecDeque<String>>> = Arc::new(Mutex::new(VecDeque::new()));
        let connections: Arc<Mutex<u32>> = Arc::new(Mutex::new(0));
        let uris: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let (commands, _) = broadcast::channel(64);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let messages_clone = messages.clone();
        let connections_clone = connections.clone();
        let uris_clone = uris.clone();
        let commands_clone = commands.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    Ok((stream, _)) = listener.accept() => {
                        tokio::spawn(handle_connection(
                            stream,
                            messages_clone.clone(),
                            connections_clone.clone(),
                            uris_clone.clone(),
                            commands_clone.subscribe(),
                            close_on_accept,
                        ));
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            shutdown_tx,
            commands,
            messages,
            connections,
            uris,
        }
    }

    /// Get the server's websocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    pub async fn connection_count(&self) -> u32 {
        *self.connections.lock().await
    }

    /// Request URIs (path and query) of every accepted connection.
    pub async fn request_uris(&self) -> Vec<String> {
        self.uris.lock().await.clone()
    }

    pub async fn received_messages(&self) -> Vec<String> {
        self.messages.lock().await.iter().cloned().collect()
    }

    /// Received frames parsed as JSON.
    pub async fn received_json(&self) -> Vec<serde_json::Value> {
        self.received_messages()
            .await
            .iter()
            .filter_map(|m| serde_json::from_str(m).ok())
            .collect()
    }

    /// Wait until at least `count` frames have been received.
    pub async fn wait_for_messages(&self, count: usize) -> Vec<serde_json::Value> {
        let reached = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if self.messages.lock().await.len() >= count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await;
        assert!(
            reached.is_ok(),
            "expected {count} frames, got {:?}",
            self.received_messages().await
        );
        self.received_json().await
    }

    /// Send a text frame to every open connection.
    pub fn push(&self, frame: serde_json::Value) {
        let _ = self.commands.send(Command::Text(frame.to_string()));
    }

    /// Close every open connection from the server side.
    pub fn close_all(&self) {
        let _ = self.commands.send(Command::Close);
    }

    /// Shutdown the server.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

async fn handle_connection(
    stream: TcpStream,
    messages: Arc<Mutex<VecDeque<String>>>,
    connections: Arc<Mutex<u32>>,
    uris: Arc<Mutex<Vec<String>>>,
    mut commands: broadcast::Receiver<Command>,
    close_on_accept: bool,
) {
    let mut uri = None;
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        uri = Some(request.uri().to_string());
        Ok(response)
    };

    let ws_stream = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    if let Some(uri) = uri {
        uris.lock().await.push(uri);
    }
    {
        let mut count = connections.lock().await;
        *count += 1;
    }

    let (mut write, mut read) = ws_stream.split();

    if close_on_accept {
        let _ = write.send(Message::Close(None)).await;
        // Drain until the client acknowledges the close.
        while let Some(Ok(msg)) = read.next().await {
            if msg.is_close() {
                break;
            }
        }
        return;
    }

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        messages.lock().await.push_back(text);
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = write.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
            command = commands.recv() => {
                match command {
                    Ok(Command::Text(text)) => {
                        let _ = write.send(Message::Text(text)).await;
                    }
                    Ok(Command::Close) => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                    Err(_) => break,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_starts() {
        let server = MockWsServer::start().await;
        assert!(server.url().starts_with("ws://127.0.0.1:"));
        server.shutdown().await;
    }
}
