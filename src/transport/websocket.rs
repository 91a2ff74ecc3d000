//! WebSocket client transport.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};

use super::Transport;

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Transport over a WebSocket connection to a BiDi endpoint.
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketTransport {
    /// Connects to a `ws://` or `wss://` endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the URL is not a WebSocket URL or the
    ///   handshake fails
    /// - [`Error::ConnectionTimeout`] if the handshake does not finish in time
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self> {
        let parsed =
            Url::parse(url).map_err(|e| Error::connection(format!("invalid URL {url}: {e}")))?;

        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(Error::connection(format!(
                "unsupported scheme {} (expected ws or wss)",
                parsed.scheme()
            )));
        }

        let (stream, _response) = timeout(connect_timeout, connect_async(parsed.as_str()))
            .await
            .map_err(|_| Error::connection_timeout(connect_timeout.as_millis() as u64))?
            .map_err(|e| Error::connection(e.to_string()))?;

        debug!(url = %parsed, "WebSocket connected");
        Ok(Self { stream })
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, text: String) -> Result<()> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket closed by remote");
                    return None;
                }
                Ok(Message::Binary(bytes)) => {
                    warn!(len = bytes.len(), "Ignoring binary frame");
                }
                // Ping, Pong and raw frames are handled by tungstenite.
                Ok(_) => {}
                Err(e) => return Some(Err(Error::WebSocket(e))),
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(Error::WebSocket(e)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
