//! In-memory transport pair.
//!
//! [`ChannelTransport::pair`] returns the local transport plus a
//! [`RemoteEnd`] that plays the browser: it reads the commands the session
//! sends and writes responses and events back. Used by tests, benches and
//! embedders that bridge BiDi over their own channel.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

use super::Transport;

// ============================================================================
// ChannelTransport
// ============================================================================

/// Local side of an in-memory transport.
pub struct ChannelTransport {
    outgoing: Option<mpsc::UnboundedSender<String>>,
    incoming: mpsc::UnboundedReceiver<String>,
}

impl ChannelTransport {
    /// Creates a connected transport and remote end.
    #[must_use]
    pub fn pair() -> (Self, RemoteEnd) {
        let (to_remote, from_local) = mpsc::unbounded_channel();
        let (to_local, from_remote) = mpsc::unbounded_channel();

        let transport = Self {
            outgoing: Some(to_remote),
            incoming: from_remote,
        };
        let remote = RemoteEnd {
            outgoing: Some(to_local),
            incoming: from_local,
        };

        (transport, remote)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&mut self, text: String) -> Result<()> {
        self.outgoing
            .as_ref()
            .ok_or(Error::TransportClosed)?
            .send(text)
            .map_err(|_| Error::TransportClosed)
    }

    async fn recv(&mut self) -> Option<Result<String>> {
        self.incoming.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<()> {
        self.outgoing.take();
        self.incoming.close();
        Ok(())
    }
}

// ============================================================================
// RemoteEnd
// ============================================================================

/// Remote side of an in-memory transport.
pub struct RemoteEnd {
    outgoing: Option<mpsc::UnboundedSender<String>>,
    incoming: mpsc::UnboundedReceiver<String>,
}

impl RemoteEnd {
    /// Receives the next frame the local end sent.
    ///
    /// Returns `None` once the local end closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.incoming.recv().await
    }

    /// Receives the next frame and parses it as JSON.
    ///
    /// Returns `None` once the local end closed or if the frame is not JSON.
    pub async fn recv_json(&mut self) -> Option<Value> {
        let text = self.recv().await?;
        serde_json::from_str(&text).ok()
    }

    /// Receives the next command, returning its id, method and params.
    pub async fn recv_command(&mut self) -> Option<(CommandId, String, Value)> {
        let value = self.recv_json().await?;
        let id = CommandId::new(value.get("id")?.as_u64()?);
        let method = value.get("method")?.as_str()?.to_owned();
        let params = value.get("params").cloned().unwrap_or(Value::Null);
        Some((id, method, params))
    }

    /// Sends a raw frame to the local end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportClosed`] if either side closed.
    pub fn send(&self, text: impl Into<String>) -> Result<()> {
        self.outgoing
            .as_ref()
            .ok_or(Error::TransportClosed)?
            .send(text.into())
            .map_err(|_| Error::TransportClosed)
    }

    /// Sends a JSON frame to the local end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportClosed`] if either side closed.
    pub fn send_json(&self, value: &Value) -> Result<()> {
        self.send(value.to_string())
    }

    /// Answers a command with a success response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportClosed`] if either side closed.
    pub fn respond_success(&self, id: CommandId, result: Value) -> Result<()> {
        self.send_json(&json!({ "id": id, "type": "success", "result": result }))
    }

    /// Answers a command with an error response.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportClosed`] if either side closed.
    pub fn respond_error(&self, id: CommandId, code: &str, message: &str) -> Result<()> {
        self.send_json(&json!({
            "id": id,
            "type": "error",
            "error": code,
            "message": message
        }))
    }

    /// Emits an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportClosed`] if either side closed.
    pub fn emit_event(&self, method: &str, params: Value) -> Result<()> {
        self.send_json(&json!({ "type": "event", "method": method, "params": params }))
    }

    /// Closes the remote side; the local end sees end of stream.
    pub fn close(&mut self) {
        self.outgoing.take();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frames_flow_both_ways() {
        let (mut transport, mut remote) = ChannelTransport::pair();

        transport
            .send(r#"{"id":1,"method":"session.status","params":{}}"#.into())
            .await
            .expect("send");

        let (id, method, _) = remote.recv_command().await.expect("command");
        assert_eq!(id, CommandId::new(1));
        assert_eq!(method, "session.status");

        remote
            .respond_success(id, json!({ "ready": true }))
            .expect("respond");

        let frame = transport.recv().await.expect("frame").expect("text");
        let value: Value = serde_json::from_str(&frame).expect("json");
        assert_eq!(value["result"]["ready"], true);
    }

    #[tokio::test]
    async fn test_remote_close_ends_stream() {
        let (mut transport, mut remote) = ChannelTransport::pair();
        remote.close();
        assert!(transport.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_local_close_ends_remote_stream() {
        let (mut transport, mut remote) = ChannelTransport::pair();
        transport.close().await.expect("close");
        assert!(remote.recv().await.is_none());
        assert!(matches!(
            transport.send("late".into()).await,
            Err(Error::TransportClosed)
        ));
    }
}
