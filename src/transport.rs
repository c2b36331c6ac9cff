//! Connection to the coordinator. The engine only ever sees the
//! [`Transport`] trait for outbound traffic and an mpsc receiver for
//! inbound events, so tests can drive it without a socket.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::events::{ClientEvent, ServerEvent};

/// Outbound half of the coordinator connection. Created once per process
/// and shared read-only; components hold an `Arc<dyn Transport>`.
pub trait Transport: Send + Sync {
    fn send(&self, event: ClientEvent) -> Result<(), ChatError>;
}

/// Websocket transport speaking JSON text frames.
pub struct WsTransport {
    tx: UnboundedSender<ClientEvent>,
}

impl WsTransport {
    /// Connect and return the outbound handle plus the inbound event
    /// stream. Dropping the receiver tears the subscription down; a
    /// reconnect builds a fresh pair, so handlers can never be bound
    /// twice.
    pub async fn connect(
        url: &str,
    ) -> Result<(Arc<Self>, UnboundedReceiver<ServerEvent>), ChatError> {
        let (socket, _) = connect_async(url).await?;
        let (mut sink, mut stream) = socket.split();

        let (out_tx, mut out_rx) = unbounded_channel::<ClientEvent>();
        let (in_tx, in_rx) = unbounded_channel::<ServerEvent>();

        tokio::spawn(async move {
            while let Some(event) = out_rx.recv().await {
                let frame = match serde_json::to_string(&event) {
                    Ok(f) => f,
                    Err(e) => {
                        warn!(error = %e, "failed to serialize outbound event");
                        continue;
                    }
                };
                if let Err(e) = sink.send(WsMessage::Text(frame)).await {
                    warn!(error = %e, "websocket send failed");
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            if in_tx.send(event).is_err() {
                                break;
                            }
                        }
                        // One malformed frame must not take the stream down.
                        Err(e) => warn!(error = %e, frame = %text, "ignoring malformed frame"),
                    },
                    Ok(WsMessage::Close(_)) => {
                        debug!("coordinator closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "websocket receive failed");
                        break;
                    }
                }
            }
        });

        Ok((Arc::new(Self { tx: out_tx }), in_rx))
    }
}

impl Transport for WsTransport {
    fn send(&self, event: ClientEvent) -> Result<(), ChatError> {
        self.tx.send(event).map_err(|_| ChatError::TransportClosed)
    }
}

/// In-process bus: records everything sent. Used by tests and embedders
/// that fan events in themselves.
#[derive(Default)]
pub struct LocalBus {
    sent: Mutex<Vec<ClientEvent>>,
}

impl LocalBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// All events sent so far, in order.
    pub fn sent(&self) -> Vec<ClientEvent> {
        self.sent.lock().clone()
    }

    /// Drain the recorded events.
    pub fn take_sent(&self) -> Vec<ClientEvent> {
        std::mem::take(&mut self.sent.lock())
    }
}

impl Transport for LocalBus {
    fn send(&self, event: ClientEvent) -> Result<(), ChatError> {
        self.sent.lock().push(event);
        Ok(())
    }
}
