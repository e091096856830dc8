use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use room_core::protocol::{Ack, ClientFrame, RequestPayload, ServerFrame, ServerPush};

#[derive(Debug, Error)]
pub enum ChannelError {
    /// Request attempted while disconnected. There is no request queueing;
    /// the caller re-joins after the transport reconnects.
    #[error("channel unavailable")]
    Unavailable,
    #[error("connection closed before acknowledgement")]
    Closed,
    #[error("transport error: {0}")]
    Transport(String),
}

/// The bidirectional event channel as the room engine sees it: requests
/// with a single acknowledgement, fire-and-forget sends, and a push feed
/// every subscriber receives.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn request(&self, payload: RequestPayload) -> Result<Ack, ChannelError>;
    async fn send(&self, payload: RequestPayload) -> Result<(), ChannelError>;
    fn subscribe(&self) -> broadcast::Receiver<ServerPush>;
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Ack>>>>;
type WriterSlot = Arc<Mutex<Option<mpsc::Sender<ClientFrame>>>>;

/// WebSocket-backed channel. A writer task serializes outbound frames, a
/// reader task routes acknowledgements to their waiting request by id and
/// fans pushes out over a broadcast channel.
pub struct WsChannel {
    writer: WriterSlot,
    pending: PendingMap,
    pushes: broadcast::Sender<ServerPush>,
    next_id: AtomicU64,
}

impl WsChannel {
    pub async fn connect(url: &str) -> Result<Self, ChannelError> {
        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        tracing::info!(url, "connected");
        let (mut sink, mut source) = stream.split();

        let (tx, mut rx) = mpsc::channel::<ClientFrame>(32);
        let writer: WriterSlot = Arc::new(Mutex::new(Some(tx)));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (push_tx, _) = broadcast::channel(64);

        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                let json = match serde_json::to_string(&frame) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("failed to serialize frame: {e}");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json)).await {
                    tracing::error!("send failed: {e}");
                    break;
                }
            }
        });

        let reader_writer = Arc::clone(&writer);
        let reader_pending = Arc::clone(&pending);
        let reader_pushes = push_tx.clone();
        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerFrame>(&text) {
                            Ok(ServerFrame::Ack { id, ack }) => {
                                let waiter = reader_pending.lock().await.remove(&id);
                                match waiter {
                                    Some(tx) => {
                                        let _ = tx.send(ack);
                                    }
                                    None => {
                                        tracing::warn!(id, "acknowledgement with no waiter");
                                    }
                                }
                            }
                            Ok(ServerFrame::Push(push)) => {
                                tracing::debug!(?push, "push");
                                let _ = reader_pushes.send(push);
                            }
                            Err(e) => {
                                tracing::warn!("unparseable server frame: {e}");
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("server closed connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("websocket error: {e}");
                        break;
                    }
                }
            }

            // Disconnected: further requests fail fast, and dropping the
            // pending senders wakes every in-flight waiter with `Closed`.
            reader_writer.lock().await.take();
            reader_pending.lock().await.clear();
        });

        Ok(Self {
            writer,
            pending,
            pushes: push_tx,
            next_id: AtomicU64::new(1),
        })
    }

    /// Drop the connection locally. In-flight requests resolve to `Closed`.
    pub async fn close(&self) {
        self.writer.lock().await.take();
        self.pending.lock().await.clear();
    }

    async fn writer(&self) -> Result<mpsc::Sender<ClientFrame>, ChannelError> {
        self.writer
            .lock()
            .await
            .clone()
            .ok_or(ChannelError::Unavailable)
    }
}

#[async_trait]
impl Channel for WsChannel {
    async fn request(&self, payload: RequestPayload) -> Result<Ack, ChannelError> {
        let tx = self.writer().await?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (ack_tx, ack_rx) = oneshot::channel();
        self.pending.lock().await.insert(id, ack_tx);

        let event = payload.event();
        let frame = ClientFrame {
            id: Some(id),
            payload,
        };
        if tx.send(frame).await.is_err() {
            self.pending.lock().await.remove(&id);
            return Err(ChannelError::Unavailable);
        }
        tracing::debug!(event, id, "request");

        ack_rx.await.map_err(|_| ChannelError::Closed)
    }

    async fn send(&self, payload: RequestPayload) -> Result<(), ChannelError> {
        let tx = self.writer().await?;
        let event = payload.event();
        tx.send(ClientFrame { id: None, payload })
            .await
            .map_err(|_| ChannelError::Unavailable)?;
        tracing::debug!(event, "sent");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ServerPush> {
        self.pushes.subscribe()
    }
}
