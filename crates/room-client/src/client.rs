use crate::types;
use crate::types::MicrophoneOptions;
use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

pub mod config;
mod consts;
mod utils;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
type ServerTx = tokio::sync::broadcast::Sender<types::ServerEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<types::ServerEvent>;

/// Websocket client for the room service.
///
/// Client events are serialized onto the socket by a send task; server events
/// are deserialized by a recv task and fanned out over a broadcast channel to
/// any number of subscribers.
pub struct Client {
    capacity: usize,
    config: config::Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
}

impl Client {
    fn new(capacity: usize, config: config::Config) -> Self {
        Self {
            capacity,
            config,
            c_tx: None,
            s_tx: None,
        }
    }

    async fn connect(&mut self) -> Result<()> {
        if self.c_tx.is_some() {
            return Err(anyhow::anyhow!("already connected"));
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;

        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) = tokio::sync::mpsc::channel(self.capacity);
        let (s_tx, _) = tokio::sync::broadcast::channel(self.capacity);

        self.c_tx = Some(c_tx.clone());
        self.s_tx = Some(s_tx.clone());

        tokio::spawn(async move {
            while let Some(event) = c_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                    }
                }
            }
        });

        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => {
                        if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                            let event_type = json.get("type").and_then(|v| v.as_str());
                            tracing::debug!(
                                "received message: {}",
                                event_type.unwrap_or("unknown")
                            );
                        }
                        match serde_json::from_str::<types::ServerEvent>(&text) {
                            Ok(event) => {
                                if let Err(e) = s_tx.send(event) {
                                    tracing::error!("failed to send event: {}", e);
                                }
                            }
                            Err(e) => {
                                tracing::error!(
                                    "failed to deserialize event: {}, text=> {:?}",
                                    e,
                                    text
                                );
                            }
                        }
                    }
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message: {} bytes", bin.len());
                    }
                    Message::Close(frame) => {
                        let reason = frame.map(|f| f.reason.to_string());
                        tracing::info!("connection closed: {:?}", reason);
                        if s_tx.send(types::ServerEvent::Close { reason }).is_err() {
                            tracing::debug!("no subscribers for close event");
                        }
                        break;
                    }
                    _ => {}
                }
            }
        });
        Ok(())
    }

    /// Subscribes to the server event broadcast.
    pub async fn server_events(&mut self) -> Result<ServerRx> {
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    async fn send_client_event(&mut self, event: types::ClientEvent) -> Result<()> {
        match self.c_tx {
            Some(ref tx) => {
                tx.send(event).await?;
                Ok(())
            }
            None => Err(anyhow::anyhow!("not connected yet")),
        }
    }

    /// Requests publication of the local microphone track. The transport may
    /// still refuse (no device, no permission); that surfaces as an `error`
    /// server event, not as a failure here.
    pub async fn publish_microphone(&mut self, options: MicrophoneOptions) -> Result<()> {
        let event = types::ClientEvent::MicrophonePublish(
            types::events::client::MicrophonePublishEvent::new(options),
        );
        self.send_client_event(event).await
    }

    pub async fn unmute_microphone(&mut self) -> Result<()> {
        let event = types::ClientEvent::MicrophoneUnmute(
            types::events::client::MicrophoneUnmuteEvent::new(),
        );
        self.send_client_event(event).await
    }

    /// Asks the server to drop us from the room. The recv task ends when the
    /// server acknowledges with a close frame.
    pub async fn leave(&mut self) -> Result<()> {
        let event = types::ClientEvent::Leave(types::events::client::LeaveEvent::new());
        self.send_client_event(event).await
    }
}

pub async fn connect_with_config(capacity: usize, config: config::Config) -> Result<Client> {
    let mut client = Client::new(capacity, config);
    client.connect().await?;
    Ok(client)
}

pub async fn connect(config: config::Config) -> Result<Client> {
    connect_with_config(consts::DEFAULT_CAPACITY, config).await
}
