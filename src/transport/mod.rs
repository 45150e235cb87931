mod sse_client;
mod websocket_client;

use crate::app_config::Api;
use crate::domain::{DeviceEvent, Filter};
use crate::sse::ServerSentEvent;
use async_trait::async_trait;
use clap::ValueEnum;
use futures::stream::BoxStream;
use reqwest::Client;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

pub use sse_client::SseClient;
pub use websocket_client::WebSocketClient;

pub type MessageStream = BoxStream<'static, Result<PushMessage, TransportError>>;

/// A long-lived server-to-client channel. Dropping the returned stream closes the connection.
#[async_trait]
pub trait PushClient: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    async fn connect(&self, filter: &Filter) -> Result<MessageStream, TransportError>;
}

/// A single message as delivered by a transport, not yet decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum PushMessage {
    /// A server-sent event frame, possibly without data (keep-alive comments).
    Frame(String),
    /// A websocket text frame holding one JSON event.
    Text(String),
}

impl PushMessage {
    /// Returns `None` for messages that carry no event.
    pub fn decode(&self) -> Result<Option<DeviceEvent>, serde_json::Error> {
        match self {
            PushMessage::Frame(frame) => Ok(ServerSentEvent::<DeviceEvent>::from_str(frame)?.data),
            PushMessage::Text(text) => serde_json::from_str(text).map(Some),
        }
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] tungstenite::http::header::InvalidHeaderValue),
    #[error("no data for {} seconds", .0.as_secs())]
    Stale(Duration),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TransportKind {
    Sse,
    Websocket,
}

pub fn new_push_client(kind: TransportKind, client: Client, config: &Api) -> Result<Arc<dyn PushClient>, TransportError> {
    let push_client: Arc<dyn PushClient> = match kind {
        TransportKind::Sse => Arc::new(SseClient::new(client, config.url(), config.stale_connection_timeout())?),
        TransportKind::Websocket => Arc::new(WebSocketClient::new(config.websocket_url(), config.session_token())?),
    };
    Ok(push_client)
}
