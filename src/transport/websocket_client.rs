use crate::domain::Filter;
use crate::transport::{MessageStream, PushClient, PushMessage, TransportError};
use async_trait::async_trait;
use futures::{StreamExt, future};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tracing::{debug, info, instrument};
use url::Url;

/// Subscribes through the unified `/v1/ws` socket, every text frame holds a single event.
#[derive(Debug)]
pub struct WebSocketClient {
    socket_url: Url,
    session_token: Option<String>,
}

impl WebSocketClient {
    pub fn new(base_url: &str, session_token: Option<&str>) -> Result<Self, TransportError> {
        Ok(WebSocketClient {
            socket_url: Url::parse(&format!("{}/v1/ws", base_url))?,
            session_token: session_token.map(str::to_string),
        })
    }
}

#[async_trait]
impl PushClient for WebSocketClient {
    fn name(&self) -> &'static str {
        "websocket"
    }

    #[instrument(skip_all)]
    async fn connect(&self, filter: &Filter) -> Result<MessageStream, TransportError> {
        let mut url = self.socket_url.clone();
        filter.apply_to(&mut url);

        let mut request = url.as_str().into_client_request()?;
        if let Some(token) = &self.session_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        info!("Connecting to websocket {}...", url);
        let (socket, response) = connect_async(request).await?;
        info!(status = %response.status(), "Connecting to websocket {}... OK", url);

        let messages = socket
            .take_while(|message| future::ready(!matches!(message, Ok(Message::Close(_)))))
            .filter_map(|message| {
                future::ready(match message {
                    Ok(Message::Text(text)) => Some(Ok(PushMessage::Text(text.as_str().to_owned()))),
                    Ok(other) => {
                        debug!("Ignoring websocket message {:?}", other);
                        None
                    }
                    Err(e) => Some(Err(TransportError::WebSocket(e))),
                })
            });

        Ok(messages.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::SinkExt;
    use std::error::Error;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    const EVENT: &str = r#"{"id":"a1","device_uuid":"cam-1","code":"VideoMotion","action":"start","index":0,"created_at":"2024-05-01T12:30:00Z"}"#;

    #[tokio::test]
    async fn connect_streams_text_frames_until_close() -> Result<(), Box<dyn Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        let server = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await?;
            let mut socket = accept_async(tcp).await?;
            socket.send(Message::Text(EVENT.into())).await?;
            socket.send(Message::Ping(vec![1].into())).await?;
            socket.send(Message::Text("garbage".into())).await?;
            socket.send(Message::Close(None)).await?;
            Ok::<(), tokio_tungstenite::tungstenite::Error>(())
        });

        let websocket_client = WebSocketClient::new(&format!("ws://{}", address), Some("secret"))?;
        let messages: Vec<_> = websocket_client.connect(&Filter::default()).await?.collect().await;
        server.await??;

        let texts: Vec<PushMessage> = messages.into_iter().filter_map(Result::ok).collect();
        assert_eq!(texts, vec![PushMessage::Text(EVENT.to_string()), PushMessage::Text("garbage".to_string())]);
        Ok(())
    }

    #[test]
    fn new_builds_the_socket_url() -> Result<(), TransportError> {
        let websocket_client = WebSocketClient::new("ws://nvr.local:8080", None)?;

        assert_eq!(websocket_client.socket_url.as_str(), "ws://nvr.local:8080/v1/ws");
        Ok(())
    }
}
