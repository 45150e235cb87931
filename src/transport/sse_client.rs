use crate::domain::Filter;
use crate::sse::FrameDecoder;
use crate::transport::{MessageStream, PushClient, PushMessage, TransportError};
use async_trait::async_trait;
use futures::stream;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use std::collections::VecDeque;
use std::time::Duration;
use tokio_stream::StreamExt;
use tracing::{error, info, instrument, warn};
use url::Url;

#[derive(Debug)]
pub struct SseClient {
    client: Client,
    events_url: Url,
    stale_connection_timeout: Duration,
}

impl SseClient {
    pub fn new(client: Client, base_url: &str, stale_connection_timeout: Duration) -> Result<Self, TransportError> {
        Ok(SseClient {
            client,
            events_url: Url::parse(&format!("{}/api/events", base_url))?,
            stale_connection_timeout,
        })
    }
}

#[async_trait]
impl PushClient for SseClient {
    fn name(&self) -> &'static str {
        "sse"
    }

    #[instrument(skip_all)]
    async fn connect(&self, filter: &Filter) -> Result<MessageStream, TransportError> {
        let mut url = self.events_url.clone();
        filter.apply_to(&mut url);

        info!("Connecting to SSE stream {}...", url);
        let response = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?
            .error_for_status()?;

        if response.status() == StatusCode::OK {
            info!(status = %response.status(), "Connecting to SSE stream {}... OK", url);
        }

        let stale_connection_timeout = self.stale_connection_timeout;
        let chunks = Box::pin(response.bytes_stream().timeout(stale_connection_timeout));
        let frames = stream::unfold(
            (chunks, FrameDecoder::new(), VecDeque::new()),
            move |(mut chunks, mut decoder, mut pending)| async move {
                loop {
                    if let Some(frame) = pending.pop_front() {
                        return Some((Ok(PushMessage::Frame(frame)), (chunks, decoder, pending)));
                    }

                    match chunks.next().await {
                        Some(Ok(Ok(chunk))) => pending.extend(decoder.push(&chunk)),
                        Some(Ok(Err(e))) => {
                            error!("❌ SSE stream error: {}", e);
                            return Some((Err(TransportError::Request(e)), (chunks, decoder, pending)));
                        }
                        Some(Err(_)) => {
                            warn!("⏳ No data for {} seconds", stale_connection_timeout.as_secs());
                            return Some((Err(TransportError::Stale(stale_connection_timeout)), (chunks, decoder, pending)));
                        }
                        None => {
                            warn!("🔴 SSE stream ended");
                            return None;
                        }
                    }
                }
            },
        );

        Ok(Box::pin(frames))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use std::error::Error;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn frame(id: u32, code: &str) -> String {
        format!(
            "id: {id}\ndata: {{\"id\":{id},\"device_uuid\":\"cam-1\",\"code\":\"{code}\",\"action\":\"start\",\"index\":{id},\"created_at\":\"2024-05-01T12:30:00Z\"}}\n\n"
        )
    }

    #[tokio::test]
    async fn connect_streams_frames_from_the_response() -> Result<(), Box<dyn Error>> {
        let mut server = mockito::Server::new_async().await;
        let body = format!("{}: keep-alive\n\n{}", frame(1, "VideoMotion"), frame(2, "TamperDetected"));

        let mock = server
            .mock("GET", "/api/events")
            .match_header("accept", "text/event-stream")
            .with_status(200)
            .with_header("content-type", "text/event-stream")
            .with_body(body)
            .create_async()
            .await;

        let sse_client = SseClient::new(Client::new(), &server.url(), Duration::from_secs(5))?;
        let messages: Vec<_> = sse_client.connect(&Filter::default()).await?.collect().await;

        mock.assert_async().await;
        assert_eq!(messages.len(), 3);

        let codes: Vec<String> = messages
            .iter()
            .filter_map(|message| message.as_ref().ok())
            .filter_map(|message| message.decode().ok().flatten())
            .map(|event| event.code)
            .collect();
        assert_eq!(codes, vec!["VideoMotion", "TamperDetected"]);
        Ok(())
    }

    #[tokio::test]
    async fn connect_sends_the_filter_as_query_parameters() -> Result<(), Box<dyn Error>> {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/api/events")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("device-uuids".into(), "cam-1".into()),
                Matcher::UrlEncoded("codes".into(), "VideoMotion".into()),
            ]))
            .with_status(200)
            .with_body("")
            .create_async()
            .await;

        let filter = Filter::new(vec!["cam-1".to_string()], vec!["VideoMotion".to_string()], vec![]);
        let sse_client = SseClient::new(Client::new(), &server.url(), Duration::from_secs(5))?;
        let messages: Vec<_> = sse_client.connect(&filter).await?.collect().await;

        mock.assert_async().await;
        assert!(messages.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn connect_fails_for_an_error_status() -> Result<(), Box<dyn Error>> {
        let mut server = mockito::Server::new_async().await;

        let _mock = server.mock("GET", "/api/events").with_status(503).create_async().await;

        let sse_client = SseClient::new(Client::new(), &server.url(), Duration::from_secs(5))?;
        let result = sse_client.connect(&Filter::default()).await;

        assert!(matches!(result, Err(TransportError::Request(_))));
        Ok(())
    }

    #[tokio::test]
    async fn a_silent_connection_is_reported_as_stale() -> Result<(), Box<dyn Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await?;
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await?;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n6\r\n: hi\n\n\r\n")
                .await?;
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, std::io::Error>(socket)
        });

        let stale_connection_timeout = Duration::from_millis(300);
        let sse_client = SseClient::new(Client::new(), &format!("http://{}", address), stale_connection_timeout)?;
        let mut messages = sse_client.connect(&Filter::default()).await?;

        let first = tokio::time::timeout(Duration::from_secs(3), messages.next()).await?;
        assert!(matches!(first, Some(Ok(PushMessage::Frame(frame))) if frame == ": hi"));

        let second = tokio::time::timeout(Duration::from_secs(3), messages.next()).await?;
        assert!(matches!(second, Some(Err(TransportError::Stale(timeout))) if timeout == stale_connection_timeout));

        server.abort();
        Ok(())
    }
}
