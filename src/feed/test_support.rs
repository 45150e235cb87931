use crate::domain::Filter;
use crate::transport::{MessageStream, PushClient, PushMessage, TransportError};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub fn event_json(index: i64, code: &str) -> String {
    format!(
        r#"{{"id":{index},"device_uuid":"cam-1","code":"{code}","action":"start","index":{index},"data":{{"index":{index}}},"created_at":"2024-05-01T12:30:00Z"}}"#
    )
}

pub type Script = Vec<Result<PushMessage, TransportError>>;

/// Plays one script per connection, then keeps later connections open without messages.
#[derive(Debug)]
pub struct ScriptedClient {
    scripts: Mutex<VecDeque<Script>>,
    connections: AtomicUsize,
}

impl ScriptedClient {
    pub fn new(scripts: Vec<Script>) -> Self {
        ScriptedClient {
            scripts: Mutex::new(scripts.into()),
            connections: AtomicUsize::new(0),
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PushClient for ScriptedClient {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn connect(&self, _filter: &Filter) -> Result<MessageStream, TransportError> {
        self.connections.fetch_add(1, Ordering::SeqCst);
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(script) => Ok(stream::iter(script).boxed()),
            None => Ok(stream::pending().boxed()),
        }
    }
}

/// Hands every connection to the test, which pushes messages through the returned sender.
#[derive(Debug, Default)]
pub struct ChannelClient {
    connections: Mutex<Vec<(Filter, mpsc::UnboundedSender<Result<PushMessage, TransportError>>)>>,
}

impl ChannelClient {
    pub fn new() -> Self {
        ChannelClient::default()
    }

    pub fn connections(&self) -> usize {
        self.connections.lock().unwrap().len()
    }

    pub fn filter(&self, connection: usize) -> Filter {
        self.connections.lock().unwrap()[connection].0.clone()
    }

    /// Returns false when the connection has been closed by the feed.
    pub fn push(&self, connection: usize, message: PushMessage) -> bool {
        self.connections.lock().unwrap()[connection].1.send(Ok(message)).is_ok()
    }

    pub fn is_closed(&self, connection: usize) -> bool {
        self.connections.lock().unwrap()[connection].1.is_closed()
    }
}

#[async_trait]
impl PushClient for ChannelClient {
    fn name(&self) -> &'static str {
        "channel"
    }

    async fn connect(&self, filter: &Filter) -> Result<MessageStream, TransportError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.lock().unwrap().push((filter.clone(), tx));
        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}
