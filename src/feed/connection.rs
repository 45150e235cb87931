use crate::domain::{DeviceEvent, Filter};
use crate::transport::{PushClient, TransportError};
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::Sender;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, instrument, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Errored,
}

/// Something that happened on a subscription, tagged with the generation of the subscription it belongs to.
#[derive(Debug)]
pub struct Delivery {
    pub generation: u64,
    pub message: FeedMessage,
}

#[derive(Debug)]
pub enum FeedMessage {
    State(ConnectionState),
    Event(DeviceEvent),
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub retry_ms: u64,
    pub retry_max_delay: Duration,
}

#[derive(Error, Debug)]
enum ConnectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("the feed stopped listening")]
    FeedClosed,
}

/// Keeps a subscription for `filter` alive until the receiving side of `tx` is dropped or the task is aborted.
/// Ended or failed connections are retried with an exponential backoff.
#[instrument(skip(push_client, filter, tx, config), fields(transport = push_client.name()))]
pub async fn maintain(push_client: Arc<dyn PushClient>, filter: Filter, generation: u64, tx: Sender<Delivery>, config: RetryConfig) {
    let opened = Arc::new(AtomicBool::new(false));
    let strategy = Backoff::new(config, opened.clone()).map(jitter);

    let result = Retry::spawn(strategy, || {
        let push_client = push_client.clone();
        let filter = filter.clone();
        let tx = tx.clone();
        let opened = opened.clone();
        async move {
            let state = match connect(push_client.as_ref(), &filter, generation, &tx, &opened).await {
                Ok(_) => {
                    info!("✅ Event stream ended gracefully. Reconnecting...");
                    ConnectionState::Closed
                }
                Err(ConnectionError::FeedClosed) => return Ok(()),
                Err(e) => {
                    warn!("⚠️ Event stream error: {}. Retrying...", e);
                    ConnectionState::Errored
                }
            };

            match notify(&tx, generation, state).await {
                Ok(_) => Err("Event stream interrupted"), // Triggers retry
                Err(_) => Ok(()),
            }
        }
    })
    .await;

    match result {
        Ok(_) => debug!("Subscription {} stopped, the feed is gone", generation),
        Err(reason) => warn!("⚠️ Subscription {} gave up: {}", generation, reason),
    }
}

/// Exponential backoff whose first delay is `retry_ms`, doubling up to `retry_max_delay`.
/// Starts over once a connection has opened.
struct Backoff {
    config: RetryConfig,
    opened: Arc<AtomicBool>,
    delays: ExponentialBackoff,
}

impl Backoff {
    fn new(config: RetryConfig, opened: Arc<AtomicBool>) -> Self {
        let delays = Self::delays(&config);
        Backoff { config, opened, delays }
    }

    fn delays(config: &RetryConfig) -> ExponentialBackoff {
        ExponentialBackoff::from_millis(2)
            .factor((config.retry_ms / 2).max(1))
            .max_delay(config.retry_max_delay)
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.opened.swap(false, Ordering::Relaxed) {
            self.delays = Self::delays(&self.config);
        }
        self.delays.next()
    }
}

async fn connect(
    push_client: &dyn PushClient,
    filter: &Filter,
    generation: u64,
    tx: &Sender<Delivery>,
    opened: &AtomicBool,
) -> Result<(), ConnectionError> {
    notify(tx, generation, ConnectionState::Connecting).await?;
    let mut stream = push_client.connect(filter).await?;
    opened.store(true, Ordering::Relaxed);
    notify(tx, generation, ConnectionState::Open).await?;

    while let Some(message) = stream.next().await {
        match message?.decode() {
            Ok(Some(event)) => {
                debug!(device_uuid = %event.device_uuid, "🔸 Received event {} '{}' '{}'", event.id, event.code, event.action);
                send(tx, generation, FeedMessage::Event(event)).await?;
            }
            Ok(None) => trace!("Received a message without an event"),
            Err(e) => warn!("⚠️ Dropping malformed event: {}", e),
        }
    }

    Ok(())
}

async fn notify(tx: &Sender<Delivery>, generation: u64, state: ConnectionState) -> Result<(), ConnectionError> {
    send(tx, generation, FeedMessage::State(state)).await
}

async fn send(tx: &Sender<Delivery>, generation: u64, message: FeedMessage) -> Result<(), ConnectionError> {
    tx.send(Delivery { generation, message }).await.map_err(|_| ConnectionError::FeedClosed)
}
