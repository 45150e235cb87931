use crate::domain::{DeviceDirectory, Filter};
use crate::feed::buffer::{EventBuffer, Prepended, Snapshot};
use crate::feed::connection::{self, ConnectionState, Delivery, FeedMessage, RetryConfig};
use crate::feed::projection::{Projection, RowView};
use crate::transport::PushClient;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// The live event feed: one subscription for the active filter, the buffer it fills and the row state
/// projected from it.
///
/// Every filter change tears the running subscription down and waits for it before the buffer is cleared and
/// a new subscription starts. Deliveries carry the generation of the subscription that produced them, so
/// anything still queued from an older subscription is discarded instead of mixing into the new buffer.
#[derive(Debug)]
pub struct LiveFeed {
    push_client: Arc<dyn PushClient>,
    retry: RetryConfig,
    filter: Filter,
    buffer: EventBuffer,
    projection: Projection,
    generation: u64,
    subscription: Option<JoinHandle<()>>,
    state: ConnectionState,
    open_since: Option<DateTime<Utc>>,
    tx: Sender<Delivery>,
    rx: Receiver<Delivery>,
}

#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub retry: RetryConfig,
    pub channel_buffer_size: usize,
    pub max_events: Option<usize>,
    pub expanded: bool,
}

impl LiveFeed {
    pub fn new(push_client: Arc<dyn PushClient>, filter: Filter, options: FeedOptions) -> Self {
        let (tx, rx) = mpsc::channel(options.channel_buffer_size.max(1));
        LiveFeed {
            push_client,
            retry: options.retry,
            filter,
            buffer: EventBuffer::new(options.max_events),
            projection: Projection::new(options.expanded),
            generation: 0,
            subscription: None,
            state: ConnectionState::Idle,
            open_since: None,
            tx,
            rx,
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// When the current connection opened, `None` unless it is open.
    pub fn open_since(&self) -> Option<DateTime<Utc>> {
        self.open_since
    }

    pub fn snapshot(&self) -> Snapshot {
        self.buffer.snapshot()
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn rows(&self, directory: &DeviceDirectory, now: DateTime<Utc>) -> Vec<RowView> {
        self.projection.render(&self.buffer.snapshot(), directory, now)
    }

    /// Starts the subscription for the current filter, replacing a running one.
    #[instrument(skip(self), fields(filter = %self.filter.to_query_string()))]
    pub async fn subscribe(&mut self) {
        self.teardown().await;

        self.generation += 1;
        self.buffer.clear();
        self.projection.clear();

        info!("📡 Subscribing to events, subscription {}", self.generation);
        let task = connection::maintain(
            self.push_client.clone(),
            self.filter.clone(),
            self.generation,
            self.tx.clone(),
            self.retry.clone(),
        );
        self.subscription = Some(tokio::spawn(task));
    }

    /// Stops the running subscription, if any, and waits until its connection is closed.
    pub async fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!("Closing subscription {}...", self.generation);
            subscription.abort();
            let _ = subscription.await;
            debug!("Closing subscription {}... OK", self.generation);
        }
        self.state = ConnectionState::Idle;
        self.open_since = None;
    }

    /// Tears the feed down for good, discarding the buffer.
    pub async fn shutdown(&mut self) {
        self.teardown().await;
        self.buffer.clear();
        self.projection.clear();
        info!("📡 Live feed stopped");
    }

    pub async fn set_device_ids(&mut self, ids: Vec<String>) {
        self.filter.set_device_ids(ids);
        self.subscribe().await;
    }

    pub async fn set_codes(&mut self, codes: Vec<String>) {
        self.filter.set_codes(codes);
        self.subscribe().await;
    }

    pub async fn set_actions(&mut self, actions: Vec<String>) {
        self.filter.set_actions(actions);
        self.subscribe().await;
    }

    pub async fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.subscribe().await;
    }

    pub fn set_all_expanded(&mut self, expanded: bool) {
        self.projection.set_all(expanded);
    }

    pub fn toggle_row(&mut self, seq: u64) -> Option<bool> {
        self.projection.toggle_row(seq)
    }

    /// Waits for the next delivery of the current subscription and applies it.
    pub async fn recv(&mut self) -> Option<FeedUpdate> {
        loop {
            let delivery = self.rx.recv().await?;
            if let Some(update) = self.apply(delivery) {
                return Some(update);
            }
        }
    }

    fn apply(&mut self, delivery: Delivery) -> Option<FeedUpdate> {
        if delivery.generation != self.generation || self.subscription.is_none() {
            debug!("Discarding delivery of superseded subscription {}", delivery.generation);
            return None;
        }

        match delivery.message {
            FeedMessage::State(state) => {
                debug!("Connection state {:?} -> {:?}", self.state, state);
                self.open_since = match state {
                    ConnectionState::Open => Some(Utc::now()),
                    _ => None,
                };
                self.state = state;
                Some(FeedUpdate::State(state))
            }
            FeedMessage::Event(event) => {
                let Prepended { seq, evicted } = self.buffer.prepend(event);
                self.projection.add_row(seq);
                self.projection.forget(&evicted);
                Some(FeedUpdate::Event(seq))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedUpdate {
    State(ConnectionState),
    Event(u64),
}
