use crate::domain::DeviceEvent;
use std::collections::VecDeque;
use std::sync::Arc;

/// An event as it sits in the buffer. `seq` numbers events in arrival order and identifies the row showing it.
#[derive(Debug, PartialEq)]
pub struct BufferedEvent {
    pub seq: u64,
    pub event: DeviceEvent,
}

pub type Snapshot = Arc<VecDeque<Arc<BufferedEvent>>>;

/// Outcome of a `prepend`: the sequence number of the new event and those of the events pushed out by `max_events`.
#[derive(Debug, PartialEq)]
pub struct Prepended {
    pub seq: u64,
    pub evicted: Vec<u64>,
}

/// Newest-first log of received events, in arrival order.
///
/// Snapshots are copy-on-write: a snapshot taken before a `prepend` or `clear` never changes afterwards.
#[derive(Debug)]
pub struct EventBuffer {
    events: Snapshot,
    max_events: Option<usize>,
    next_seq: u64,
}

impl EventBuffer {
    pub fn new(max_events: Option<usize>) -> Self {
        EventBuffer {
            events: Arc::new(VecDeque::new()),
            max_events: max_events.filter(|max| *max > 0),
            next_seq: 1,
        }
    }

    /// Inserts `event` at the front. Events are never deduplicated; the oldest are dropped beyond `max_events`.
    pub fn prepend(&mut self, event: DeviceEvent) -> Prepended {
        let seq = self.next_seq;
        self.next_seq += 1;

        let events = Arc::make_mut(&mut self.events);
        events.push_front(Arc::new(BufferedEvent { seq, event }));
        let evicted = match self.max_events {
            Some(max_events) if events.len() > max_events => events.drain(max_events..).map(|buffered| buffered.seq).collect(),
            _ => Vec::new(),
        };
        Prepended { seq, evicted }
    }

    pub fn clear(&mut self) {
        self.events = Arc::new(VecDeque::new());
    }

    pub fn snapshot(&self) -> Snapshot {
        self.events.clone()
    }
}
