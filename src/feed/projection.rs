use crate::domain::DeviceDirectory;
use crate::extensions::date_time_ext::ToRelative;
use crate::feed::buffer::{BufferedEvent, Snapshot};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub seq: u64,
    pub id: String,
    pub device: String,
    pub code: String,
    pub action: String,
    pub index: i64,
    pub created: String,
    pub payload: Payload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Collapsed,
    Expanded(String),
    /// The payload could not be formatted; only this row shows the error.
    Failed(String),
}

/// Per-row "show raw payload" state.
///
/// A row copies the global default when it is created. Changing the global default afterwards sets every row
/// present at that moment; toggling a single row affects that row only.
#[derive(Debug, Default)]
pub struct Projection {
    expanded_by_default: bool,
    expanded: HashMap<u64, bool>,
}

impl Projection {
    pub fn new(expanded_by_default: bool) -> Self {
        Projection {
            expanded_by_default,
            expanded: HashMap::new(),
        }
    }

    pub fn expanded_by_default(&self) -> bool {
        self.expanded_by_default
    }

    pub fn add_row(&mut self, seq: u64) -> bool {
        self.expanded.insert(seq, self.expanded_by_default);
        self.expanded_by_default
    }

    pub fn set_all(&mut self, expanded: bool) {
        self.expanded_by_default = expanded;
        self.expanded.values_mut().for_each(|row| *row = expanded);
    }

    /// Returns the new state, or `None` for an unknown row.
    pub fn toggle_row(&mut self, seq: u64) -> Option<bool> {
        let row = self.expanded.get_mut(&seq)?;
        *row = !*row;
        Some(*row)
    }

    pub fn is_expanded(&self, seq: u64) -> Option<bool> {
        self.expanded.get(&seq).copied()
    }

    /// Forgets rows whose events are no longer buffered.
    pub fn forget(&mut self, seqs: &[u64]) {
        for seq in seqs {
            self.expanded.remove(seq);
        }
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    pub fn render(&self, snapshot: &Snapshot, directory: &DeviceDirectory, now: DateTime<Utc>) -> Vec<RowView> {
        snapshot
            .iter()
            .map(|buffered| self.render_row(buffered, directory, now))
            .collect()
    }

    fn render_row(&self, buffered: &BufferedEvent, directory: &DeviceDirectory, now: DateTime<Utc>) -> RowView {
        let event = &buffered.event;
        let payload = match self.is_expanded(buffered.seq).unwrap_or(self.expanded_by_default) {
            false => Payload::Collapsed,
            true => match serde_json::to_string_pretty(&event.data) {
                Ok(json) => Payload::Expanded(json),
                Err(e) => Payload::Failed(e.to_string()),
            },
        };

        RowView {
            seq: buffered.seq,
            id: event.id.to_string(),
            device: directory.display_name(&event.device_uuid).to_string(),
            code: event.code.clone(),
            action: event.action.clone(),
            index: event.index,
            created: event.created_at.to_relative(now),
            payload,
        }
    }
}
