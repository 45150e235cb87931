use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// A single notification emitted by a camera device and recorded by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceEvent {
    pub id: EventId,
    pub device_uuid: String,
    pub code: String,
    pub action: String,
    pub index: i64,
    #[serde(default)]
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

/// The server assigns either numeric or string identifiers depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Number(i64),
    Text(String),
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EventId::Number(id) => write!(f, "{}", id),
            EventId::Text(id) => write!(f, "{}", id),
        }
    }
}
