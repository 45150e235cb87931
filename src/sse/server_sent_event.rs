use serde::de::DeserializeOwned;

/// The fields of one `text/event-stream` frame, with the `data:` payload deserialized as `T`.
#[derive(Debug, PartialEq)]
pub struct ServerSentEvent<T> {
    pub id: Option<String>,
    pub event: Option<String>,
    pub retry: Option<usize>,
    pub comment: Option<String>,
    pub data: Option<T>,
}

impl<T> ServerSentEvent<T>
where
    T: DeserializeOwned,
{
    /// Parses a single frame. Multiple `data:` lines are joined with a newline before the JSON is deserialized.
    pub fn from_str(s: &str) -> Result<ServerSentEvent<T>, serde_json::Error> {
        let mut id = None;
        let mut event = None;
        let mut retry = None;
        let mut comment = None;
        let mut data_lines: Vec<&str> = Vec::new();

        for line in s.lines() {
            if let Some(value) = line.strip_prefix("id:") {
                id = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("event:") {
                event = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("retry:") {
                retry = value.trim().parse::<usize>().ok();
            } else if let Some(value) = line.strip_prefix(':') {
                comment = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("data:") {
                data_lines.push(value.strip_prefix(' ').unwrap_or(value));
            }
        }

        let data = match data_lines.is_empty() {
            true => None,
            false => Some(serde_json::from_str(&data_lines.join("\n"))?),
        };

        Ok(ServerSentEvent {
            id,
            event,
            retry,
            comment,
            data,
        })
    }
}
