mod buffer;
mod command;
mod connection;
mod live_feed;
mod projection;
mod table;
#[cfg(test)]
pub mod test_support;

pub use command::{Command, CommandError, HELP};
pub use connection::{ConnectionState, RetryConfig};
pub use live_feed::{FeedOptions, FeedUpdate, LiveFeed};
pub use table::render_table;
