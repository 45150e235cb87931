mod decoder;
mod server_sent_event;

pub use decoder::FrameDecoder;
pub use server_sent_event::ServerSentEvent;
