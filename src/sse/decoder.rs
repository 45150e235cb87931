/// Splits a byte stream into server-sent event frames. Frames are separated by a blank line and may
/// arrive split over, or batched into, arbitrary chunks.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        FrameDecoder::default()
    }

    /// Feeds a chunk and returns every frame it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|window| window == b"\n\n") {
            let frame: Vec<u8> = self.buffer.drain(..end + 2).collect();
            let text = String::from_utf8_lossy(&frame[..end]);
            if !text.trim().is_empty() {
                frames.push(text.into_owned());
            }
        }
        frames
    }
}
