use crate::midi::{MidiError, MidiTransport, Result};
use std::collections::VecDeque;

/// In-memory transport. Records everything written and replays queued inbound chunks.
#[derive(Debug, Default)]
pub struct MockMidiTransport {
    pub connected: bool,
    /// Upper bound on bytes accepted per write; `None` accepts everything.
    pub write_limit: Option<usize>,
    pub fail_writes: bool,
    pub written: Vec<u8>,
    pub flushes: usize,
    inbound: VecDeque<Vec<u8>>,
}

impl MockMidiTransport {
    pub fn connected() -> Self {
        MockMidiTransport {
            connected: true,
            ..Default::default()
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn queue_inbound(&mut self, bytes: &[u8]) {
        self.inbound.push_back(bytes.to_vec());
    }

    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }
}

impl MidiTransport for MockMidiTransport {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        if self.fail_writes {
            return Err(MidiError::SendError("mock write failure".to_string()));
        }
        let accepted = self.write_limit.map_or(bytes.len(), |n| n.min(bytes.len()));
        self.written.extend_from_slice(&bytes[..accepted]);
        Ok(accepted)
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn poll_inbound(&mut self, on_bytes_received: &mut dyn FnMut(&[u8])) {
        while let Some(chunk) = self.inbound.pop_front() {
            on_bytes_received(&chunk);
        }
    }
}
