//! Outgoing byte encoding and a deliberately partial inbound scanner.
//!
//! The scanner is not a MIDI parser. It assumes no running status and no
//! system-exclusive framing, and walks past anything it does not recognise.

use log::{debug, error};

pub const CLOCK: u8 = 0xF8;
pub const START: u8 = 0xFA;
pub const CONTINUE: u8 = 0xFB;
pub const STOP: u8 = 0xFC;
pub const PROGRAM_CHANGE: u8 = 0xC0;

/// Semantic messages the engine sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutgoingMessage {
    Clock,
    Start,
    Stop,
    Continue,
    ProgramChange { channel: u8, program: u8 },
}

impl OutgoingMessage {
    /// Writes the wire bytes into `out` and returns how many were used.
    pub fn encode(&self, out: &mut [u8; 2]) -> usize {
        match *self {
            OutgoingMessage::Clock => {
                out[0] = CLOCK;
                1
            }
            OutgoingMessage::Start => {
                out[0] = START;
                1
            }
            OutgoingMessage::Stop => {
                out[0] = STOP;
                1
            }
            OutgoingMessage::Continue => {
                out[0] = CONTINUE;
                1
            }
            OutgoingMessage::ProgramChange { channel, program } => {
                out[0] = PROGRAM_CHANGE | (channel & 0x0F);
                out[1] = program & 0x7F;
                2
            }
        }
    }
}

/// Whether a message made it into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum PushStatus {
    Queued,
    /// The buffer was full; the whole message was dropped.
    Truncated { dropped: usize },
}

/// Bounded, ordered bytes awaiting transmission. Drained once per loop iteration.
#[derive(Debug)]
pub struct OutgoingBuffer {
    bytes: Vec<u8>,
    capacity: usize,
    dropped: usize,
}

impl OutgoingBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        OutgoingBuffer {
            bytes: Vec::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Queues a complete message. A message that does not fit is dropped whole,
    /// never split.
    pub fn push(&mut self, msg: OutgoingMessage) -> PushStatus {
        let mut encoded = [0u8; 2];
        let len = msg.encode(&mut encoded);

        if self.bytes.len() + len > self.capacity {
            self.dropped += len;
            error!(
                "Outgoing buffer full ({} bytes), dropping {:?}",
                self.capacity, msg
            );
            return PushStatus::Truncated { dropped: len };
        }

        if msg != OutgoingMessage::Clock {
            debug!("Queued {:?}", msg);
        }
        self.bytes.extend_from_slice(&encoded[..len]);
        PushStatus::Queued
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Bytes dropped since the last `clear`.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.dropped = 0;
    }
}

/// Recognised inbound messages. Program numbers are raw; range checks belong
/// to the session model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundEvent {
    Play,
    Stop,
    Continue,
    ProgramChange(u8),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Scan {
    pub events: Vec<InboundEvent>,
    pub consumed: usize,
}

/// Bytes a message starting with `status` occupies, judged from its high nibble.
pub fn message_length(status: u8) -> usize {
    match status & 0xF0 {
        0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => 3,
        0xC0 | 0xD0 => 2,
        _ => 1,
    }
}

/// Walks `bytes` and picks out transport messages and program changes on
/// `program_channel`. Clock bytes from the instrument are ignored.
pub fn scan(bytes: &[u8], program_channel: u8) -> Scan {
    let program_status = PROGRAM_CHANGE | (program_channel & 0x0F);
    let mut events = Vec::new();
    let mut cursor = 0;

    while cursor < bytes.len() {
        let status = bytes[cursor];
        match status {
            START => events.push(InboundEvent::Play),
            STOP => events.push(InboundEvent::Stop),
            CONTINUE => events.push(InboundEvent::Continue),
            s if s == program_status => {
                if let Some(&program) = bytes.get(cursor + 1) {
                    events.push(InboundEvent::ProgramChange(program));
                }
            }
            _ => {}
        }
        cursor += message_length(status);
    }

    Scan {
        events,
        consumed: cursor.min(bytes.len()),
    }
}
