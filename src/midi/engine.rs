use crate::clock::Micros;
use std::error::Error;
use std::fmt;

/// Custom error type for MIDI operations
#[derive(Debug)]
pub enum MidiError {
    /// Error when sending a MIDI message
    SendError(String),
    /// Error when connecting to a MIDI device
    ConnectionError(String),
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiError::SendError(msg) => write!(f, "MIDI send error: {}", msg),
            MidiError::ConnectionError(msg) => write!(f, "MIDI connection error: {}", msg),
        }
    }
}

impl Error for MidiError {}

impl From<midir::InitError> for MidiError {
    fn from(e: midir::InitError) -> Self {
        MidiError::ConnectionError(e.to_string())
    }
}

impl From<midir::PortInfoError> for MidiError {
    fn from(e: midir::PortInfoError) -> Self {
        MidiError::ConnectionError(e.to_string())
    }
}

impl<T> From<midir::ConnectError<T>> for MidiError {
    fn from(e: midir::ConnectError<T>) -> Self {
        MidiError::ConnectionError(e.kind().to_string())
    }
}

impl From<midir::SendError> for MidiError {
    fn from(e: midir::SendError) -> Self {
        MidiError::SendError(e.to_string())
    }
}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

/// Byte-level link to the controlled instrument. The link may be absent at any
/// time; callers check `is_connected` before every operation.
pub trait MidiTransport {
    fn is_connected(&self) -> bool;

    /// Writes as much of `bytes` as the link accepts and returns the count.
    /// A short count is not an error.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize>;

    fn flush(&mut self) -> Result<()>;

    /// Delivers every inbound chunk received since the last call.
    fn poll_inbound(&mut self, on_bytes_received: &mut dyn FnMut(&[u8]));

    /// Called once per loop iteration; transports that can reconnect do it here.
    fn maintain(&mut self, _now: Micros) {}
}
