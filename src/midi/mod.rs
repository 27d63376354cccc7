//! MIDI functionality for PedalSync
//!
//! This module provides everything between the engine and the wire:
//! - Outgoing message encoding and the bounded outgoing buffer
//! - A partial inbound scanner that recognises transport and program-change bytes
//! - The [`MidiTransport`] trait and its error type
//! - Real MIDI device communication via midir
//! - A mock transport for testing
//!
pub mod codec;
mod engine;
pub mod midir_engine;
pub mod mock_engine;

pub use codec::{scan, InboundEvent, OutgoingBuffer, OutgoingMessage, PushStatus, Scan};
pub use engine::{MidiError, MidiTransport, Result};

pub use midir_engine::{list_output_ports, MidirTransport};
pub use mock_engine::MockMidiTransport;

// Set default transport type
pub type DefaultMidiTransport = MidirTransport;
