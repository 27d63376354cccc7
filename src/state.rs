use crate::midi::{InboundEvent, OutgoingBuffer, OutgoingMessage, PushStatus};
use log::{debug, info};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl TransportState {
    pub fn is_active(self) -> bool {
        !matches!(self, TransportState::Stopped)
    }
}

/// Session (program) number on the instrument. Always within `0..count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIndex {
    value: u8,
    count: u8,
}

impl SessionIndex {
    /// Returns `None` for out-of-range values instead of clamping.
    pub fn new(value: u8, count: u8) -> Option<Self> {
        (value < count).then_some(SessionIndex { value, count })
    }

    pub fn value(self) -> u8 {
        self.value
    }

    pub fn next(self) -> Self {
        SessionIndex {
            value: if self.value + 1 == self.count {
                0
            } else {
                self.value + 1
            },
            count: self.count,
        }
    }

    pub fn prev(self) -> Self {
        SessionIndex {
            value: if self.value == 0 {
                self.count - 1
            } else {
                self.value - 1
            },
            count: self.count,
        }
    }
}

impl fmt::Display for SessionIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    Next,
    Prev,
}

/// Authoritative model of the instrument's transport and selected session.
/// Pedal handlers emit MIDI; inbound handlers only mirror the instrument.
#[derive(Debug)]
pub struct SessionMachine {
    transport: TransportState,
    session: SessionIndex,
    session_count: u8,
    program_channel: u8,
}

impl SessionMachine {
    pub fn new(session_count: u8, program_channel: u8) -> Self {
        SessionMachine {
            transport: TransportState::Stopped,
            session: SessionIndex {
                value: 0,
                count: session_count,
            },
            session_count,
            program_channel,
        }
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    pub fn session(&self) -> SessionIndex {
        self.session
    }

    pub fn on_play_pedal(&mut self, out: &mut OutgoingBuffer) -> TransportState {
        if self.transport.is_active() {
            self.stop(out);
        } else {
            queue(out, OutgoingMessage::Start);
            self.set_transport(TransportState::Playing);
        }
        self.transport
    }

    pub fn on_continue_pedal(&mut self, out: &mut OutgoingBuffer) -> TransportState {
        if self.transport.is_active() {
            self.stop(out);
        } else {
            queue(out, OutgoingMessage::Continue);
            self.set_transport(TransportState::Paused);
        }
        self.transport
    }

    /// Moves one session along, wrapping at either end. Both steps may be
    /// requested at once (a chord); a single Program Change carries the result.
    pub fn on_session_pedals(
        &mut self,
        steps: &[SessionStep],
        out: &mut OutgoingBuffer,
    ) -> SessionIndex {
        for step in steps {
            self.session = match step {
                SessionStep::Next => self.session.next(),
                SessionStep::Prev => self.session.prev(),
            };
        }
        info!("Session {} selected", self.session);

        queue(
            out,
            OutgoingMessage::ProgramChange {
                channel: self.program_channel,
                program: self.session.value(),
            },
        );
        // The instrument drops playback on a song change; put the transport back.
        queue(out, OutgoingMessage::Stop);
        self.reassert_transport(out);
        self.session
    }

    /// A new tap tempo only restarts the instrument when it is running, so it
    /// picks up the new clock phase.
    pub fn on_tempo_accepted(&mut self, out: &mut OutgoingBuffer) {
        if self.transport.is_active() {
            queue(out, OutgoingMessage::Stop);
            queue(out, OutgoingMessage::Continue);
        }
    }

    pub fn on_inbound(&mut self, event: InboundEvent) {
        match event {
            InboundEvent::Play => self.set_transport(TransportState::Playing),
            InboundEvent::Stop => self.set_transport(TransportState::Stopped),
            InboundEvent::Continue => self.set_transport(TransportState::Paused),
            InboundEvent::ProgramChange(program) => {
                match SessionIndex::new(program, self.session_count) {
                    Some(session) => {
                        info!("Instrument selected session {}", session);
                        self.session = session;
                    }
                    None => debug!("Ignoring program change {} (out of range)", program),
                }
            }
        }
    }

    fn stop(&mut self, out: &mut OutgoingBuffer) {
        queue(out, OutgoingMessage::Stop);
        self.set_transport(TransportState::Stopped);
    }

    fn reassert_transport(&self, out: &mut OutgoingBuffer) {
        match self.transport {
            TransportState::Playing => queue(out, OutgoingMessage::Start),
            TransportState::Paused => queue(out, OutgoingMessage::Continue),
            TransportState::Stopped => {}
        }
    }

    fn set_transport(&mut self, state: TransportState) {
        if self.transport != state {
            info!("Transport {:?} -> {:?}", self.transport, state);
            self.transport = state;
        }
    }
}

fn queue(out: &mut OutgoingBuffer, msg: OutgoingMessage) {
    // A full buffer already logs the drop; the model stays authoritative.
    let _: PushStatus = out.push(msg);
}
