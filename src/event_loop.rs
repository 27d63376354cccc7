// event_loop.rs

use crate::clock::{Micros, MonotonicClock};
use crate::config::EngineConfig;
use crate::midi::{scan, MidiTransport, OutgoingBuffer};
use crate::pedal::{Debouncer, IndicatorOutputs, InputLines, Pedal, PedalEvent, PedalSet};
use crate::state::{SessionIndex, SessionMachine, SessionStep, TransportState};
use crate::tempo::{TapOutcome, TapTempo};
use log::{debug, error, trace, warn};

/// Outcome of handing the outgoing buffer to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStatus {
    /// Nothing was queued.
    Idle,
    Sent { written: usize },
    /// The transport took only part of the buffer. Not retried.
    Partial { written: usize, dropped: usize },
    /// No device; the queued bytes were discarded.
    Unavailable { dropped: usize },
    Failed { dropped: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub status: FlushStatus,
    /// Bytes that never made it into the buffer this iteration.
    pub overflowed: usize,
}

/// Everything the loop owns besides its collaborators: the session model, the
/// tap-tempo clock and the outgoing buffer. Single writer, no globals.
#[derive(Debug)]
pub struct Engine {
    session: SessionMachine,
    tempo: TapTempo,
    outgoing: OutgoingBuffer,
    program_channel: u8,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        Engine {
            session: SessionMachine::new(config.session_count, config.program_channel),
            tempo: TapTempo::new(config),
            outgoing: OutgoingBuffer::with_capacity(config.tx_buffer_capacity),
            program_channel: config.program_channel,
        }
    }

    pub fn session(&self) -> &SessionMachine {
        &self.session
    }

    pub fn tempo(&self) -> &TapTempo {
        &self.tempo
    }

    pub fn outgoing(&self) -> &OutgoingBuffer {
        &self.outgoing
    }

    /// Dispatches a pedal change. Polls without a change are ignored.
    pub fn handle_pedal_event(&mut self, event: &PedalEvent, now: Micros) {
        if !event.changed {
            return;
        }
        let pressed = event.pressed();
        debug!("Pedals {:?} (pressed {:?})", event.value, pressed);

        let mut steps = Vec::with_capacity(2);
        if pressed.contains(Pedal::Next) {
            steps.push(SessionStep::Next);
        }
        if pressed.contains(Pedal::Prev) {
            steps.push(SessionStep::Prev);
        }
        if !steps.is_empty() {
            self.session.on_session_pedals(&steps, &mut self.outgoing);
        }

        if pressed.contains(Pedal::Play) {
            self.session.on_play_pedal(&mut self.outgoing);
        }

        if pressed.contains(Pedal::Continue) {
            self.session.on_continue_pedal(&mut self.outgoing);
        }

        if pressed.contains(Pedal::Tempo) {
            if let TapOutcome::Accepted { .. } = self.tempo.on_tap(now) {
                self.session.on_tempo_accepted(&mut self.outgoing);
            }
        }

        // Hold time is only judged once every pedal is up again.
        if event.value.is_empty() && event.previous.contains(Pedal::Tempo) {
            self.tempo.on_hold_timeout(event.hold_duration);
        }
    }

    /// Feeds one inbound chunk through the scanner. Returns the bytes walked.
    pub fn handle_inbound(&mut self, bytes: &[u8]) -> usize {
        let scan = scan(bytes, self.program_channel);
        for event in scan.events {
            trace!("Inbound {:?}", event);
            self.session.on_inbound(event);
        }
        scan.consumed
    }

    pub fn tick(&mut self, now: Micros) -> bool {
        self.tempo.tick(now, &mut self.outgoing)
    }

    /// Hands the buffer to the transport and clears it, whatever happens.
    pub fn flush<T: MidiTransport + ?Sized>(&mut self, transport: &mut T) -> FlushReport {
        let overflowed = self.outgoing.dropped();
        if overflowed > 0 {
            error!(
                "Outgoing buffer overflowed, {} byte(s) lost this iteration",
                overflowed
            );
        }

        let pending = self.outgoing.len();
        let status = if pending == 0 {
            FlushStatus::Idle
        } else if !transport.is_connected() {
            trace!("No MIDI device, discarding {} byte(s)", pending);
            FlushStatus::Unavailable { dropped: pending }
        } else {
            match transport.write_bytes(self.outgoing.as_slice()) {
                Ok(written) if written == pending => FlushStatus::Sent { written },
                Ok(written) => {
                    warn!("Dropped {} byte(s)", pending - written);
                    FlushStatus::Partial {
                        written,
                        dropped: pending - written,
                    }
                }
                Err(e) => {
                    error!("Failed to send MIDI: {}", e);
                    FlushStatus::Failed { dropped: pending }
                }
            }
        };

        if matches!(status, FlushStatus::Sent { .. } | FlushStatus::Partial { .. }) {
            if let Err(e) = transport.flush() {
                warn!("MIDI flush failed: {}", e);
            }
        }

        self.outgoing.clear();
        FlushReport { status, overflowed }
    }
}

/// What one iteration of the loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationReport {
    pub edge: Option<PedalEvent>,
    pub pulse: bool,
    pub flush: FlushReport,
    pub inbound_bytes: usize,
}

/// Read-only view for status displays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusSnapshot {
    pub transport: TransportState,
    pub session: SessionIndex,
    pub bpm: f64,
    pub clock_running: bool,
    pub connected: bool,
    pub pedals: PedalSet,
}

/// The single cooperative loop. Each iteration samples the pedals, dispatches
/// any edge, evaluates the clock deadline, flushes and reads inbound MIDI.
/// Nothing in an iteration blocks, so the clock is evaluated on every pass,
/// including while the debouncer is confirming an edge.
pub struct EventLoop<L, I, T, C> {
    lines: L,
    indicators: I,
    transport: T,
    clock: C,
    debouncer: Debouncer,
    engine: Engine,
    mask: PedalSet,
}

impl<L, I, T, C> EventLoop<L, I, T, C>
where
    L: InputLines,
    I: IndicatorOutputs,
    T: MidiTransport,
    C: MonotonicClock,
{
    pub fn new(config: &EngineConfig, lines: L, indicators: I, transport: T, clock: C) -> Self {
        EventLoop {
            lines,
            indicators,
            transport,
            clock,
            debouncer: Debouncer::new(config.debounce_window_us, config.auxiliary_indicator),
            engine: Engine::new(config),
            mask: PedalSet::ALL,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    pub fn indicators(&self) -> &I {
        &self.indicators
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// One pass of the loop. Callers spin on this and may yield the thread
    /// between passes, but must not sleep.
    pub fn run_once(&mut self) -> IterationReport {
        let now = self.clock.now();
        self.transport.maintain(now);

        let event = self
            .debouncer
            .poll(&mut self.lines, &mut self.indicators, self.mask, now);
        if event.changed {
            self.engine.handle_pedal_event(&event, now);
        }

        let pulse = self.engine.tick(self.clock.now());
        let flush = self.engine.flush(&mut self.transport);

        let mut inbound_bytes = 0;
        if self.transport.is_connected() {
            let engine = &mut self.engine;
            self.transport.poll_inbound(&mut |bytes: &[u8]| {
                inbound_bytes += engine.handle_inbound(bytes);
            });
        }

        IterationReport {
            edge: event.changed.then_some(event),
            pulse,
            flush,
            inbound_bytes,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            transport: self.engine.session.transport(),
            session: self.engine.session.session(),
            bpm: self.engine.tempo.bpm(),
            clock_running: self.engine.tempo.is_running(),
            connected: self.transport.is_connected(),
            pedals: self.debouncer.value(),
        }
    }
}
