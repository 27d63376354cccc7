//! Footswitch input
//!
//! This module turns raw pedal lines into discrete edge events:
//! - [`Pedal`] and [`PedalSet`] name the five controls and chords of them
//! - [`InputLines`] and [`IndicatorOutputs`] abstract the physical lines and LEDs
//! - [`Debouncer`] applies the anti-bounce window and reports [`PedalEvent`]s
//! - [`KeyboardLines`] stands in for GPIO on a host, driven from stdin
//!
mod debounce;
mod keyboard;

pub use debounce::{Debouncer, PedalEvent};
pub use keyboard::{parse_command, spawn_stdin_reader, KeyAction, KeyCommand, KeyboardLines};

use log::debug;
use std::fmt;
use std::ops::BitOr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pedal {
    Prev,
    Next,
    Play,
    Continue,
    Tempo,
}

impl Pedal {
    pub const ALL: [Pedal; 5] = [
        Pedal::Prev,
        Pedal::Next,
        Pedal::Play,
        Pedal::Continue,
        Pedal::Tempo,
    ];

    pub const fn bit(self) -> u8 {
        match self {
            Pedal::Prev => 1,
            Pedal::Next => 2,
            Pedal::Play => 4,
            Pedal::Continue => 8,
            Pedal::Tempo => 16,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pedal::Prev => "prev",
            Pedal::Next => "next",
            Pedal::Play => "play",
            Pedal::Continue => "continue",
            Pedal::Tempo => "tempo",
        }
    }
}

/// Bit-set of pedals. Empty is the idle state.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PedalSet(u8);

impl PedalSet {
    pub const EMPTY: PedalSet = PedalSet(0);
    pub const ALL: PedalSet = PedalSet(0b1_1111);

    pub fn contains(self, pedal: Pedal) -> bool {
        self.0 & pedal.bit() != 0
    }

    pub fn insert(&mut self, pedal: Pedal) {
        self.0 |= pedal.bit();
    }

    pub fn remove(&mut self, pedal: Pedal) {
        self.0 &= !pedal.bit();
    }

    /// Pedals in `self` but not in `other`.
    pub fn difference(self, other: PedalSet) -> PedalSet {
        PedalSet(self.0 & !other.0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Pedal> {
        Pedal::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl From<Pedal> for PedalSet {
    fn from(pedal: Pedal) -> Self {
        PedalSet(pedal.bit())
    }
}

impl BitOr for PedalSet {
    type Output = PedalSet;

    fn bitor(self, rhs: PedalSet) -> PedalSet {
        PedalSet(self.0 | rhs.0)
    }
}

impl BitOr<Pedal> for PedalSet {
    type Output = PedalSet;

    fn bitor(self, rhs: Pedal) -> PedalSet {
        PedalSet(self.0 | rhs.bit())
    }
}

impl BitOr for Pedal {
    type Output = PedalSet;

    fn bitor(self, rhs: Pedal) -> PedalSet {
        PedalSet(self.bit() | rhs.bit())
    }
}

impl fmt::Debug for PedalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(Pedal::name)).finish()
    }
}

/// Physical pedal lines. `true` means the pedal is held down.
pub trait InputLines {
    fn read_line(&mut self, pedal: Pedal) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorId {
    Onboard,
    Auxiliary,
}

/// Fire-and-forget indicator outputs.
pub trait IndicatorOutputs {
    fn set_indicator(&mut self, id: IndicatorId, on: bool);
}

/// Lines held in memory, for tests and simulations.
#[derive(Debug, Default)]
pub struct MockLines {
    pressed: PedalSet,
    pub reads: usize,
}

impl MockLines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, pedal: Pedal) {
        self.pressed.insert(pedal);
    }

    pub fn release(&mut self, pedal: Pedal) {
        self.pressed.remove(pedal);
    }

    pub fn release_all(&mut self) {
        self.pressed = PedalSet::EMPTY;
    }
}

impl InputLines for MockLines {
    fn read_line(&mut self, pedal: Pedal) -> bool {
        self.reads += 1;
        self.pressed.contains(pedal)
    }
}

/// Remembers the last state written to each indicator.
#[derive(Debug, Default)]
pub struct MockIndicators {
    pub onboard: bool,
    pub auxiliary: bool,
}

impl IndicatorOutputs for MockIndicators {
    fn set_indicator(&mut self, id: IndicatorId, on: bool) {
        match id {
            IndicatorId::Onboard => self.onboard = on,
            IndicatorId::Auxiliary => self.auxiliary = on,
        }
    }
}

/// Host indicators: there is no LED, so state changes go to the log.
#[derive(Debug, Default)]
pub struct LogIndicators {
    state: MockIndicators,
}

impl IndicatorOutputs for LogIndicators {
    fn set_indicator(&mut self, id: IndicatorId, on: bool) {
        let current = match id {
            IndicatorId::Onboard => self.state.onboard,
            IndicatorId::Auxiliary => self.state.auxiliary,
        };
        if current != on {
            debug!("Indicator {:?} {}", id, if on { "on" } else { "off" });
            self.state.set_indicator(id, on);
        }
    }
}
