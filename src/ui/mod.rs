//! User interface components
//!
//! This module provides a terminal status line for PedalSync:
//! - A beat indicator advanced by every clock pulse sent
//! - Transport, session, tempo and connection state
//!
//! The UI is built using the indicatif library for progress bars and spinners.
//! It only reads [`StatusSnapshot`]s and never touches engine state.

mod progress;

pub use progress::{create_beat_progress, create_transport_spinner};

use crate::event_loop::StatusSnapshot;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};

pub fn format_status(status: &StatusSnapshot) -> String {
    let clock = if status.clock_running {
        format!("{:.1} BPM", status.bpm)
    } else {
        format!("off ({:.1} BPM)", status.bpm)
    };
    let link = if status.connected {
        "connected"
    } else {
        "no device"
    };
    format!(
        "{:?} | session {} | clock {} | {} | pedals {:?}",
        status.transport, status.session, clock, link, status.pedals
    )
}

pub struct StatusDisplay {
    #[allow(dead_code)]
    multi_progress: MultiProgress,
    beat_pb: ProgressBar,
    transport_pb: ProgressBar,
    ticks_per_beat: u64,
    pulses: u64,
    last: Option<StatusSnapshot>,
}

impl StatusDisplay {
    pub fn new(ticks_per_beat: u64) -> Self {
        let multi_progress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());
        let beat_pb = multi_progress.add(create_beat_progress(ticks_per_beat));
        let transport_pb = multi_progress.add(create_transport_spinner());

        StatusDisplay {
            multi_progress,
            beat_pb,
            transport_pb,
            ticks_per_beat,
            pulses: 0,
            last: None,
        }
    }

    /// Counts one clock pulse towards the beat indicator.
    pub fn on_pulse(&mut self) {
        self.pulses += 1;
        self.beat_pb.set_position(self.pulses % self.ticks_per_beat);
    }

    /// Redraws the status line if anything changed since the last call.
    pub fn update(&mut self, status: StatusSnapshot) {
        if self.last.as_ref() != Some(&status) {
            if !status.clock_running {
                self.pulses = 0;
                self.beat_pb.set_position(0);
            }
            self.transport_pb.set_message(format_status(&status));
            self.last = Some(status);
        }
        self.transport_pb.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedal::{Pedal, PedalSet};
    use crate::state::{SessionIndex, TransportState};

    #[test]
    fn test_format_status() {
        let status = StatusSnapshot {
            transport: TransportState::Playing,
            session: SessionIndex::new(6, 32).unwrap(),
            bpm: 120.0,
            clock_running: true,
            connected: false,
            pedals: PedalSet::from(Pedal::Tempo),
        };
        assert_eq!(
            format_status(&status),
            "Playing | session 6 | clock 120.0 BPM | no device | pedals {\"tempo\"}"
        );
    }

    #[test]
    fn test_format_status_clock_off() {
        let status = StatusSnapshot {
            transport: TransportState::Stopped,
            session: SessionIndex::new(0, 32).unwrap(),
            bpm: 100.0,
            clock_running: false,
            connected: true,
            pedals: PedalSet::EMPTY,
        };
        assert!(format_status(&status).contains("clock off (100.0 BPM) | connected"));
    }
}
