// tempo.rs

use crate::clock::Micros;
use crate::config::EngineConfig;
use crate::midi::{OutgoingBuffer, OutgoingMessage, PushStatus};
use log::{debug, info, trace};

const MICROS_PER_MINUTE: f64 = 60_000_000.0;

/// What a tap did to the tempo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// No previous tap to measure against.
    FirstTap,
    Accepted { tick_interval: Micros },
    /// Candidate interval outside the accepted range; the tap starts a new sequence.
    Rejected { candidate: Micros },
}

/// Tap-tempo MIDI clock generator.
///
/// Pulses are rescheduled from the time they actually fired, not from the
/// previous deadline. A late poll therefore stretches one interval instead of
/// building up drift or bursting to catch up.
#[derive(Debug)]
pub struct TapTempo {
    tick_interval: Micros,
    next_clock_deadline: Option<Micros>,
    last_clock_time: Micros,
    previous_tap: Option<Micros>,
    tap_window_start: Option<Micros>,
    fastest: Micros,
    slowest: Micros,
    ticks_per_beat: u64,
    hold_timeout: Micros,
}

impl TapTempo {
    pub fn new(config: &EngineConfig) -> Self {
        TapTempo {
            tick_interval: config.default_tick_interval_us(),
            next_clock_deadline: None,
            last_clock_time: 0,
            previous_tap: None,
            tap_window_start: None,
            fastest: config.fastest_tick_interval_us(),
            slowest: config.slowest_tick_interval_us(),
            ticks_per_beat: config.ticks_per_beat,
            hold_timeout: config.hold_timeout_us,
        }
    }

    pub fn tick_interval(&self) -> Micros {
        self.tick_interval
    }

    /// `None` means the clock is off.
    pub fn next_clock_deadline(&self) -> Option<Micros> {
        self.next_clock_deadline
    }

    pub fn last_clock_time(&self) -> Micros {
        self.last_clock_time
    }

    /// When the current run of taps began.
    pub fn tap_window_start(&self) -> Option<Micros> {
        self.tap_window_start
    }

    pub fn is_running(&self) -> bool {
        self.next_clock_deadline.is_some()
    }

    pub fn bpm(&self) -> f64 {
        MICROS_PER_MINUTE / (self.tick_interval * self.ticks_per_beat) as f64
    }

    pub fn on_tap(&mut self, now: Micros) -> TapOutcome {
        let outcome = match self.previous_tap {
            None => TapOutcome::FirstTap,
            Some(previous) => {
                let candidate = now.saturating_sub(previous) / self.ticks_per_beat;
                if (self.fastest..=self.slowest).contains(&candidate) {
                    self.tick_interval = candidate;
                    self.next_clock_deadline = Some(now + candidate);
                    TapOutcome::Accepted {
                        tick_interval: candidate,
                    }
                } else {
                    TapOutcome::Rejected { candidate }
                }
            }
        };

        match outcome {
            TapOutcome::Accepted { .. } => {
                info!(
                    "Tempo set to {:.1} BPM ({} us per tick, tapping since {:?})",
                    self.bpm(),
                    self.tick_interval,
                    self.tap_window_start
                );
            }
            TapOutcome::FirstTap | TapOutcome::Rejected { .. } => {
                debug!("Tap at {} us starts a new sequence: {:?}", now, outcome);
                self.tap_window_start = Some(now);
            }
        }

        self.previous_tap = Some(now);
        outcome
    }

    /// Turns the clock off when the tap pedal was held for at least the hold
    /// timeout. Returns whether it did.
    pub fn on_hold_timeout(&mut self, hold_duration: Micros) -> bool {
        if hold_duration < self.hold_timeout {
            return false;
        }
        info!(
            "Tap pedal held for {} ms, clock output disabled",
            hold_duration / 1_000
        );
        self.next_clock_deadline = None;
        self.previous_tap = None;
        self.tap_window_start = None;
        true
    }

    /// Emits one Clock byte if the deadline has passed. Returns whether it fired.
    pub fn tick(&mut self, now: Micros, out: &mut OutgoingBuffer) -> bool {
        match self.next_clock_deadline {
            Some(deadline) if now >= deadline => {
                if let PushStatus::Truncated { .. } = out.push(OutgoingMessage::Clock) {
                    trace!("Clock pulse at {} us lost to a full buffer", now);
                }
                self.last_clock_time = now;
                self.next_clock_deadline = Some(self.last_clock_time + self.tick_interval);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tempo() -> TapTempo {
        TapTempo::new(&EngineConfig::default())
    }

    #[test]
    fn test_defaults_to_120_bpm_and_silent() {
        let tempo = tempo();
        assert_eq!(tempo.tick_interval(), 20_833);
        assert!((tempo.bpm() - 120.0).abs() < 0.01);
        assert_eq!(tempo.next_clock_deadline(), None);
    }

    #[test]
    fn test_first_tap_changes_nothing() {
        let mut tempo = tempo();
        assert_eq!(tempo.on_tap(1_000_000), TapOutcome::FirstTap);
        assert_eq!(tempo.tick_interval(), 20_833);
        assert_eq!(tempo.next_clock_deadline(), None);
        assert_eq!(tempo.tap_window_start(), Some(1_000_000));
    }

    #[test]
    fn test_second_tap_sets_interval_and_deadline() {
        let mut tempo = tempo();
        tempo.on_tap(1_000_000);
        let outcome = tempo.on_tap(1_600_000);
        assert_eq!(
            outcome,
            TapOutcome::Accepted {
                tick_interval: 25_000
            }
        );
        assert_eq!(tempo.next_clock_deadline(), Some(1_625_000));
        assert!((tempo.bpm() - 100.0).abs() < 0.01);
        assert_eq!(tempo.tap_window_start(), Some(1_000_000));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let mut tempo = tempo();
        tempo.on_tap(0);
        // 62_500 * 24 = 1.5 s, exactly 40 BPM
        assert!(matches!(
            tempo.on_tap(1_500_000),
            TapOutcome::Accepted {
                tick_interval: 62_500
            }
        ));
        // 10_417 * 24 = 250_008 us, the 240 BPM bound rounded up
        assert!(matches!(
            tempo.on_tap(1_750_008),
            TapOutcome::Accepted {
                tick_interval: 10_417
            }
        ));
    }

    #[test]
    fn test_too_slow_tap_rejected_but_remembered() {
        let mut tempo = tempo();
        tempo.on_tap(0);
        tempo.on_tap(500_000);
        let deadline = tempo.next_clock_deadline();

        let outcome = tempo.on_tap(3_000_000);
        assert_eq!(outcome, TapOutcome::Rejected { candidate: 104_166 });
        assert_eq!(tempo.tick_interval(), 20_833);
        assert_eq!(tempo.next_clock_deadline(), deadline);

        // The rejected tap is the reference for the next one.
        assert!(matches!(
            tempo.on_tap(3_400_000),
            TapOutcome::Accepted {
                tick_interval: 16_666
            }
        ));
    }

    #[test]
    fn test_too_fast_tap_rejected() {
        let mut tempo = tempo();
        tempo.on_tap(0);
        assert_eq!(
            tempo.on_tap(100_000),
            TapOutcome::Rejected { candidate: 4_166 }
        );
        assert_eq!(tempo.tick_interval(), 20_833);
        assert_eq!(tempo.next_clock_deadline(), None);
    }

    #[test]
    fn test_tick_fires_on_deadline_only() {
        let mut tempo = tempo();
        let mut out = OutgoingBuffer::with_capacity(16);
        tempo.on_tap(0);
        tempo.on_tap(480_000); // 20_000 us per tick

        assert!(!tempo.tick(499_999, &mut out));
        assert!(out.is_empty());

        assert!(tempo.tick(500_000, &mut out));
        assert_eq!(out.as_slice(), &[0xF8]);
        assert_eq!(tempo.last_clock_time(), 500_000);
        assert_eq!(tempo.next_clock_deadline(), Some(520_000));
    }

    #[test]
    fn test_late_tick_reschedules_from_fire_time() {
        let mut tempo = tempo();
        let mut out = OutgoingBuffer::with_capacity(16);
        tempo.on_tap(0);
        tempo.on_tap(480_000);

        // Poll arrives 7 ms late; one pulse, next one a full interval later.
        assert!(tempo.tick(507_000, &mut out));
        assert!(!tempo.tick(526_999, &mut out));
        assert!(tempo.tick(527_000, &mut out));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_hold_timeout() {
        let mut tempo = tempo();
        let mut out = OutgoingBuffer::with_capacity(16);
        tempo.on_tap(0);
        tempo.on_tap(500_000);

        assert!(!tempo.on_hold_timeout(1_999_999));
        assert!(tempo.is_running());

        assert!(tempo.on_hold_timeout(2_000_000));
        assert_eq!(tempo.next_clock_deadline(), None);
        assert!(!tempo.tick(u64::MAX, &mut out));
        assert!(out.is_empty());

        // The next tap starts over.
        assert_eq!(tempo.on_tap(10_000_000), TapOutcome::FirstTap);
        // Tempo is kept for when the clock comes back.
        assert_eq!(tempo.tick_interval(), 20_833);
    }
}
