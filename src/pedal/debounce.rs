use super::{IndicatorId, IndicatorOutputs, InputLines, Pedal, PedalSet};
use crate::clock::Micros;
use log::trace;

/// One poll's view of the pedals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PedalEvent {
    pub value: PedalSet,
    /// The stable value before this change; equals `value` when nothing changed.
    pub previous: PedalSet,
    /// True only on the first poll after the pedal set differs.
    pub changed: bool,
    /// Time spent in the previous state (on a change) or in the current one.
    pub hold_duration: Micros,
}

impl PedalEvent {
    /// Pedals that went down with this change.
    pub fn pressed(&self) -> PedalSet {
        self.value.difference(self.previous)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stable,
    /// A change was just reported; lines are not trusted until `until`.
    Confirming { until: Micros },
}

/// Edge detector with an anti-bounce window. Never blocks: the confirmation
/// window is a state, so the caller keeps looping (and ticking the clock)
/// while it runs out.
#[derive(Debug)]
pub struct Debouncer {
    baseline: PedalSet,
    last_change: Micros,
    window: Micros,
    phase: Phase,
    auxiliary_indicator: bool,
}

impl Debouncer {
    pub fn new(window: Micros, auxiliary_indicator: bool) -> Self {
        Debouncer {
            baseline: PedalSet::EMPTY,
            last_change: 0,
            window,
            phase: Phase::Stable,
            auxiliary_indicator,
        }
    }

    pub fn value(&self) -> PedalSet {
        self.baseline
    }

    pub fn is_confirming(&self) -> bool {
        matches!(self.phase, Phase::Confirming { .. })
    }

    pub fn poll<L, I>(
        &mut self,
        lines: &mut L,
        indicators: &mut I,
        mask: PedalSet,
        now: Micros,
    ) -> PedalEvent
    where
        L: InputLines + ?Sized,
        I: IndicatorOutputs + ?Sized,
    {
        let hold_duration = now.saturating_sub(self.last_change);
        let unchanged = PedalEvent {
            value: self.baseline,
            previous: self.baseline,
            changed: false,
            hold_duration,
        };

        if let Phase::Confirming { until } = self.phase {
            if now < until {
                return unchanged;
            }
            trace!("Debounce window closed at {} us", now);
            self.phase = Phase::Stable;
        }

        let value = sample(lines, mask);
        self.drive_indicators(indicators, !value.is_empty());

        if value == self.baseline {
            return unchanged;
        }

        let previous = self.baseline;
        self.baseline = value;
        self.last_change = now;
        self.phase = Phase::Confirming {
            until: now + self.window,
        };

        PedalEvent {
            value,
            previous,
            changed: true,
            hold_duration,
        }
    }

    fn drive_indicators<I: IndicatorOutputs + ?Sized>(&self, indicators: &mut I, on: bool) {
        indicators.set_indicator(IndicatorId::Onboard, on);
        if self.auxiliary_indicator {
            indicators.set_indicator(IndicatorId::Auxiliary, on);
        }
    }
}

fn sample<L: InputLines + ?Sized>(lines: &mut L, mask: PedalSet) -> PedalSet {
    let mut value = PedalSet::EMPTY;
    for pedal in Pedal::ALL {
        if mask.contains(pedal) && lines.read_line(pedal) {
            value.insert(pedal);
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pedal::{MockIndicators, MockLines};

    const WINDOW: Micros = 30_000;

    fn setup() -> (Debouncer, MockLines, MockIndicators) {
        (
            Debouncer::new(WINDOW, true),
            MockLines::new(),
            MockIndicators::default(),
        )
    }

    #[test]
    fn test_idle_poll_reports_nothing() {
        let (mut debouncer, mut lines, mut leds) = setup();
        let event = debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, 1_000);
        assert!(!event.changed);
        assert!(event.value.is_empty());
        assert!(!leds.onboard);
    }

    #[test]
    fn test_press_reported_once() {
        let (mut debouncer, mut lines, mut leds) = setup();
        lines.press(Pedal::Play);

        let event = debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, 1_000);
        assert!(event.changed);
        assert_eq!(event.value, PedalSet::from(Pedal::Play));
        assert!(event.previous.is_empty());
        assert!(leds.onboard);
        assert!(leds.auxiliary);

        let event = debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, 1_000 + WINDOW);
        assert!(!event.changed);
        assert_eq!(event.value, PedalSet::from(Pedal::Play));
    }

    #[test]
    fn test_bounce_inside_window_is_ignored() {
        let (mut debouncer, mut lines, mut leds) = setup();
        lines.press(Pedal::Next);
        assert!(debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, 0).changed);
        let reads = lines.reads;

        lines.release(Pedal::Next);
        for t in (1_000..WINDOW).step_by(1_000) {
            let event = debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, t);
            assert!(!event.changed);
            assert!(debouncer.is_confirming());
        }
        assert_eq!(lines.reads, reads, "lines must not be sampled while confirming");

        let event = debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, WINDOW);
        assert!(event.changed);
        assert!(event.value.is_empty());
        assert_eq!(event.previous, PedalSet::from(Pedal::Next));
        assert!(!leds.onboard);
    }

    #[test]
    fn test_hold_duration_on_release() {
        let (mut debouncer, mut lines, mut leds) = setup();
        lines.press(Pedal::Tempo);
        debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, 500_000);

        lines.release(Pedal::Tempo);
        let event = debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, 2_600_000);
        assert!(event.changed);
        assert_eq!(event.hold_duration, 2_100_000);
        assert_eq!(event.previous, PedalSet::from(Pedal::Tempo));
        assert!(event.pressed().is_empty());
    }

    #[test]
    fn test_pressed_excludes_pedals_already_down() {
        let (mut debouncer, mut lines, mut leds) = setup();
        lines.press(Pedal::Tempo);
        debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, 0);

        lines.press(Pedal::Play);
        let event = debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, WINDOW);
        assert!(event.changed);
        assert_eq!(event.value, Pedal::Tempo | Pedal::Play);
        assert_eq!(event.pressed(), PedalSet::from(Pedal::Play));
    }

    #[test]
    fn test_mask_excludes_pedals() {
        let (mut debouncer, mut lines, mut leds) = setup();
        lines.press(Pedal::Prev);
        let event = debouncer.poll(&mut lines, &mut leds, Pedal::Play | Pedal::Next, 0);
        assert!(!event.changed);
        assert!(event.value.is_empty());
    }

    #[test]
    fn test_auxiliary_indicator_disabled() {
        let mut debouncer = Debouncer::new(WINDOW, false);
        let mut lines = MockLines::new();
        let mut leds = MockIndicators::default();
        lines.press(Pedal::Play);
        debouncer.poll(&mut lines, &mut leds, PedalSet::ALL, 0);
        assert!(leds.onboard);
        assert!(!leds.auxiliary);
    }
}
