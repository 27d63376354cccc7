// clock.rs

use std::cell::Cell;
use std::time::Instant;

/// Microseconds since an arbitrary, fixed origin.
pub type Micros = u64;

/// Monotonic, non-decreasing time source used for all interval math.
pub trait MonotonicClock {
    fn now(&self) -> Micros;
}

pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    fn now(&self) -> Micros {
        // Saturates after ~584k years of uptime
        Micros::try_from(self.origin.elapsed().as_micros()).unwrap_or(Micros::MAX)
    }
}

/// Clock that only moves when told to. Lets tests script exact timings.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Micros>,
}

impl ManualClock {
    pub fn new(start: Micros) -> Self {
        ManualClock {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: Micros) {
        debug_assert!(now >= self.now.get(), "clock must not run backwards");
        self.now.set(now);
    }

    pub fn advance(&self, delta: Micros) {
        self.now.set(self.now.get() + delta);
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> Micros {
        self.now.get()
    }
}

impl<C: MonotonicClock + ?Sized> MonotonicClock for &C {
    fn now(&self) -> Micros {
        (**self).now()
    }
}
