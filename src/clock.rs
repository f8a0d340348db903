use std::cell::Cell;
use std::time::Instant;

pub trait Clock {
    fn ticks(&self) -> u64;
}

pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn ticks(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn advance(&self, millis: u64) {
        self.now.set(self.now.get().saturating_add(millis));
    }

    pub fn set(&self, ticks: u64) {
        self.now.set(ticks);
    }
}

impl Clock for ManualClock {
    fn ticks(&self) -> u64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn ticks(&self) -> u64 {
        (**self).ticks()
    }
}

/// Tick bookkeeping for the track a session is playing.
///
/// `started_at` is signed because a forward seek early in the process
/// lifetime places the virtual start before tick zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayClock {
    started_at: i64,
    accumulated_paused: u64,
    pause_started_at: Option<u64>,
}

impl PlayClock {
    pub fn started(now: u64) -> Self {
        Self {
            started_at: to_signed(now),
            accumulated_paused: 0,
            pause_started_at: None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.pause_started_at.is_some()
    }

    pub fn accumulated_paused(&self) -> u64 {
        self.accumulated_paused
    }

    /// Milliseconds of the track played so far. Frozen at the instant the
    /// pause began while paused.
    pub fn elapsed_ms(&self, now: u64) -> u64 {
        let reference = self.pause_started_at.unwrap_or(now);
        let elapsed = i128::from(to_signed(reference))
            - i128::from(self.started_at)
            - i128::from(self.accumulated_paused);
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }

    pub fn pause(&mut self, now: u64) {
        if self.pause_started_at.is_none() {
            self.pause_started_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: u64) {
        if let Some(began) = self.pause_started_at.take() {
            self.accumulated_paused = self
                .accumulated_paused
                .saturating_add(now.saturating_sub(began));
        }
    }

    pub fn seek_to(&mut self, now: u64, position_ms: u64) {
        let reference = self.pause_started_at.unwrap_or(now);
        self.started_at = to_signed(reference)
            .saturating_sub(to_signed(position_ms))
            .saturating_sub(to_signed(self.accumulated_paused));
    }
}

fn to_signed(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prop_assert;

    #[test]
    fn elapsed_counts_from_start() {
        let clock = PlayClock::started(1_000);
        assert_eq!(clock.elapsed_ms(1_000), 0);
        assert_eq!(clock.elapsed_ms(4_500), 3_500);
    }

    #[test]
    fn elapsed_is_frozen_while_paused() {
        let mut clock = PlayClock::started(0);
        clock.pause(2_000);
        assert_eq!(clock.elapsed_ms(2_000), 2_000);
        assert_eq!(clock.elapsed_ms(9_000), 2_000);
    }

    #[test]
    fn resume_discounts_paused_time() {
        let mut clock = PlayClock::started(0);
        clock.pause(2_000);
        clock.resume(5_000);
        assert_eq!(clock.accumulated_paused(), 3_000);
        assert_eq!(clock.elapsed_ms(6_000), 3_000);
    }

    #[test]
    fn seek_is_reflected_immediately() {
        let mut clock = PlayClock::started(100);
        clock.pause(500);
        clock.resume(1_500);
        clock.seek_to(2_000, 30_000);
        assert_eq!(clock.elapsed_ms(2_000), 30_000);
        assert_eq!(clock.elapsed_ms(2_250), 30_250);
    }

    #[test]
    fn seek_while_paused_holds_new_position() {
        let mut clock = PlayClock::started(0);
        clock.pause(4_000);
        clock.seek_to(7_000, 14_000);
        assert_eq!(clock.elapsed_ms(7_000), 14_000);
        assert_eq!(clock.elapsed_ms(8_000), 14_000);
    }

    #[test]
    fn forward_seek_near_tick_zero_does_not_wrap() {
        let mut clock = PlayClock::started(0);
        clock.seek_to(50, 120_000);
        assert_eq!(clock.elapsed_ms(50), 120_000);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(10);
        clock.advance(15);
        assert_eq!(clock.ticks(), 25);
        clock.set(3);
        assert_eq!(clock.ticks(), 3);
    }

    proptest::proptest! {
        #[test]
        fn elapsed_is_monotonic_while_playing(start in 0u64..1_000_000, steps in proptest::collection::vec(0u64..5_000, 1..50)) {
            let clock = PlayClock::started(start);
            let mut now = start;
            let mut last = clock.elapsed_ms(now);
            for step in steps {
                now += step;
                let elapsed = clock.elapsed_ms(now);
                prop_assert!(elapsed >= last);
                last = elapsed;
            }
        }

        #[test]
        fn pause_round_trip_preserves_elapsed(start in 0u64..100_000, played in 0u64..100_000, paused_for in 0u64..100_000) {
            let mut clock = PlayClock::started(start);
            let before = clock.elapsed_ms(start + played);
            clock.pause(start + played);
            clock.resume(start + played + paused_for);
            prop_assert!(clock.elapsed_ms(start + played + paused_for) == before);
        }
    }
}
