use std::time::Duration;

/// Identifies one countdown. A handle from a cancelled or replaced countdown
/// never matches again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    pub question: usize,
    generation: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerTick {
    Remaining(u32),
    /// Reached zero on this tick; the countdown has stopped itself
    Expired,
    /// No live countdown, or the handle is stale
    Ignored,
}

#[derive(Clone, Copy, Debug)]
struct Countdown {
    handle: TimerHandle,
    remaining: u32,
}

/// Single per-question countdown with one-second resolution
#[derive(Debug, Default)]
pub struct RoundTimer {
    live: Option<Countdown>,
    generation: u64,
}

impl RoundTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh countdown, cancelling any previous one first
    pub fn start(&mut self, question: usize, secs: u32) -> TimerHandle {
        self.cancel();
        self.generation += 1;
        let handle = TimerHandle {
            question,
            generation: self.generation,
        };
        self.live = Some(Countdown {
            handle,
            remaining: secs,
        });
        handle
    }

    pub fn cancel(&mut self) {
        self.live = None;
    }

    pub fn is_running(&self) -> bool {
        self.live.is_some()
    }

    pub fn handle(&self) -> Option<TimerHandle> {
        self.live.map(|c| c.handle)
    }

    pub fn remaining(&self) -> Option<u32> {
        self.live.map(|c| c.remaining)
    }

    /// Deliver one tick on behalf of `handle`
    pub fn tick(&mut self, handle: TimerHandle) -> TimerTick {
        let Some(countdown) = self.live.as_mut() else {
            return TimerTick::Ignored;
        };
        if countdown.handle != handle {
            return TimerTick::Ignored;
        }

        countdown.remaining = countdown.remaining.saturating_sub(1);
        if countdown.remaining == 0 {
            self.live = None;
            TimerTick::Expired
        } else {
            TimerTick::Remaining(countdown.remaining)
        }
    }
}

/// Turns a continuously advancing clock into whole-second pulses.
///
/// Any host that can report elapsed time drives the countdown through this,
/// whatever its own tick rate.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecondPulse {
    anchor: Duration,
}

impl SecondPulse {
    pub const PERIOD: Duration = Duration::from_secs(1);

    pub fn reset(&mut self, now: Duration) {
        self.anchor = now;
    }

    /// Number of whole seconds passed since the last pulse
    pub fn advance(&mut self, now: Duration) -> u32 {
        let mut pulses = 0;
        while now.saturating_sub(self.anchor) >= Self::PERIOD {
            self.anchor += Self::PERIOD;
            pulses += 1;
        }
        pulses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_down_and_expires_once() {
        let mut timer = RoundTimer::new();
        let handle = timer.start(0, 3);

        assert_eq!(timer.tick(handle), TimerTick::Remaining(2));
        assert_eq!(timer.tick(handle), TimerTick::Remaining(1));
        assert_eq!(timer.tick(handle), TimerTick::Expired);
        assert!(!timer.is_running());

        // no negative ticks, no second expiry
        assert_eq!(timer.tick(handle), TimerTick::Ignored);
        assert_eq!(timer.remaining(), None);
    }

    #[test]
    fn test_start_replaces_previous_countdown() {
        let mut timer = RoundTimer::new();
        let old = timer.start(0, 30);
        let new = timer.start(1, 30);

        assert_ne!(old, new);
        assert_eq!(timer.tick(old), TimerTick::Ignored);
        assert_eq!(timer.tick(new), TimerTick::Remaining(29));
    }

    #[test]
    fn test_restart_same_question_invalidates_handle() {
        let mut timer = RoundTimer::new();
        let first = timer.start(4, 10);
        let second = timer.start(4, 10);
        assert_eq!(timer.tick(first), TimerTick::Ignored);
        assert_eq!(timer.tick(second), TimerTick::Remaining(9));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut timer = RoundTimer::new();
        timer.cancel();
        let handle = timer.start(0, 5);
        timer.cancel();
        timer.cancel();
        assert_eq!(timer.tick(handle), TimerTick::Ignored);
    }

    #[test]
    fn test_zero_length_countdown_expires_on_first_tick() {
        let mut timer = RoundTimer::new();
        let handle = timer.start(0, 0);
        assert_eq!(timer.tick(handle), TimerTick::Expired);
    }

    #[test]
    fn test_second_pulse() {
        let mut pulse = SecondPulse::default();
        pulse.reset(Duration::from_millis(500));

        assert_eq!(pulse.advance(Duration::from_millis(1_499)), 0);
        assert_eq!(pulse.advance(Duration::from_millis(1_500)), 1);
        assert_eq!(pulse.advance(Duration::from_millis(1_600)), 0);
        assert_eq!(pulse.advance(Duration::from_millis(4_700)), 3);
    }

    #[test]
    fn test_second_pulse_ignores_clock_going_backwards() {
        let mut pulse = SecondPulse::default();
        pulse.reset(Duration::from_secs(10));
        assert_eq!(pulse.advance(Duration::from_secs(2)), 0);
    }
}
