//! Tick-driven periodic timers
//!
//! Timers count whole ticks rather than wall time. The orchestrator thread
//! feeds them from one base ticker; tests feed them by calling `tick()`.

/// Lifecycle of a [`PeriodicTimer`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimerMode {
    #[default]
    Disarmed,
    Armed,
    /// Armed, but the countdown is frozen
    Paused,
}

/// Countdown that fires every `period` ticks while armed
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodicTimer {
    period: u32,
    remaining: u32,
    mode: TimerMode,
}

impl PeriodicTimer {
    /// New disarmed timer; a zero period is treated as one tick
    pub fn new(period: u32) -> Self {
        let period = period.max(1);
        Self {
            period,
            remaining: period,
            mode: TimerMode::Disarmed,
        }
    }

    /// Start counting from the full period
    pub fn arm(&mut self) {
        self.mode = TimerMode::Armed;
        self.remaining = self.period;
    }

    pub fn disarm(&mut self) {
        self.mode = TimerMode::Disarmed;
    }

    /// Freeze the countdown; no-op unless armed
    pub fn pause(&mut self) {
        if self.mode == TimerMode::Armed {
            self.mode = TimerMode::Paused;
        }
    }

    /// Unfreeze the countdown where it stopped; no-op unless paused
    pub fn resume(&mut self) {
        if self.mode == TimerMode::Paused {
            self.mode = TimerMode::Armed;
        }
    }

    /// Restart the countdown from the full period, keeping the mode
    pub fn reset(&mut self) {
        self.remaining = self.period;
    }

    /// Advance one tick. Returns true when the timer fires.
    pub fn tick(&mut self) -> bool {
        if self.mode != TimerMode::Armed {
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.remaining = self.period;
            true
        } else {
            false
        }
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn is_armed(&self) -> bool {
        self.mode == TimerMode::Armed
    }

    pub fn is_paused(&self) -> bool {
        self.mode == TimerMode::Paused
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Ticks until the next firing; `None` while disarmed
    pub fn remaining(&self) -> Option<u32> {
        match self.mode {
            TimerMode::Disarmed => None,
            TimerMode::Armed | TimerMode::Paused => Some(self.remaining),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticks_until_fire(timer: &mut PeriodicTimer, limit: u32) -> Option<u32> {
        (1..=limit).find(|_| timer.tick())
    }

    #[test]
    fn test_disarmed_never_fires() {
        let mut timer = PeriodicTimer::new(3);
        assert_eq!(ticks_until_fire(&mut timer, 10), None);
        assert_eq!(timer.remaining(), None);
    }

    #[test]
    fn test_fires_every_period() {
        let mut timer = PeriodicTimer::new(3);
        timer.arm();
        assert_eq!(ticks_until_fire(&mut timer, 10), Some(3));
        assert_eq!(timer.remaining(), Some(3));
        assert_eq!(ticks_until_fire(&mut timer, 10), Some(3));
    }

    #[test]
    fn test_pause_freezes_countdown() {
        let mut timer = PeriodicTimer::new(5);
        timer.arm();
        timer.tick();
        timer.tick();
        timer.pause();
        assert!(timer.is_paused());
        assert_eq!(ticks_until_fire(&mut timer, 20), None);
        assert_eq!(timer.remaining(), Some(3));

        timer.resume();
        assert_eq!(ticks_until_fire(&mut timer, 20), Some(3));
    }

    #[test]
    fn test_resume_with_reset() {
        let mut timer = PeriodicTimer::new(5);
        timer.arm();
        timer.tick();
        timer.pause();
        timer.resume();
        timer.reset();
        assert_eq!(timer.remaining(), Some(5));
        assert_eq!(ticks_until_fire(&mut timer, 20), Some(5));
    }

    #[test]
    fn test_pause_and_resume_ignored_when_disarmed() {
        let mut timer = PeriodicTimer::new(2);
        timer.pause();
        assert_eq!(timer.mode(), TimerMode::Disarmed);
        timer.resume();
        assert_eq!(timer.mode(), TimerMode::Disarmed);
    }

    #[test]
    fn test_disarm_stops_ticks() {
        let mut timer = PeriodicTimer::new(1);
        timer.arm();
        assert!(timer.tick());
        timer.disarm();
        assert!(!timer.tick());
    }

    #[test]
    fn test_zero_period_is_one_tick() {
        let mut timer = PeriodicTimer::new(0);
        timer.arm();
        assert_eq!(timer.period(), 1);
        assert!(timer.tick());
    }
}
