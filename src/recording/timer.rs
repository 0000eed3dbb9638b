//! Elapsed recording time display.
//!
//! Derives whole elapsed seconds from the moment capture began and formats
//! them as `M:SS` for the recording screen. The timer has no storage of its
//! own beyond the start instant; it is recomputed on each UI tick while
//! recording and frozen the moment stop is invoked.

use std::time::Instant;

/// Formats a duration in whole seconds as `M:SS`.
///
/// Minutes are unpadded, seconds are zero-padded to two digits:
/// `0` becomes `"0:00"`, `125` becomes `"2:05"`.
pub fn format_elapsed(secs: u64) -> String {
    let minutes = secs / 60;
    let seconds = secs % 60;
    format!("{minutes}:{seconds:02}")
}

/// Derives elapsed seconds from a recording start instant.
///
/// While recording, `tick()` recomputes the current value. `freeze()` pins
/// the display at the true recording duration; it is called exactly once,
/// when stop is invoked, before any upload work begins.
#[derive(Debug)]
pub struct ElapsedTimer {
    started_at: Instant,
    frozen: Option<u64>,
}

impl ElapsedTimer {
    /// Starts a timer at the given capture start instant.
    pub fn new(started_at: Instant) -> Self {
        Self {
            started_at,
            frozen: None,
        }
    }

    /// Returns the current elapsed whole seconds.
    ///
    /// After `freeze()` this always returns the frozen value.
    pub fn tick(&self) -> u64 {
        match self.frozen {
            Some(secs) => secs,
            None => self.started_at.elapsed().as_secs(),
        }
    }

    /// Stops the timer, pinning the display at the current duration.
    pub fn freeze(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some(self.started_at.elapsed().as_secs());
        }
    }

    /// Whether the timer has been frozen by a stop.
    pub fn is_frozen(&self) -> bool {
        self.frozen.is_some()
    }

    /// Current display text for the elapsed time surface.
    pub fn display(&self) -> String {
        format_elapsed(self.tick())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn format_zero_pads_seconds() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(5), "0:05");
        assert_eq!(format_elapsed(59), "0:59");
        assert_eq!(format_elapsed(60), "1:00");
        assert_eq!(format_elapsed(125), "2:05");
    }

    #[test]
    fn format_leaves_minutes_unpadded() {
        assert_eq!(format_elapsed(600), "10:00");
        assert_eq!(format_elapsed(3661), "61:01");
    }

    #[test]
    fn freeze_pins_the_value() {
        let mut timer = ElapsedTimer::new(Instant::now() - Duration::from_secs(7));
        assert!(!timer.is_frozen());
        timer.freeze();
        let pinned = timer.tick();
        assert_eq!(pinned, 7);
        assert!(timer.is_frozen());
        // Further ticks keep returning the frozen duration.
        assert_eq!(timer.tick(), pinned);
        assert_eq!(timer.display(), "0:07");
    }

    #[test]
    fn freeze_is_idempotent() {
        let mut timer = ElapsedTimer::new(Instant::now() - Duration::from_secs(3));
        timer.freeze();
        let first = timer.tick();
        timer.freeze();
        assert_eq!(timer.tick(), first);
    }
}
