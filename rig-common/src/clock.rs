//! Playback clock for a single clip.
//!
//! The sampler never wraps time on its own; this clock is the caller-side
//! loop: time advances by the frame delta and drops back to zero once it
//! passes the clip's duration.

use crate::formats::Animation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationClock {
    time: f32,
    duration: f32,
}

impl AnimationClock {
    pub fn new(duration: f32) -> Self {
        Self {
            time: 0.0,
            duration: duration.max(0.0),
        }
    }

    pub fn for_animation(animation: &Animation) -> Self {
        Self::new(animation.duration)
    }

    /// Time to sample this frame, in seconds
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Advance by `dt` seconds, restarting at zero past the end of the clip.
    /// Negative deltas are ignored.
    pub fn advance(&mut self, dt: f32) {
        self.time += dt.max(0.0);
        if self.time > self.duration {
            self.time = 0.0;
        }
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_loops_past_duration() {
        let mut clock = AnimationClock::new(1.0);
        clock.advance(0.5);
        assert_eq!(clock.time(), 0.5);
        clock.advance(0.5);
        // Exactly at the end is still inside the clip
        assert_eq!(clock.time(), 1.0);
        clock.advance(0.25);
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn test_clock_ignores_negative_delta() {
        let mut clock = AnimationClock::new(2.0);
        clock.advance(0.75);
        clock.advance(-5.0);
        assert_eq!(clock.time(), 0.75);
        clock.reset();
        assert_eq!(clock.time(), 0.0);
    }

    #[test]
    fn test_clock_from_animation() {
        let animation = Animation {
            id: 3,
            duration: 2.5,
            tracks: Vec::new(),
        };
        let clock = AnimationClock::for_animation(&animation);
        assert_eq!(clock.duration(), 2.5);
        assert_eq!(clock.time(), 0.0);
    }
}
