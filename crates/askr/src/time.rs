//! Frame timing, delta time, and the fixed-timestep accumulator.
//!
//! The [`Time`] clock is advanced by the [`Scene`](crate::scene::Scene) at the
//! start of each frame with that frame's duration. It is driven entirely by
//! the caller, so a scene stepped with the same durations always sees the same
//! clock.

use std::time::Duration;

use crate::config::SceneConfig;

/// Frame clock owned by a scene.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    /// Duration of the current frame.
    delta: Duration,
    /// Sum of every frame's delta.
    elapsed: Duration,
    /// Frames advanced so far.
    frame_count: u64,
    /// Fixed-update interval.
    fixed_step: Duration,
    /// Time not yet consumed by fixed steps.
    accumulator: Duration,
    /// Cap on fixed steps per frame.
    max_fixed_steps: u32,
    /// Fixed steps due in the current frame.
    fixed_steps: u32,
}

impl Time {
    pub fn new(config: &SceneConfig) -> Self {
        let fixed_step = match Duration::try_from_secs_f32(config.fixed_timestep_secs) {
            Ok(step) if !step.is_zero() => step,
            _ => {
                log::warn!(
                    "Invalid fixed timestep {}s, falling back to 1/60s",
                    config.fixed_timestep_secs
                );
                Duration::from_nanos(16_666_667)
            }
        };
        Self {
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_step,
            accumulator: Duration::ZERO,
            max_fixed_steps: config.max_fixed_steps_per_frame.max(1),
            fixed_steps: 0,
        }
    }

    /// Start a new frame that lasted `delta`. Returns how many fixed steps
    /// are due this frame.
    ///
    /// At most `max_fixed_steps_per_frame` steps run; any backlog beyond that
    /// is dropped so a long stall can't snowball into ever longer frames.
    pub fn advance(&mut self, delta: Duration) -> u32 {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
        self.accumulator += delta;

        let mut steps = 0;
        while self.accumulator >= self.fixed_step && steps < self.max_fixed_steps {
            self.accumulator -= self.fixed_step;
            steps += 1;
        }
        if self.accumulator >= self.fixed_step {
            let dropped = self.accumulator.as_nanos() / self.fixed_step.as_nanos().max(1);
            log::warn!(
                "Frame {} fell behind: dropping {dropped} fixed step(s) beyond the cap of {}",
                self.frame_count,
                self.max_fixed_steps
            );
            self.accumulator = Duration::from_nanos(
                (self.accumulator.as_nanos() % self.fixed_step.as_nanos().max(1)) as u64,
            );
        }

        self.fixed_steps = steps;
        steps
    }

    /// Duration of the current frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds (f32), the most common way to use it.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames advanced so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fixed_step(&self) -> Duration {
        self.fixed_step
    }

    pub fn fixed_step_secs(&self) -> f32 {
        self.fixed_step.as_secs_f32()
    }

    /// Fixed steps due in the current frame.
    pub fn fixed_steps(&self) -> u32 {
        self.fixed_steps
    }

    /// Fraction of a fixed step carried into the next frame, in `[0, 1)`.
    pub fn overstep_fraction(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.fixed_step.as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(&SceneConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn clock(step_ms: u64, cap: u32) -> Time {
        Time::new(&SceneConfig {
            fixed_timestep_secs: step_ms as f32 / 1000.0,
            max_fixed_steps_per_frame: cap,
        })
    }

    #[test]
    fn accumulates_until_a_step_is_due() {
        let mut time = clock(10, 4);
        assert_eq!(time.advance(Duration::from_millis(6)), 0);
        assert_eq!(time.advance(Duration::from_millis(6)), 1);
        assert_eq!(time.fixed_steps(), 1);
        assert_eq!(time.frame_count(), 2);
        assert_eq!(time.elapsed(), Duration::from_millis(12));
    }

    #[test]
    fn long_frame_runs_several_steps() {
        let mut time = clock(10, 4);
        assert_eq!(time.advance(Duration::from_millis(35)), 3);
        assert_abs_diff_eq!(time.overstep_fraction(), 0.5, epsilon = 1e-3);
    }

    #[test]
    fn backlog_beyond_cap_is_dropped() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut time = clock(10, 2);
        assert_eq!(time.advance(Duration::from_millis(55)), 2);
        // 35 ms over the cap: three steps dropped, 5 ms carried.
        assert_abs_diff_eq!(time.overstep_fraction(), 0.5, epsilon = 1e-3);
        assert_eq!(time.advance(Duration::from_millis(5)), 1);
    }

    #[test]
    fn delta_reports_current_frame() {
        let mut time = Time::default();
        time.advance(Duration::from_millis(16));
        assert_abs_diff_eq!(time.delta_secs(), 0.016, epsilon = 1e-6);
    }
}
