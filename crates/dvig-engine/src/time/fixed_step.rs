use std::time::Duration;

use crate::diagnostics::ConfigError;

/// Fixed-timestep accumulator.
///
/// Real elapsed time is added with [`FixedStep::advance`]; whole steps are then
/// drained while the accumulator holds at least one step. The remainder carries
/// into the next frame, so the total number of steps only depends on the total
/// time fed in, not on how it was split across frames.
///
/// Time is kept as integer nanoseconds to keep step counts exact.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
}

impl FixedStep {
    /// `step` must be non-zero.
    pub fn new(step: Duration) -> Result<Self, ConfigError> {
        if step.is_zero() {
            return Err(ConfigError::ZeroFixedRate(0.0));
        }
        Ok(Self {
            step,
            accumulator: Duration::ZERO,
        })
    }

    /// Step of `1 / updates_per_second`.
    pub fn from_rate(updates_per_second: f32) -> Result<Self, ConfigError> {
        if !updates_per_second.is_finite() || updates_per_second <= 0.0 {
            return Err(ConfigError::ZeroFixedRate(updates_per_second));
        }
        Self::new(Duration::from_secs_f64(1.0 / updates_per_second as f64))
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Time accumulated but not yet consumed by a step.
    pub fn remainder(&self) -> Duration {
        self.accumulator
    }

    /// Adds `dt` to the accumulator.
    pub fn advance(&mut self, dt: Duration) {
        self.accumulator = self.accumulator.saturating_add(dt);
    }

    /// Consumes one step if enough time is accumulated.
    pub fn try_step(&mut self) -> bool {
        if self.accumulator >= self.step {
            self.accumulator -= self.step;
            true
        } else {
            false
        }
    }

    /// Adds `dt` and drains every whole step, returning how many were taken.
    pub fn consume(&mut self, dt: Duration) -> u32 {
        self.advance(dt);
        let mut steps = 0;
        while self.try_step() {
            steps += 1;
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn zero_rate_is_a_config_error() {
        assert!(FixedStep::from_rate(0.0).is_err());
        assert!(FixedStep::new(Duration::ZERO).is_err());
    }

    #[test]
    fn per_frame_counts_at_fifty_ups() {
        // 0.05 -> two steps, 0.01 left; +0.0 -> none; +0.03 = 0.04 -> two steps.
        let mut fixed = FixedStep::from_rate(50.0).unwrap();
        let counts: Vec<u32> = [ms(50), ms(0), ms(30)]
            .into_iter()
            .map(|dt| fixed.consume(dt))
            .collect();
        assert_eq!(counts, vec![2, 0, 2]);
        assert_eq!(fixed.remainder(), Duration::ZERO);
    }

    #[test]
    fn total_steps_do_not_depend_on_frame_split() {
        let splits: [&[u64]; 4] = [
            &[1000],
            &[7, 13, 980],
            &[333, 333, 334],
            &[1; 1000],
        ];

        for split in splits {
            let mut fixed = FixedStep::from_rate(60.0).unwrap();
            let total: u32 = split.iter().map(|&v| fixed.consume(ms(v))).sum();
            let expected = (ms(1000).as_nanos() / fixed.step().as_nanos()) as u32;
            assert_eq!(total, expected, "split {split:?}");
        }
    }

    #[test]
    fn long_stall_catches_up_in_one_frame() {
        let mut fixed = FixedStep::new(ms(10)).unwrap();
        assert_eq!(fixed.consume(ms(95)), 9);
        assert_eq!(fixed.remainder(), ms(5));
    }
}
