//! Controller configuration.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;

/// Lower bound of the default dwell range.
pub const DEFAULT_DWELL_MIN: Duration = Duration::from_secs(4);
/// Upper bound (exclusive) of the default dwell range.
pub const DEFAULT_DWELL_MAX: Duration = Duration::from_secs(6);
/// Largest accepted dwell bound, the longest span expressible in whole nanoseconds as a `u64`.
pub const MAX_DWELL: Duration = Duration::from_nanos(u64::MAX);
/// Name given to the cycling thread unless configured otherwise.
pub const DEFAULT_THREAD_NAME: &str = "phase-cycle";

/// Settings for a [`PhaseController`](crate::controller::PhaseController).
///
/// Use [`ControllerConfigBuilder`] to create one. `ControllerConfig::default()` holds each phase for 4 to 6
/// seconds and seeds its random source from the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    dwell_min: Duration,
    dwell_max: Duration,
    seed: Option<u64>,
    thread_name: String,
}

impl ControllerConfig {
    /// Shortest time a phase is held.
    pub fn dwell_min(&self) -> Duration {
        self.dwell_min
    }

    /// Exclusive upper bound on the time a phase is held.
    pub fn dwell_max(&self) -> Duration {
        self.dwell_max
    }

    /// Seed for the dwell generator, if fixed.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Name of the cycling thread.
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Draws a dwell time uniformly from `[dwell_min, dwell_max)`.
    pub fn sample_dwell(&self, rng: &mut impl Rng) -> Duration {
        let min = nanos(self.dwell_min);
        let max = nanos(self.dwell_max);
        Duration::from_nanos(rng.gen_range(min..max))
    }
}

// `build` rejects dwell bounds above `MAX_DWELL`, so this never saturates for a built config.
fn nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            dwell_min: DEFAULT_DWELL_MIN,
            dwell_max: DEFAULT_DWELL_MAX,
            seed: None,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }
}

/// A builder for `ControllerConfig`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use trafficlight_lib::config::ControllerConfigBuilder;
///
/// let config = ControllerConfigBuilder::new()
///     .dwell(Duration::from_millis(40), Duration::from_millis(60))
///     .seed(7)
///     .build()
///     .unwrap();
/// assert_eq!(config.seed(), Some(7));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    /// Creates a builder starting from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the range each dwell time is drawn from. `max` is exclusive.
    pub fn dwell(mut self, min: Duration, max: Duration) -> Self {
        self.config.dwell_min = min;
        self.config.dwell_max = max;
        self
    }

    /// Fixes the seed of the dwell generator so that runs are reproducible.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Names the cycling thread.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = name.into();
        self
    }

    /// Validates the settings and builds a `ControllerConfig`.
    pub fn build(self) -> Result<ControllerConfig, ConfigError> {
        let ControllerConfig {
            dwell_min,
            dwell_max,
            ..
        } = self.config;
        if dwell_min.is_zero() {
            return Err(ConfigError::ZeroDwell);
        }
        if dwell_min >= dwell_max {
            return Err(ConfigError::EmptyDwellRange {
                min: dwell_min,
                max: dwell_max,
            });
        }
        if dwell_max > MAX_DWELL {
            return Err(ConfigError::DwellTooLarge(dwell_max));
        }
        if self.config.thread_name.contains('\0') {
            return Err(ConfigError::InvalidThreadName(self.config.thread_name));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.dwell_min(), Duration::from_secs(4));
        assert_eq!(config.dwell_max(), Duration::from_secs(6));
        assert_eq!(config.seed(), None);
        assert_eq!(config.thread_name(), "phase-cycle");
        assert_eq!(ControllerConfigBuilder::new().build(), Ok(config));
    }

    #[test]
    fn test_builder_rejects_empty_range() {
        let min = Duration::from_millis(60);
        let max = Duration::from_millis(40);
        assert_eq!(
            ControllerConfigBuilder::new().dwell(min, max).build(),
            Err(ConfigError::EmptyDwellRange { min, max })
        );
        assert_eq!(
            ControllerConfigBuilder::new().dwell(min, min).build(),
            Err(ConfigError::EmptyDwellRange { min, max: min })
        );
    }

    #[test]
    fn test_builder_rejects_zero_dwell() {
        assert_eq!(
            ControllerConfigBuilder::new()
                .dwell(Duration::ZERO, Duration::from_millis(1))
                .build(),
            Err(ConfigError::ZeroDwell)
        );
    }

    #[test]
    fn test_builder_compares_large_bounds_exactly() {
        let min = Duration::from_secs(u64::MAX);
        assert_eq!(
            ControllerConfigBuilder::new().dwell(min, Duration::MAX).build(),
            Err(ConfigError::DwellTooLarge(Duration::MAX))
        );
        let min = MAX_DWELL - Duration::from_secs(1);
        let config = ControllerConfigBuilder::new()
            .dwell(min, MAX_DWELL)
            .build()
            .unwrap();
        let dwell = config.sample_dwell(&mut config.rng());
        assert!(dwell >= min && dwell < MAX_DWELL);
    }

    #[test]
    fn test_builder_rejects_nul_in_thread_name() {
        assert_eq!(
            ControllerConfigBuilder::new().thread_name("bad\0name").build(),
            Err(ConfigError::InvalidThreadName("bad\0name".to_string()))
        );
        let config = ControllerConfigBuilder::new()
            .thread_name("north-south")
            .build()
            .unwrap();
        assert_eq!(config.thread_name(), "north-south");
    }

    #[test]
    fn test_sampled_dwell_stays_in_range() {
        let config = ControllerConfig::default();
        let mut rng = config.rng();
        for _ in 0..10_000 {
            let dwell = config.sample_dwell(&mut rng);
            assert!(dwell >= DEFAULT_DWELL_MIN);
            assert!(dwell < DEFAULT_DWELL_MAX);
        }
    }

    #[test]
    fn test_seeded_dwell_is_reproducible() {
        let config = ControllerConfigBuilder::new().seed(42).build().unwrap();
        let mut a = config.rng();
        let mut b = config.rng();
        let first: Vec<_> = (0..16).map(|_| config.sample_dwell(&mut a)).collect();
        let second: Vec<_> = (0..16).map(|_| config.sample_dwell(&mut b)).collect();
        assert_eq!(first, second);
    }
}
