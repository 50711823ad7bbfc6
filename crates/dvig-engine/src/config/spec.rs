use std::path::PathBuf;
use std::time::Duration;

use crate::diagnostics::{ConfigError, ErrorPolicy};

/// Directory holding the engine's own shader sources.
pub const CORE_SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/shaders/core");

/// Application configuration consumed by the runtime.
///
/// `width`/`height` of `0` let the platform pick the window size; the runtime
/// writes the actual drawable size back before the device is created.
#[derive(Debug, Clone)]
pub struct AppSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,

    /// Fixed-step updates per second. Must be greater than zero.
    pub fixed_ups: f32,

    /// Interval passed to `present` each frame. `1` waits for vertical sync.
    pub vsync_interval: u32,

    pub core_shader_dir: PathBuf,
    pub error_policy: ErrorPolicy,

    /// Command-line arguments, passed through untouched.
    pub args: Vec<String>,
}

impl Default for AppSpec {
    fn default() -> Self {
        Self {
            title: "dvig".to_string(),
            width: 0,
            height: 0,
            fixed_ups: 50.0,
            vsync_interval: 1,
            core_shader_dir: PathBuf::from(CORE_SHADER_DIR),
            error_policy: ErrorPolicy::default(),
            args: Vec::new(),
        }
    }
}

impl AppSpec {
    /// Default spec with the process arguments captured.
    pub fn from_env() -> Self {
        Self {
            args: std::env::args().collect(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn fixed_ups(mut self, fixed_ups: f32) -> Self {
        self.fixed_ups = fixed_ups;
        self
    }

    pub fn vsync_interval(mut self, interval: u32) -> Self {
        self.vsync_interval = interval;
        self
    }

    pub fn core_shader_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.core_shader_dir = dir.into();
        self
    }

    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn uses_default_size(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fixed_dt().map(|_| ())
    }

    /// Length of one fixed step, `1 / fixed_ups`.
    pub fn fixed_dt(&self) -> Result<Duration, ConfigError> {
        if !self.fixed_ups.is_finite() || self.fixed_ups <= 0.0 {
            return Err(ConfigError::ZeroFixedRate(self.fixed_ups));
        }
        Ok(Duration::from_secs_f64(1.0 / self.fixed_ups as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_is_rejected() {
        let spec = AppSpec::default().fixed_ups(0.0);
        assert_eq!(spec.validate(), Err(ConfigError::ZeroFixedRate(0.0)));
    }

    #[test]
    fn negative_and_nan_rates_are_rejected() {
        assert!(AppSpec::default().fixed_ups(-5.0).validate().is_err());
        assert!(AppSpec::default().fixed_ups(f32::NAN).validate().is_err());
    }

    #[test]
    fn fixed_dt_for_fifty_ups() {
        let spec = AppSpec::default().fixed_ups(50.0);
        assert_eq!(spec.fixed_dt(), Ok(Duration::from_millis(20)));
    }

    #[test]
    fn zero_size_means_platform_default() {
        assert!(AppSpec::default().uses_default_size());
        assert!(!AppSpec::default().size(1280, 720).uses_default_size());
    }

    #[test]
    fn builder_sets_fields() {
        let spec = AppSpec::default()
            .title("sandbox")
            .size(800, 600)
            .vsync_interval(0)
            .core_shader_dir("/tmp/shaders");
        assert_eq!(spec.title, "sandbox");
        assert_eq!((spec.width, spec.height), (800, 600));
        assert_eq!(spec.vsync_interval, 0);
        assert_eq!(spec.core_shader_dir, PathBuf::from("/tmp/shaders"));
    }
}
