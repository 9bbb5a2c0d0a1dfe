//! Radio configuration.

use crate::Result;
use cabin_spatial::PannerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RadioConfig {
    pub sample_rate: f64,
    /// Initial user volume, `0..=1`.
    pub volume: f32,
    pub spatial_enabled: bool,
    /// Construction defaults for every renderer.
    pub renderer: PannerConfig,
    pub progress_tick_ms: u64,
    pub attach_retry: RetryConfig,
}

/// Bounded exponential backoff for source attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub initial_delay_ms: u64,
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 250,
            max_attempts: 6,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (0-based): initial delay, doubling.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.initial_delay_ms.saturating_mul(factor))
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            volume: 0.8,
            spatial_enabled: true,
            renderer: PannerConfig::default(),
            progress_tick_ms: 1000,
            attach_retry: RetryConfig::default(),
        }
    }
}

impl RadioConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RadioConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(invalid(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(invalid(format!("volume {} out of range (0-1)", self.volume)));
        }
        if self.progress_tick_ms == 0 {
            return Err(invalid("progress_tick_ms must be non-zero".into()));
        }
        if self.attach_retry.initial_delay_ms == 0 {
            return Err(invalid("attach_retry.initial_delay_ms must be non-zero".into()));
        }
        self.renderer.validate()?;
        Ok(())
    }

    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms)
    }
}

fn invalid(message: String) -> crate::Error {
    crate::Error::Core(cabin_core::Error::InvalidConfig(message))
}
