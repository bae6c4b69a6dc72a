//! Timing configuration for the narration orchestrator

use serde::Deserialize;
use std::time::Duration;

/// Orchestrator timing and channel sizing
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct NarrationConfig {
    /// Ticks between automatic refreshes
    pub refresh_interval_ticks: u32,

    /// Wall-clock length of one tick, in milliseconds
    pub tick_period_ms: u64,

    /// Ticks between playback-progress updates while narrating
    pub progress_interval_ticks: u32,

    /// Capacity of the command and event channels
    pub channel_buffer_size: usize,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ticks: 30,
            tick_period_ms: 1000,
            progress_interval_ticks: 1,
            channel_buffer_size: 100,
        }
    }
}

impl NarrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of ticks between automatic refreshes
    pub fn with_refresh_interval(mut self, ticks: u32) -> Self {
        self.refresh_interval_ticks = ticks;
        self
    }

    /// Set the wall-clock tick length
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period_ms = period.as_millis() as u64;
        self
    }

    /// Set the number of ticks between progress updates
    pub fn with_progress_interval(mut self, ticks: u32) -> Self {
        self.progress_interval_ticks = ticks;
        self
    }

    pub fn with_channel_buffer_size(mut self, size: usize) -> Self {
        self.channel_buffer_size = size;
        self
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.refresh_interval_ticks == 0 {
            return Err("refresh-interval-ticks must be at least 1".to_string());
        }
        if self.tick_period_ms == 0 {
            return Err("tick-period-ms must be at least 1".to_string());
        }
        if self.progress_interval_ticks == 0 {
            return Err("progress-interval-ticks must be at least 1".to_string());
        }
        if self.channel_buffer_size == 0 {
            return Err("channel-buffer-size must be at least 1".to_string());
        }
        Ok(())
    }
}
