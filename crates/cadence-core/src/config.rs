//! Configuration for the flow scheduler
//!
//! Values come from serde defaults, an optional YAML document and
//! `CADENCE_*` environment variables, in that order.

use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, warn};

use crate::error::{FlowError, FlowResult};

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Maximum number of idle chains the pool keeps around
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle: usize,

    /// Number of chains allocated when the pool is created
    #[serde(default)]
    pub pool_prewarm: usize,

    /// Initial time scale of the host clock (0 pauses scaled time)
    #[serde(default = "default_time_scale")]
    pub time_scale: f64,

    /// Time-scale flag used by `FlowChain::run_default`
    #[serde(default)]
    pub ignore_time_scale: bool,

    /// Run the first synchronous stretch of a chain inside `run()`
    /// instead of waiting for the next host tick
    #[serde(default = "default_start_immediately")]
    pub start_immediately: bool,
}

fn default_pool_max_idle() -> usize {
    64
}

fn default_time_scale() -> f64 {
    1.0
}

fn default_start_immediately() -> bool {
    true
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            pool_max_idle: default_pool_max_idle(),
            pool_prewarm: 0,
            time_scale: default_time_scale(),
            ignore_time_scale: false,
            start_immediately: default_start_immediately(),
        }
    }
}

impl FlowConfig {
    /// Load configuration from defaults overridden by environment variables
    pub fn load() -> FlowResult<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        debug!(?config, "Flow configuration loaded");
        Ok(config)
    }

    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(source: &str) -> FlowResult<Self> {
        let config: Self = serde_yaml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CADENCE_*` overrides from the given lookup.
    ///
    /// Unparsable values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("CADENCE_POOL_MAX_IDLE") {
            match value.parse::<usize>() {
                Ok(max_idle) => self.pool_max_idle = max_idle,
                Err(_) => warn!("Invalid CADENCE_POOL_MAX_IDLE value: {}", value),
            }
        }

        if let Some(value) = lookup("CADENCE_POOL_PREWARM") {
            match value.parse::<usize>() {
                Ok(prewarm) => self.pool_prewarm = prewarm,
                Err(_) => warn!("Invalid CADENCE_POOL_PREWARM value: {}", value),
            }
        }

        if let Some(value) = lookup("CADENCE_TIME_SCALE") {
            match value.parse::<f64>() {
                Ok(scale) => self.time_scale = scale,
                Err(_) => warn!("Invalid CADENCE_TIME_SCALE value: {}", value),
            }
        }

        if let Some(value) = lookup("CADENCE_IGNORE_TIME_SCALE") {
            match parse_flag(&value) {
                Some(flag) => self.ignore_time_scale = flag,
                None => warn!("Invalid CADENCE_IGNORE_TIME_SCALE value: {}", value),
            }
        }

        if let Some(value) = lookup("CADENCE_START_IMMEDIATELY") {
            match parse_flag(&value) {
                Some(flag) => self.start_immediately = flag,
                None => warn!("Invalid CADENCE_START_IMMEDIATELY value: {}", value),
            }
        }
    }

    /// Check the configuration for values the scheduler cannot honour
    pub fn validate(&self) -> FlowResult<()> {
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(FlowError::Configuration(format!(
                "time_scale must be a finite, non-negative number (got {})",
                self.time_scale
            )));
        }

        if self.pool_prewarm > self.pool_max_idle {
            return Err(FlowError::Configuration(format!(
                "pool_prewarm ({}) exceeds pool_max_idle ({})",
                self.pool_prewarm, self.pool_max_idle
            )));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
