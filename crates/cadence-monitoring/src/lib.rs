//! Logging setup for cadence hosts and tools.

use serde::{Deserialize, Serialize};
use tracing::info;

pub mod logging;

/// Configuration for initializing logging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// Service name attached to the startup log line
    pub service_name: String,
    /// Log level filter (e.g., "info,cadence_core=debug"); `RUST_LOG` wins when set
    pub log_filter: String,
    /// Emit JSON lines instead of human readable output
    pub json_logs: bool,
    /// Include source file and line in each event
    pub with_file_info: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: "cadence".to_string(),
            log_filter: "info".to_string(),
            json_logs: false,
            with_file_info: false,
        }
    }
}

impl MonitoringConfig {
    /// Default configuration for the given service
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Self::default()
        }
    }
}

/// Initialize logging for the process. Fails if a global subscriber is already set.
pub fn init(config: MonitoringConfig) -> anyhow::Result<()> {
    logging::init_logging(&config)?;
    info!(service_name = %config.service_name, "Monitoring initialized");
    Ok(())
}

/// Log the shutdown of the service
pub fn shutdown(config: &MonitoringConfig) {
    info!(service_name = %config.service_name, "Shutting down");
}
