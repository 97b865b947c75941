// Cadence Integration Tests
//
// Scenario tests that drive a host frame by frame and check what the chains
// observably did.

/// Shared setup for integration tests
pub mod utils {
    use cadence_core::{FlowConfig, Host};
    use cadence_test_utils::{init_test_tracing, FrameDriver};
    use std::time::Duration;

    /// Frame length used by the scenarios
    pub const FRAME: Duration = Duration::from_millis(100);

    /// Host with default settings behind a 100ms frame driver
    pub fn driver() -> FrameDriver {
        init_test_tracing();
        FrameDriver::new(Host::new(), FRAME)
    }

    /// Host that defers every run to the next tick
    pub fn deferred_driver() -> FrameDriver {
        init_test_tracing();
        let config = FlowConfig {
            start_immediately: false,
            ..FlowConfig::default()
        };
        let host = Host::with_config(config).expect("valid config");
        FrameDriver::new(host, FRAME)
    }
}
