use thiserror::Error;

/// Result alias used throughout the scheduler
pub type FlowResult<T> = Result<T, FlowError>;

/// Error type for flow chains, steps and configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The owning lifetime (or the run itself) was cancelled
    #[error("Flow chain cancelled")]
    Cancelled,

    /// A caller-supplied callback reported a failure
    #[error("Callback failed: {0}")]
    Callback(String),

    /// A unit of work reported a failure
    #[error("Step execution error: {0}")]
    Step(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The host driving the owner has been dropped
    #[error("Host unavailable: {0}")]
    HostUnavailable(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl FlowError {
    /// Whether this error is the silent cancellation signal rather than a fault
    pub fn is_cancellation(&self) -> bool {
        matches!(self, FlowError::Cancelled)
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for FlowError {
    fn from(err: serde_yaml::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}

impl From<String> for FlowError {
    fn from(err: String) -> Self {
        FlowError::Other(err)
    }
}

impl From<&str> for FlowError {
    fn from(err: &str) -> Self {
        FlowError::Other(err.to_string())
    }
}
