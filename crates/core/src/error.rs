//! Error types for engine construction, parameter updates and ticks
//!
//! Out-of-bounds injections have no variant: they clip to nothing and succeed.
//! Tick timeouts are absent too; a tick that runs out of budget reports
//! [`TickOutcome::Partial`](crate::TickOutcome::Partial) instead of failing.

/// Errors returned by [`SimulationEngine`](crate::SimulationEngine) and its configuration
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Construction rejected: a dimension, worker count or skip factor is out of range,
    /// or the worker pool could not be built
    Configuration {
        /// Name of the offending configuration field (e.g. `"width"`, `"workers"`)
        field: &'static str,
        /// Description of the violated constraint
        message: String,
    },
    /// `feed` or `kill` was non-finite or negative; the previous pair stays in effect
    InvalidParameter {
        /// Parameter name (`"feed"` or `"kill"`)
        name: &'static str,
        /// The rejected value
        value: f64,
    },
    /// A worker panicked while computing its band; the tick was discarded
    WorkerFailure {
        /// Index of the band whose worker failed
        band: usize,
        /// Panic payload rendered as text
        message: String,
    },
    /// `step()` called before `initialize()`
    NotInitialized,
}

impl EngineError {
    /// Create a configuration error for `field`
    pub fn configuration(field: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Configuration { field, message } => {
                write!(f, "Invalid configuration '{field}': {message}")
            }
            EngineError::InvalidParameter { name, value } => {
                write!(
                    f,
                    "Invalid parameter '{name}': must be finite and non-negative, got {value}"
                )
            }
            EngineError::WorkerFailure { band, message } => {
                write!(f, "Worker for band {band} failed: {message}")
            }
            EngineError::NotInitialized => {
                write!(f, "Engine must be initialized before stepping")
            }
        }
    }
}

impl std::error::Error for EngineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_cause() {
        let err = EngineError::configuration("width", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "Invalid configuration 'width': must be positive, got 0"
        );

        let err = EngineError::InvalidParameter {
            name: "kill",
            value: -0.5,
        };
        assert!(err.to_string().contains("'kill'"));
        assert!(err.to_string().contains("-0.5"));

        let err = EngineError::WorkerFailure {
            band: 3,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Worker for band 3 failed: boom");
    }
}
