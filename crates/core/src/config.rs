//! Engine configuration
//!
//! All settings are fixed for the lifetime of an engine except `feed` and `kill`, which
//! only seed the initial parameter pair and can be changed later through
//! [`SimulationEngine::set_parameters`](crate::SimulationEngine::set_parameters).

use crate::error::EngineError;
use crate::stepper::ReactionParams;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

/// How long `step()` may spend in its parallel phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WaitPolicy {
    /// Every band runs to completion (correctness-first)
    #[default]
    Indefinite,
    /// Rows not started before the budget elapses keep their current values and the tick
    /// is reported as partial (latency-first)
    Bounded {
        /// Budget for the parallel phase in milliseconds
        budget_ms: u64,
    },
}

impl WaitPolicy {
    /// Tick budget, or `None` when waiting indefinitely
    #[must_use]
    pub fn budget(&self) -> Option<Duration> {
        match self {
            Self::Indefinite => None,
            Self::Bounded { budget_ms } => Some(Duration::from_millis(*budget_ms)),
        }
    }
}

/// Construction-time settings for a [`SimulationEngine`](crate::SimulationEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Worker threads; `None` uses the available hardware parallelism
    pub workers: Option<usize>,
    /// Side of the centered B seed imprinted by `initialize()`; 0 imprints none
    pub seed_size: usize,
    /// Radius of the disc written by `inject_at`
    pub injection_radius: usize,
    /// Evaluate every Nth cell and replicate it over an N×N block; 1 updates every cell
    pub resolution_skip: usize,
    /// Barrier policy for the parallel phase of a tick
    pub wait_policy: WaitPolicy,
    /// Initial feed rate
    pub feed: f64,
    /// Initial kill rate
    pub kill: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            workers: None,
            seed_size: 20,
            injection_radius: 5,
            resolution_skip: 1,
            wait_policy: WaitPolicy::Indefinite,
            feed: ReactionParams::DEFAULT_FEED,
            kill: ReactionParams::DEFAULT_KILL,
        }
    }
}

impl SimulationConfig {
    /// Default configuration for a `width × height` grid and a fixed worker count
    #[must_use]
    pub fn with_dimensions(width: usize, height: usize, workers: usize) -> Self {
        Self {
            width,
            height,
            workers: Some(workers),
            ..Self::default()
        }
    }

    /// Worker count after applying the hardware default
    #[must_use]
    pub fn resolved_workers(&self) -> usize {
        self.workers.unwrap_or_else(default_workers)
    }

    /// Initial parameter pair
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] if `feed` or `kill` is non-finite or negative.
    pub fn reaction_params(&self) -> Result<ReactionParams, EngineError> {
        ReactionParams::new(self.feed, self.kill)
    }

    /// Check every construction-time constraint
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] for a zero or overflowing dimension, zero
    /// workers or a zero skip factor, and [`EngineError::InvalidParameter`] for an invalid
    /// initial feed/kill pair.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.width == 0 {
            return Err(EngineError::configuration("width", "must be positive, got 0"));
        }
        if self.height == 0 {
            return Err(EngineError::configuration("height", "must be positive, got 0"));
        }
        if self.width.checked_mul(self.height).is_none() {
            return Err(EngineError::configuration(
                "height",
                format!("{}x{} grid overflows usize", self.width, self.height),
            ));
        }
        if self.workers == Some(0) {
            return Err(EngineError::configuration("workers", "must be at least 1, got 0"));
        }
        if self.resolution_skip == 0 {
            return Err(EngineError::configuration(
                "resolution_skip",
                "must be at least 1, got 0",
            ));
        }
        self.reaction_params()?;
        Ok(())
    }
}

/// Available hardware parallelism, falling back to a single worker
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}
