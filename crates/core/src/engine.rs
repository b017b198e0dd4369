//! Simulation engine
//!
//! Owns the field and the worker pool and runs ticks strictly one after another:
//! fan-out over row bands, barrier, generation swap. Injection, `initialize()` and
//! `step()` all take `&mut self`, so they can never overlap a tick's parallel phase.
//!
//! The feed/kill pair is the one piece of state shared with other threads. It lives
//! behind a [`ParameterHandle`] and is copied once at the start of every tick, so an
//! update from another thread lands on a tick boundary and is never seen half-applied.

use crate::config::SimulationConfig;
use crate::error::EngineError;
use crate::field::Field;
use crate::profiler::{ProfilerScope, TickTimer};
use crate::scheduler::{PartitionScheduler, TickOutcome};
use crate::stepper::{GrayScottParams, ReactionParams};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Lifecycle state of an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed; the field is in its base state and ticks are rejected
    Idle,
    /// Initialized and accepting ticks
    Running,
}

/// Summary of one completed tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// 1-based index of the tick since the last `initialize()`
    pub tick: u64,
    /// Parameter pair the whole tick used
    pub params: ReactionParams,
    /// Whether every interior row was updated
    pub outcome: TickOutcome,
    /// Wall time of the tick, swap included
    pub elapsed: Duration,
}

/// Shared, cloneable access to the engine's feed/kill pair
///
/// Writes replace the whole pair under one lock, reads copy it out.
#[derive(Debug, Clone)]
pub struct ParameterHandle {
    inner: Arc<RwLock<ReactionParams>>,
}

impl ParameterHandle {
    fn new(params: ReactionParams) -> Self {
        Self {
            inner: Arc::new(RwLock::new(params)),
        }
    }

    /// Replace the pair; takes effect from the next tick that starts
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] if either value is non-finite or negative;
    /// the previous pair stays in effect.
    pub fn set(&self, feed: f64, kill: f64) -> Result<(), EngineError> {
        let params = ReactionParams::new(feed, kill)?;
        // The pair is plain data written whole, so a poisoned lock still holds a valid value
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = params;
        Ok(())
    }

    /// Current pair
    #[must_use]
    pub fn get(&self) -> ReactionParams {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Gray-Scott reaction-diffusion engine
pub struct SimulationEngine {
    config: SimulationConfig,
    field: Field,
    scheduler: PartitionScheduler,
    params: ParameterHandle,
    state: EngineState,
    tick: u64,
    timer: TickTimer,
}

impl SimulationEngine {
    /// Create an engine in the `Idle` state
    ///
    /// Builds the worker pool that every tick reuses; it is shut down when the engine is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] for invalid dimensions, worker count or skip
    /// factor, or if the pool cannot be built, and [`EngineError::InvalidParameter`] for an
    /// invalid initial feed/kill pair.
    pub fn new(config: SimulationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let params = config.reaction_params()?;
        let num_workers = config.resolved_workers();
        let scheduler = PartitionScheduler::new(num_workers, config.wait_policy)?;
        let field = Field::new(config.width, config.height);

        info!(
            "Created Gray-Scott engine: {}x{} grid, {} workers, skip={}, wait={:?}",
            config.width, config.height, num_workers, config.resolution_skip, config.wait_policy
        );

        Ok(Self {
            config,
            field,
            scheduler,
            params: ParameterHandle::new(params),
            state: EngineState::Idle,
            tick: 0,
            timer: TickTimer::new(),
        })
    }

    /// Create an engine with default settings for a `width × height` grid
    ///
    /// # Errors
    ///
    /// See [`SimulationEngine::new`].
    pub fn with_dimensions(
        width: usize,
        height: usize,
        num_workers: usize,
    ) -> Result<Self, EngineError> {
        Self::new(SimulationConfig::with_dimensions(width, height, num_workers))
    }

    /// Reset to the seeded base state and start accepting ticks
    pub fn initialize(&mut self) {
        self.field.initialize(self.config.seed_size);
        self.state = EngineState::Running;
        self.tick = 0;
        self.timer.reset();
        info!(
            "Initialized {}x{} field with {} seed",
            self.config.width, self.config.height, self.config.seed_size
        );
    }

    /// Replace the feed/kill pair for subsequent ticks
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] if either value is non-finite or negative;
    /// the previous pair stays in effect.
    pub fn set_parameters(&self, feed: f64, kill: f64) -> Result<(), EngineError> {
        self.params.set(feed, kill)?;
        debug!("Parameters set: feed={:.4}, kill={:.4}", feed, kill);
        Ok(())
    }

    /// Current feed/kill pair
    #[must_use]
    pub fn parameters(&self) -> ReactionParams {
        self.params.get()
    }

    /// Handle for updating parameters from other threads while ticks run
    #[must_use]
    pub fn parameter_handle(&self) -> ParameterHandle {
        self.params.clone()
    }

    /// Advance the simulation by exactly one tick
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotInitialized`] before `initialize()`, and
    /// [`EngineError::WorkerFailure`] if a band panicked; in that case the tick is
    /// discarded and the field still shows the previous generation.
    pub fn step(&mut self) -> Result<TickReport, EngineError> {
        if self.state != EngineState::Running {
            return Err(EngineError::NotInitialized);
        }

        let scope = ProfilerScope::new("tick");
        let params = self.params.get();
        let step_params = GrayScottParams::new(params, self.config.resolution_skip);

        let outcome = match self.scheduler.run_tick(&mut self.field, &step_params) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Tick {} discarded: {}", self.tick + 1, err);
                return Err(err);
            }
        };
        self.field.swap();
        self.tick += 1;

        let elapsed = scope.elapsed();
        self.timer.record(elapsed);

        if let TickOutcome::Partial { skipped_rows } = outcome {
            warn!(
                "Tick {} exceeded its wait budget; {} rows kept their previous values",
                self.tick, skipped_rows
            );
        }
        debug!(
            "Tick {}: feed={:.4}, kill={:.4}, {:.3}ms",
            self.tick,
            params.feed,
            params.kill,
            elapsed.as_secs_f64() * 1000.0
        );

        Ok(TickReport {
            tick: self.tick,
            params,
            outcome,
            elapsed,
        })
    }

    /// Write a disc of pure B with the configured radius (5 by default) around `(x, y)`
    ///
    /// Coordinates outside the grid are clipped; a disc entirely outside is a no-op.
    pub fn inject_at(&mut self, x: i64, y: i64) {
        self.field
            .set_region_circle(x, y, self.config.injection_radius);
    }

    /// Write a square of pure B with side `size` centered at `(x, y)`
    ///
    /// Coordinates outside the grid are clipped; a square entirely outside is a no-op.
    pub fn inject_square(&mut self, x: i64, y: i64, size: usize) {
        self.field.set_region_square(x, y, size);
    }

    /// Row-major `width × height` view of B in the current generation, values in `[0, 1]`
    #[must_use]
    pub fn snapshot_b(&self) -> &[f64] {
        self.field.snapshot_b()
    }

    /// Read-only access to the field
    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Lifecycle state
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Ticks completed since the last `initialize()`
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Tick timing statistics since the last `initialize()`
    #[must_use]
    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    /// Number of pool workers
    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.scheduler.num_workers()
    }

    /// Construction settings
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WaitPolicy;

    fn engine(width: usize, height: usize, workers: usize) -> SimulationEngine {
        SimulationEngine::with_dimensions(width, height, workers).unwrap()
    }

    #[test]
    fn test_construction_rejects_bad_configuration() {
        assert!(matches!(
            SimulationEngine::with_dimensions(0, 10, 1),
            Err(EngineError::Configuration { field: "width", .. })
        ));
        assert!(matches!(
            SimulationEngine::with_dimensions(10, 10, 0),
            Err(EngineError::Configuration { field: "workers", .. })
        ));
    }

    #[test]
    fn test_step_requires_initialize() {
        let mut engine = engine(16, 16, 2);
        assert_eq!(engine.state(), EngineState::Idle);
        assert_eq!(engine.step(), Err(EngineError::NotInitialized));

        engine.initialize();
        assert_eq!(engine.state(), EngineState::Running);
        let report = engine.step().unwrap();
        assert_eq!(report.tick, 1);
        assert_eq!(report.outcome, TickOutcome::Complete);
        assert_eq!(engine.tick_count(), 1);
        assert_eq!(engine.timer().ticks(), 1);
    }

    #[test]
    fn test_initialize_resets_tick_count() {
        let mut engine = engine(16, 16, 2);
        engine.initialize();
        engine.step().unwrap();
        engine.step().unwrap();
        engine.initialize();
        assert_eq!(engine.tick_count(), 0);
        assert_eq!(engine.step().unwrap().tick, 1);
    }

    #[test]
    fn test_rejected_parameters_keep_previous_pair() {
        let engine = engine(8, 8, 1);
        assert_eq!(engine.parameters(), ReactionParams::default());

        engine.set_parameters(0.03, 0.05).unwrap();
        assert!(engine.set_parameters(0.04, f64::NAN).is_err());
        assert!(engine.set_parameters(-0.04, 0.05).is_err());
        assert_eq!(engine.parameters(), ReactionParams::new(0.03, 0.05).unwrap());
    }

    #[test]
    fn test_tick_uses_parameters_set_before_it() {
        let mut engine = engine(12, 12, 2);
        engine.initialize();
        let handle = engine.parameter_handle();
        handle.set(0.09, 0.01).unwrap();

        let report = engine.step().unwrap();
        assert_eq!(report.params, ReactionParams::new(0.09, 0.01).unwrap());
        assert_eq!(engine.parameters(), report.params);
    }

    #[test]
    fn test_injection_is_visible_in_snapshot() {
        let mut engine = engine(40, 40, 2);
        engine.inject_at(10, 10);
        let snapshot = engine.snapshot_b();
        assert_eq!(snapshot[10 * 40 + 10], 1.0);
        assert_eq!(snapshot[10 * 40 + 15], 1.0);
        assert_eq!(snapshot[10 * 40 + 16], 0.0);

        engine.inject_square(30, 30, 4);
        assert_eq!(engine.field().get(32, 32), Some((0.0, 1.0)));
        assert_eq!(engine.field().get(33, 32), Some((1.0, 0.0)));
    }

    #[test]
    fn test_bounded_zero_budget_reports_partial_tick() {
        let config = SimulationConfig {
            wait_policy: WaitPolicy::Bounded { budget_ms: 0 },
            seed_size: 4,
            ..SimulationConfig::with_dimensions(24, 24, 3)
        };
        let mut engine = SimulationEngine::new(config).unwrap();
        engine.initialize();
        let before = engine.snapshot_b().to_vec();

        let report = engine.step().unwrap();
        assert_eq!(report.outcome, TickOutcome::Partial { skipped_rows: 22 });
        assert_eq!(engine.snapshot_b(), before.as_slice());
    }
}
