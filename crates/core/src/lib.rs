//! Gray-Scott Reaction-Diffusion Core Library
//!
//! Simulates the two-species Gray-Scott reaction-diffusion system on a 2D grid and exposes
//! the evolving B concentration for rendering.
//!
//! ## Engine
//!
//! - Double-buffered A/B concentration field with an O(1) generation swap
//! - Weighted 3×3 Laplacian plus the `a·b²` reaction term, explicit Euler with `Δt = 0.9`
//! - Lock-free parallel ticks: interior rows split into disjoint bands over an
//!   engine-owned worker pool, bit-identical for any worker count
//! - Point and region injection of chemical B between ticks
//!
//! The outermost ring of cells is never updated by the stepper and keeps whatever
//! initialization or injection last wrote there.
//!
//! # Example
//!
//! ```rust
//! use gray_scott_core::{SimulationConfig, SimulationEngine};
//!
//! let mut engine = SimulationEngine::new(SimulationConfig::with_dimensions(64, 64, 2))?;
//! engine.initialize();
//! engine.set_parameters(0.055, 0.062)?;
//! for _ in 0..10 {
//!     engine.step()?;
//! }
//! engine.inject_at(10, 10);
//! assert!(engine.snapshot_b().iter().all(|v| (0.0..=1.0).contains(v)));
//! # Ok::<(), gray_scott_core::EngineError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod field;
pub mod profiler;
pub mod render;
pub mod scheduler;
pub mod stepper;

pub use config::{default_workers, SimulationConfig, WaitPolicy};
pub use engine::{EngineState, ParameterHandle, SimulationEngine, TickReport};
pub use error::EngineError;
pub use field::{Concentrations, Field, FieldData};
pub use profiler::{ProfilerScope, TickTimer};
pub use render::{grayscale_intensity, render_grayscale, write_pgm};
pub use scheduler::{band_ranges, sampled_rows, PartitionScheduler, TickOutcome};
pub use stepper::{step_cell, GrayScottParams, ReactionParams};
