//! Gray-Scott cell update
//!
//! Implements the discrete diffusion/reaction rule for one interior cell:
//! ```text
//! ∇²X   = 0.2·(W + E + N + S) + 0.05·(NW + NE + SW + SE) − X
//! r     = a·b²
//! a'    = a + (D_A·∇²A − r + feed·(1 − a))·Δt
//! b'    = b + (D_B·∇²B + r − (kill + feed)·b)·Δt
//! ```
//! with `Δt = 0.9`, followed by clamping both results to `[0, 1]`. Transient
//! out-of-range values before the clamp are expected.
//!
//! The update reads only the current generation, which is what lets row bands run in
//! parallel without locks.

use crate::error::EngineError;
use crate::field::Concentrations;
use serde::{Deserialize, Serialize};

/// Laplacian weight of the four orthogonal neighbours
pub const ORTHOGONAL_WEIGHT: f64 = 0.2;
/// Laplacian weight of the four diagonal neighbours
pub const DIAGONAL_WEIGHT: f64 = 0.05;
/// Laplacian weight of the cell itself (weights sum to zero)
pub const CENTER_WEIGHT: f64 = -1.0;
/// Fixed explicit-Euler time step
pub const TIME_STEP: f64 = 0.9;
/// Diffusion rate of chemical A
pub const DIFFUSION_RATE_A: f64 = 1.0;
/// Diffusion rate of chemical B
pub const DIFFUSION_RATE_B: f64 = 0.5;

/// Feed/kill pair applied by a tick
///
/// Always read and written as a unit so a tick never mixes values from two updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReactionParams {
    /// Rate at which A is replenished
    pub feed: f64,
    /// Rate at which B is removed
    pub kill: f64,
}

impl ReactionParams {
    /// Default feed rate (coral-like growth regime)
    pub const DEFAULT_FEED: f64 = 0.055;
    /// Default kill rate
    pub const DEFAULT_KILL: f64 = 0.062;
    /// Range the interactive controls expose for both rates
    pub const UI_RANGE: (f64, f64) = (0.01, 0.10);

    /// Validate and build a parameter pair
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidParameter`] if either value is non-finite or negative.
    pub fn new(feed: f64, kill: f64) -> Result<Self, EngineError> {
        validate_rate("feed", feed)?;
        validate_rate("kill", kill)?;
        Ok(Self { feed, kill })
    }
}

impl Default for ReactionParams {
    fn default() -> Self {
        Self {
            feed: Self::DEFAULT_FEED,
            kill: Self::DEFAULT_KILL,
        }
    }
}

fn validate_rate(name: &'static str, value: f64) -> Result<(), EngineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(EngineError::InvalidParameter { name, value })
    }
}

/// Everything a worker needs to update cells, copied once per tick
#[derive(Debug, Clone, Copy)]
pub struct GrayScottParams {
    /// Feed rate
    pub feed: f64,
    /// Kill rate
    pub kill: f64,
    /// Diffusion rate of A
    pub diffusion_a: f64,
    /// Diffusion rate of B
    pub diffusion_b: f64,
    /// Neighbour offset and block size; 1 updates every interior cell
    pub skip: usize,
}

impl GrayScottParams {
    /// Parameters for one tick with the fixed diffusion rates
    #[must_use]
    pub fn new(reaction: ReactionParams, skip: usize) -> Self {
        Self {
            feed: reaction.feed,
            kill: reaction.kill,
            diffusion_a: DIFFUSION_RATE_A,
            diffusion_b: DIFFUSION_RATE_B,
            skip,
        }
    }
}

/// Weighted 3×3 Laplacian around `idx` with neighbour distance `offset`
///
/// Terms are accumulated in a fixed order (W, E, N, S, NW, NE, SW, SE, centre) so the
/// result is bit-for-bit reproducible.
#[inline]
#[must_use]
pub fn laplacian(grid: &[f64], width: usize, idx: usize, offset: usize) -> f64 {
    let row = offset * width;
    let mut sum = 0.0;
    sum += grid[idx - offset] * ORTHOGONAL_WEIGHT;
    sum += grid[idx + offset] * ORTHOGONAL_WEIGHT;
    sum += grid[idx - row] * ORTHOGONAL_WEIGHT;
    sum += grid[idx + row] * ORTHOGONAL_WEIGHT;
    sum += grid[idx - row - offset] * DIAGONAL_WEIGHT;
    sum += grid[idx - row + offset] * DIAGONAL_WEIGHT;
    sum += grid[idx + row - offset] * DIAGONAL_WEIGHT;
    sum += grid[idx + row + offset] * DIAGONAL_WEIGHT;
    sum += grid[idx] * CENTER_WEIGHT;
    sum
}

/// New `(a, b)` for the interior cell `(x, y)`
///
/// The caller guarantees `skip <= x < width - skip` and `skip <= y < height - skip`;
/// border cells are never passed here.
#[inline]
#[must_use]
pub fn step_cell(src: &Concentrations<'_>, x: usize, y: usize, params: &GrayScottParams) -> (f64, f64) {
    let idx = y * src.width + x;
    let a = src.a[idx];
    let b = src.b[idx];

    let laplace_a = laplacian(src.a, src.width, idx, params.skip);
    let laplace_b = laplacian(src.b, src.width, idx, params.skip);

    let reaction = a * b * b;

    let next_a = a + (params.diffusion_a * laplace_a - reaction + params.feed * (1.0 - a)) * TIME_STEP;
    let next_b =
        b + (params.diffusion_b * laplace_b + reaction - (params.kill + params.feed) * b) * TIME_STEP;

    (next_a.clamp(0.0, 1.0), next_b.clamp(0.0, 1.0))
}

/// Update the strip of rows that starts at sample row `y`
///
/// `out_a`/`out_b` hold the strip's rows of the next generation (whole rows, starting
/// at row `y`). Every sampled column `x = skip, 2·skip, … < width − skip` is evaluated and
/// its result written into the block `x..x + skip` on every row of the strip. Cells
/// outside those blocks are left untouched.
pub fn step_strip(
    src: &Concentrations<'_>,
    y: usize,
    out_a: &mut [f64],
    out_b: &mut [f64],
    params: &GrayScottParams,
) {
    let width = src.width;
    let skip = params.skip;
    let rows = out_a.len() / width;
    if width <= 2 * skip {
        return;
    }

    for x in (skip..width - skip).step_by(skip) {
        let (next_a, next_b) = step_cell(src, x, y, params);
        for row in 0..rows {
            let start = row * width + x;
            out_a[start..start + skip].fill(next_a);
            out_b[start..start + skip].fill(next_b);
        }
    }
}
