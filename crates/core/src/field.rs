//! Double-buffered concentration field
//!
//! Chemicals A and B are stored as independent row-major scalar arrays
//! (`y * width + x`) so the stencil can address each buffer on its own. Each chemical has
//! two generations; a toggled index says which one is `current`. Only `current` is ever
//! handed out for reading, so a half-written `next` can never reach a renderer.

/// Concentration of A in the uniform base state
pub const BASE_A: f64 = 1.0;
/// Concentration of B in the uniform base state
pub const BASE_B: f64 = 0.0;

/// Single scalar grid in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct FieldData {
    /// Values in row-major order (y * width + x)
    pub data: Vec<f64>,
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
}

impl FieldData {
    /// Create a grid with every cell set to `value`
    #[must_use]
    pub fn with_value(width: usize, height: usize, value: f64) -> Self {
        Self {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Get reference to field data
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get mutable reference to field data
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Value at `(x, y)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> f64 {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x]
    }

    /// Set value at `(x, y)`
    ///
    /// # Panics
    ///
    /// Panics if coordinates are out of bounds
    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        assert!(
            x < self.width && y < self.height,
            "Coordinates out of bounds"
        );
        self.data[y * self.width + x] = value;
    }

    /// Fill entire grid with a value
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }
}

/// Read-only view of one generation of both chemicals
#[derive(Debug, Clone, Copy)]
pub struct Concentrations<'a> {
    /// Chemical A, row-major
    pub a: &'a [f64],
    /// Chemical B, row-major
    pub b: &'a [f64],
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
}

/// Two generations of the A and B concentration grids
#[derive(Debug, Clone)]
pub struct Field {
    a: [FieldData; 2],
    b: [FieldData; 2],
    current: usize,
    width: usize,
    height: usize,
}

impl Field {
    /// Create a field in the uniform base state (A = 1, B = 0) in both generations
    ///
    /// Dimensions are validated by the engine configuration; a zero dimension simply
    /// yields an empty grid here.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            a: [
                FieldData::with_value(width, height, BASE_A),
                FieldData::with_value(width, height, BASE_A),
            ],
            b: [
                FieldData::with_value(width, height, BASE_B),
                FieldData::with_value(width, height, BASE_B),
            ],
            current: 0,
            width,
            height,
        }
    }

    /// Grid width in cells
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Reset both generations to the base state and imprint a centered square seed of
    /// pure B with side `seed_size` (no seed when `seed_size` is 0)
    ///
    /// Always reproduces the same state for the same dimensions and seed size.
    pub fn initialize(&mut self, seed_size: usize) {
        for grid in &mut self.a {
            grid.fill(BASE_A);
        }
        for grid in &mut self.b {
            grid.fill(BASE_B);
        }
        self.current = 0;

        if seed_size > 0 {
            self.set_region_square(
                (self.width / 2) as i64,
                (self.height / 2) as i64,
                seed_size,
            );
        }
    }

    /// Set `B = 1, A = 0` on the in-bounds part of the square centered at `(x, y)`
    ///
    /// The square spans offsets `-size/2 ..= size/2` on both axes. Cells outside the grid
    /// are clipped; a square entirely outside changes nothing.
    pub fn set_region_square(&mut self, x: i64, y: i64, size: usize) {
        let reach = i64::try_from(size / 2).unwrap_or(i64::MAX);
        let Some((x0, x1)) = clipped_span(x, reach, self.width) else {
            return;
        };
        let Some((y0, y1)) = clipped_span(y, reach, self.height) else {
            return;
        };

        let width = self.width;
        let current = self.current;
        let a = self.a[current].as_mut_slice();
        let b = self.b[current].as_mut_slice();
        for row in y0..=y1 {
            let start = row * width;
            a[start + x0..=start + x1].fill(0.0);
            b[start + x0..=start + x1].fill(1.0);
        }
    }

    /// Set `B = 1, A = 0` on the in-bounds part of the disc of `radius` centered at `(x, y)`
    ///
    /// A cell at offset `(dx, dy)` is inside when `dx² + dy² <= radius²`.
    pub fn set_region_circle(&mut self, x: i64, y: i64, radius: usize) {
        let reach = i64::try_from(radius).unwrap_or(i64::MAX);
        let Some((x0, x1)) = clipped_span(x, reach, self.width) else {
            return;
        };
        let Some((y0, y1)) = clipped_span(y, reach, self.height) else {
            return;
        };

        let radius_sq = (radius as i128) * (radius as i128);
        let width = self.width;
        let current = self.current;
        let a = self.a[current].as_mut_slice();
        let b = self.b[current].as_mut_slice();
        for row in y0..=y1 {
            let dy = row as i128 - i128::from(y);
            for col in x0..=x1 {
                let dx = col as i128 - i128::from(x);
                if dx * dx + dy * dy <= radius_sq {
                    let idx = row * width + col;
                    a[idx] = 0.0;
                    b[idx] = 1.0;
                }
            }
        }
    }

    /// Exchange the roles of `current` and `next` in O(1)
    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    /// Read-only view of `current` B
    #[must_use]
    pub fn snapshot_b(&self) -> &[f64] {
        self.b[self.current].as_slice()
    }

    /// Read-only view of `current` A
    #[must_use]
    pub fn snapshot_a(&self) -> &[f64] {
        self.a[self.current].as_slice()
    }

    /// `(a, b)` at `(x, y)` in `current`, or `None` outside the grid
    #[must_use]
    pub fn get(&self, x: usize, y: usize) -> Option<(f64, f64)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y * self.width + x;
        Some((self.snapshot_a()[idx], self.snapshot_b()[idx]))
    }

    /// Summed B over `current`, accumulated in row-major order
    #[must_use]
    pub fn total_b(&self) -> f64 {
        self.snapshot_b().iter().sum()
    }

    /// Borrow `current` for reading and `next` (A, B) for writing at the same time
    pub(crate) fn split_generations(&mut self) -> (Concentrations<'_>, &mut [f64], &mut [f64]) {
        let (a_current, a_next) = select_generations(&mut self.a, self.current);
        let (b_current, b_next) = select_generations(&mut self.b, self.current);
        (
            Concentrations {
                a: a_current.as_slice(),
                b: b_current.as_slice(),
                width: self.width,
                height: self.height,
            },
            a_next.as_mut_slice(),
            b_next.as_mut_slice(),
        )
    }
}

fn select_generations(pair: &mut [FieldData; 2], current: usize) -> (&FieldData, &mut FieldData) {
    let [first, second] = pair;
    if current == 0 {
        (first, second)
    } else {
        (second, first)
    }
}

/// Inclusive index range of `center ± reach` clipped to `0..len`
fn clipped_span(center: i64, reach: i64, len: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let last = i64::try_from(len - 1).unwrap_or(i64::MAX);
    let lo = center.saturating_sub(reach).max(0);
    let hi = center.saturating_add(reach).min(last);
    if lo > hi {
        return None;
    }
    Some((lo as usize, hi as usize))
}
