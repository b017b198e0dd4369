//! Row-band partitioning of a tick across a fixed worker pool
//!
//! The interior rows are split into contiguous, non-overlapping bands, one task per band.
//! Every worker reads the shared `current` generation and writes only its own rows of
//! `next`, so the grid needs no locks or atomics. The pool is built once per engine and
//! shut down when the scheduler is dropped.
//!
//! With a resolution skip `s > 1` the unit of work is a strip of `s` rows starting at a
//! sampled row; bands are formed over sampled rows so each band owns whole strips.
//!
//! Cells the stepper does not compute (the border ring, and with `s > 1` any trailing
//! rows or columns outside a sampled block) are carried forward from `current`, so the
//! swap never resurfaces a stale value from two generations ago.

use crate::config::WaitPolicy;
use crate::error::EngineError;
use crate::field::{Concentrations, Field};
use crate::stepper::{step_strip, GrayScottParams};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, warn};

/// How the parallel phase of a tick ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Every interior row was updated
    Complete,
    /// The wait budget elapsed; `skipped_rows` rows kept their previous values
    Partial {
        /// Number of interior rows that were carried forward without an update
        skipped_rows: usize,
    },
}

/// Split `rows` items into at most `workers` contiguous bands of `⌈rows / workers⌉`
///
/// The last band takes the remainder; empty bands are omitted.
#[must_use]
pub fn band_ranges(rows: usize, workers: usize) -> Vec<Range<usize>> {
    if rows == 0 || workers == 0 {
        return Vec::new();
    }
    let band_size = rows.div_ceil(workers);
    (0..workers)
        .map(|band| (band * band_size).min(rows)..((band + 1) * band_size).min(rows))
        .filter(|range| !range.is_empty())
        .collect()
}

/// Number of sampled rows for a grid of `height` rows and skip `skip`
///
/// Sampled rows are `skip, 2·skip, …` strictly below `height − skip`.
#[must_use]
pub fn sampled_rows(height: usize, skip: usize) -> usize {
    if skip == 0 || height <= 2 * skip {
        return 0;
    }
    (height - 2 * skip - 1) / skip + 1
}

/// One band's share of the next generation
struct BandJob<'a> {
    index: usize,
    rows: Range<usize>,
    out_a: &'a mut [f64],
    out_b: &'a mut [f64],
}

/// Fixed-size worker pool that runs one tick's cell updates in row bands
pub struct PartitionScheduler {
    pool: ThreadPool,
    num_workers: usize,
    wait_policy: WaitPolicy,
}

impl PartitionScheduler {
    /// Build the worker pool
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Configuration`] if `num_workers` is zero or the pool's threads
    /// cannot be spawned.
    pub fn new(num_workers: usize, wait_policy: WaitPolicy) -> Result<Self, EngineError> {
        if num_workers == 0 {
            return Err(EngineError::configuration("workers", "must be at least 1, got 0"));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|index| format!("gray-scott-worker-{index}"))
            .build()
            .map_err(|e| EngineError::configuration("workers", e.to_string()))?;

        Ok(Self {
            pool,
            num_workers,
            wait_policy,
        })
    }

    /// Number of workers (and maximum number of bands per tick)
    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Barrier policy applied to every tick
    #[must_use]
    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait_policy
    }

    /// Compute the next generation of `field` from its current one
    ///
    /// Returns after every band has finished. The caller swaps generations on success.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WorkerFailure`] if a band panicked. The other bands still run
    /// to completion and `current` is left untouched.
    pub fn run_tick(
        &self,
        field: &mut Field,
        params: &GrayScottParams,
    ) -> Result<TickOutcome, EngineError> {
        self.run_with(field, params.skip, |src, y, out_a, out_b| {
            step_strip(src, y, out_a, out_b, params);
        })
    }

    /// Run `kernel` over every strip, one band per worker
    ///
    /// `kernel(src, y, out_a, out_b)` receives the strip that starts at sampled row `y`,
    /// already pre-filled with the strip's current values.
    pub(crate) fn run_with<K>(
        &self,
        field: &mut Field,
        skip: usize,
        kernel: K,
    ) -> Result<TickOutcome, EngineError>
    where
        K: Fn(&Concentrations<'_>, usize, &mut [f64], &mut [f64]) + Sync,
    {
        let (src, next_a, next_b) = field.split_generations();
        let width = src.width;
        let samples = sampled_rows(src.height, skip);

        if samples == 0 {
            next_a.copy_from_slice(src.a);
            next_b.copy_from_slice(src.b);
            return Ok(TickOutcome::Complete);
        }

        // Rows [first, last) are covered by strips; the rest is carried forward here
        let first = skip * width;
        let last = skip * (samples + 1) * width;
        let (head_a, body_a) = next_a.split_at_mut(first);
        let (body_a, tail_a) = body_a.split_at_mut(last - first);
        let (head_b, body_b) = next_b.split_at_mut(first);
        let (body_b, tail_b) = body_b.split_at_mut(last - first);
        head_a.copy_from_slice(&src.a[..first]);
        head_b.copy_from_slice(&src.b[..first]);
        tail_a.copy_from_slice(&src.a[last..]);
        tail_b.copy_from_slice(&src.b[last..]);

        let bands = band_ranges(samples, self.num_workers);
        let mut jobs = Vec::with_capacity(bands.len());
        let mut rest_a = body_a;
        let mut rest_b = body_b;
        for (index, band) in bands.iter().enumerate() {
            let rows = skip * (band.start + 1)..skip * (band.end + 1);
            let len = rows.len() * width;
            let (out_a, after_a) = std::mem::take(&mut rest_a).split_at_mut(len);
            let (out_b, after_b) = std::mem::take(&mut rest_b).split_at_mut(len);
            rest_a = after_a;
            rest_b = after_b;
            jobs.push(BandJob {
                index,
                rows,
                out_a,
                out_b,
            });
        }

        let deadline = self.wait_policy.budget().map(|budget| Instant::now() + budget);
        let mut outcomes: Vec<Option<Result<usize, String>>> = vec![None; jobs.len()];
        let kernel = &kernel;

        self.pool.scope(|scope| {
            for (job, slot) in jobs.into_iter().zip(outcomes.iter_mut()) {
                scope.spawn(move |_| {
                    *slot = Some(run_band(&src, job, skip, deadline, kernel));
                });
            }
        });

        let mut skipped_rows = 0;
        let mut failure = None;
        for (band, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Some(Ok(skipped)) => skipped_rows += skipped,
                Some(Err(message)) => {
                    warn!("Worker for band {} panicked: {}", band, message);
                    if failure.is_none() {
                        failure = Some(EngineError::WorkerFailure { band, message });
                    }
                }
                None => {
                    if failure.is_none() {
                        failure = Some(EngineError::WorkerFailure {
                            band,
                            message: "band did not report a result".to_string(),
                        });
                    }
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        debug!(
            "Tick fan-out: {} bands over {} sampled rows, {} rows skipped",
            bands.len(),
            samples,
            skipped_rows
        );

        if skipped_rows > 0 {
            Ok(TickOutcome::Partial { skipped_rows })
        } else {
            Ok(TickOutcome::Complete)
        }
    }
}

/// Work through one band strip by strip, catching any panic
///
/// Each strip is first filled with its current values, then updated unless the deadline
/// has passed. Returns the number of rows left without an update.
fn run_band<K>(
    src: &Concentrations<'_>,
    job: BandJob<'_>,
    skip: usize,
    deadline: Option<Instant>,
    kernel: &K,
) -> Result<usize, String>
where
    K: Fn(&Concentrations<'_>, usize, &mut [f64], &mut [f64]) + Sync,
{
    let width = src.width;
    let strip_len = skip * width;
    let BandJob {
        index,
        rows,
        out_a,
        out_b,
    } = job;

    catch_unwind(AssertUnwindSafe(|| {
        let mut skipped = 0;
        for (strip, (strip_a, strip_b)) in out_a
            .chunks_mut(strip_len)
            .zip(out_b.chunks_mut(strip_len))
            .enumerate()
        {
            let y = rows.start + strip * skip;
            let start = y * width;
            strip_a.copy_from_slice(&src.a[start..start + strip_a.len()]);
            strip_b.copy_from_slice(&src.b[start..start + strip_b.len()]);

            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                skipped += strip_a.len() / width;
                continue;
            }
            kernel(src, y, strip_a, strip_b);
        }
        skipped
    }))
    .map_err(|payload| {
        debug!("Band {} unwound", index);
        panic_message(payload.as_ref())
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
