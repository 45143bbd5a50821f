use crate::errors::YabfError;

use super::history::EstimateHistory;

/// Smallest accepted RK substep count per sample interval.
pub const MIN_SUBSTEPS: usize = 5;

/// Problem dimensions, derived once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dims {
    /// State dimension.
    pub nx: usize,
    /// Process-noise dimension.
    pub nv: usize,
    /// Measurement dimension.
    pub nz: usize,
    /// Number of measurement samples.
    pub kmax: usize,
}

/// The shared recurrence every batch estimator implements.
///
/// One sample is processed in two phases that must run in order:
/// [`propagate`](BatchEstimator::propagate) carries the posterior at sample
/// `k` forward to an a-priori estimate at `k + 1`, and
/// [`update`](BatchEstimator::update) folds in measurement `k`, writing
/// snapshot `k + 1` and the innovation statistic for `k`. The driver loop
/// lives here, parameterized over the implementation; each run is a finite,
/// strictly sequential computation that either fills every slot or aborts on
/// the first error, leaving later slots unset.
pub trait BatchEstimator {
    fn dims(&self) -> Dims;

    /// Writes the initial snapshot (sample 0) into the output history.
    fn init(&mut self) -> Result<(), YabfError>;

    /// Phase one of sample `k`: produce the a-priori estimate at `k + 1`.
    fn propagate(&mut self, k: usize) -> Result<(), YabfError>;

    /// Phase two of sample `k`: fold measurement `k` into the a-priori
    /// estimate, emit snapshot `k + 1` and the innovation statistic.
    /// Calling this without a completed `propagate` is an error.
    fn update(&mut self, k: usize) -> Result<(), YabfError>;

    fn history(&self) -> &EstimateHistory;

    /// Both phases of sample `k`, in order.
    fn step(&mut self, k: usize) -> Result<(), YabfError> {
        self.propagate(k)?;
        self.update(k)
    }

    /// Full run from scratch: initialization followed by the complete
    /// recurrence. With zero measurement samples only the initial snapshot
    /// is populated.
    fn run(&mut self) -> Result<(), YabfError> {
        self.init()?;
        self.run_from(0)
    }

    /// Warm start: resume the recurrence at sample `k0`, assuming snapshots
    /// `0..=k0` are already in place from a previous `init`/run.
    fn run_from(&mut self, k0: usize) -> Result<(), YabfError> {
        let kmax = self.dims().kmax;
        if k0 > kmax {
            return Err(YabfError::ConfigErr(
                "warm-start index is past the last sample",
            ));
        }
        for k in k0..kmax {
            self.step(k).map_err(|e| {
                error!("batch run aborted at sample {}: {}", k, e);
                e
            })?;
        }
        debug!("batch run complete over samples {}..{}", k0, kmax);
        Ok(())
    }
}
