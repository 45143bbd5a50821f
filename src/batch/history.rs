use crate::alloc::vec;
use crate::alloc::vec::Vec;
use crate::errors::YabfError;
use crate::itertools::izip;

use crate::linalg::{DMatrix, DVector};
use crate::time::Epoch;

/// Recorded input data: one epoch, one control vector and one measurement
/// vector per sample index `0..kmax`. Supplied once at construction and
/// never mutated afterwards.
pub struct TimeHistory {
    pub epochs: Vec<Epoch>,
    pub controls: Vec<DVector<f64>>,
    pub measurements: Vec<DVector<f64>>,
}

impl TimeHistory {
    /// Builds a history from aligned sequences. All three must have the
    /// same length.
    pub fn new(
        epochs: Vec<Epoch>,
        controls: Vec<DVector<f64>>,
        measurements: Vec<DVector<f64>>,
    ) -> Result<Self, YabfError> {
        if epochs.len() != controls.len() || epochs.len() != measurements.len() {
            return Err(YabfError::DimensionMismatchErr(
                "time, control and measurement histories must have equal lengths",
            ));
        }
        Ok(Self {
            epochs,
            controls,
            measurements,
        })
    }

    /// Number of measurement samples (`kmax`).
    pub fn len(&self) -> usize {
        self.epochs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.epochs.is_empty()
    }

    /// Per-sample checks: every measurement is `nz` long, every control
    /// matches the first one, epochs strictly increase starting after the
    /// initial epoch.
    pub(crate) fn validate(&self, epoch0: Epoch, nz: usize) -> Result<(), YabfError> {
        let mut prev = epoch0;
        let nu = self.controls.first().map_or(0, |u| u.len());
        for (t, u, z) in izip!(&self.epochs, &self.controls, &self.measurements) {
            if z.len() != nz {
                return Err(YabfError::DimensionMismatchErr(
                    "measurement sample length differs from measurement noise dimension",
                ));
            }
            if u.len() != nu {
                return Err(YabfError::DimensionMismatchErr(
                    "control samples have inconsistent lengths",
                ));
            }
            if *t <= prev {
                return Err(YabfError::ConfigErr(
                    "epochs must be strictly increasing, starting after the initial epoch",
                ));
            }
            prev = *t;
        }
        Ok(())
    }
}

/// Filter output, allocated once at initialization and written exactly once
/// per slot by the driver: `means` and `covariances` hold `kmax + 1`
/// snapshots (index 0 is the initial condition), `innovation_stats` holds
/// one normalized squared residual per measurement sample.
pub struct EstimateHistory {
    pub means: Vec<DVector<f64>>,
    pub covariances: Vec<DMatrix<f64>>,
    pub innovation_stats: Vec<f64>,
}

impl EstimateHistory {
    pub fn new(nx: usize, kmax: usize) -> Self {
        let mut means = Vec::with_capacity(kmax + 1);
        let mut covariances = Vec::with_capacity(kmax + 1);
        for _ in 0..=kmax {
            means.push(DVector::zeros(nx));
            covariances.push(DMatrix::zeros(nx, nx));
        }
        Self {
            means,
            covariances,
            innovation_stats: vec![0.0; kmax],
        }
    }

    pub(crate) fn set_snapshot(&mut self, k: usize, mean: &DVector<f64>, cov: &DMatrix<f64>) {
        self.means[k].copy_from(mean);
        self.covariances[k].copy_from(cov);
    }

    pub(crate) fn set_stat(&mut self, k: usize, stat: f64) {
        self.innovation_stats[k] = stat;
    }
}
