use crate::alloc::boxed::Box;
use crate::errors::YabfError;
use crate::models::{Dynamics, MeasurementModel, NoiseModel};

use super::contract::{Dims, MIN_SUBSTEPS};
use super::history::TimeHistory;

use crate::linalg::{DMatrix, DVector};
use crate::time::Epoch;

/// Everything a batch estimator is built from, enumerated explicitly.
///
/// Dimensions are derived rather than passed: `nx` from the initial mean,
/// `nv` from the process-noise covariance, `nz` from the measurement-noise
/// covariance, `kmax` from the measurement history.
///
/// `substeps` is the RK substep count per sample interval for continuous
/// dynamics; when `None`, each filter applies its own default (10 for the
/// covariance form, 20 for the information form). Anything below
/// [`MIN_SUBSTEPS`] is a configuration error.
pub struct FilterConfig {
    pub dynamics: Dynamics,
    pub measurement: Box<MeasurementModel>,
    /// Epoch the initial mean/covariance refer to.
    pub epoch0: Epoch,
    pub x0: DVector<f64>,
    pub p0: DMatrix<f64>,
    pub history: TimeHistory,
    pub noise: NoiseModel,
    pub substeps: Option<usize>,
}

impl FilterConfig {
    /// Validates the whole argument set and derives the problem dimensions.
    /// Called once by each filter's `build`; never retried.
    pub(crate) fn validate(&self, default_substeps: usize) -> Result<(Dims, usize), YabfError> {
        let nx = self.x0.len();
        if nx == 0 {
            return Err(YabfError::ConfigErr("initial mean must not be empty"));
        }
        if self.p0.nrows() != nx || self.p0.ncols() != nx {
            return Err(YabfError::DimensionMismatchErr(
                "initial covariance must be nx-by-nx",
            ));
        }
        self.noise.validate()?;
        let nv = self.noise.q.nrows();
        let nz = self.noise.r.nrows();
        self.history.validate(self.epoch0, nz)?;
        let substeps = self.substeps.unwrap_or(default_substeps);
        if substeps < MIN_SUBSTEPS {
            return Err(YabfError::ConfigErr(
                "integration substep count must be at least 5",
            ));
        }
        Ok((
            Dims {
                nx,
                nv,
                nz,
                kmax: self.history.len(),
            },
            substeps,
        ))
    }
}
