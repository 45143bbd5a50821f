use crate::alloc::boxed::Box;
use crate::c2d;
use crate::errors::YabfError;

use crate::linalg::{DMatrix, DVector};
use crate::time::Epoch;

/// Continuous dynamics callable with Jacobians:
/// `(t, x, u, v) -> (dx/dt, A, D)` where `A = ∂f/∂x` (nx×nx) and
/// `D = ∂f/∂v` (nx×nv). Consumed by the RK integrator in [`crate::c2d`].
pub type ContinuousDynamics = dyn Fn(
    Epoch,
    &DVector<f64>,
    &DVector<f64>,
    &DVector<f64>,
) -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), YabfError>;

/// Fully-discrete dynamics callable:
/// `(x, u, v, k) -> (x_next, F, Γ)` where `F = ∂x_next/∂x` (nx×nx) and
/// `Γ = ∂x_next/∂v` (nx×nv).
pub type DiscreteDynamics = dyn Fn(
    &DVector<f64>,
    &DVector<f64>,
    &DVector<f64>,
    usize,
) -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), YabfError>;

/// Measurement model callable: `(x, k) -> (z_pred, H)` with `H = ∂h/∂x`
/// (nz×nx).
pub type MeasurementModel =
    dyn Fn(&DVector<f64>, usize) -> Result<(DVector<f64>, DMatrix<f64>), YabfError>;

/// Model timing: continuous dynamics with discrete measurements, or a fully
/// discrete model. An unrecognized timing value cannot be constructed.
pub enum Dynamics {
    /// Continuous-time dynamics, discretized over each sample interval by
    /// the fixed-step RK integrator.
    Continuous(Box<ContinuousDynamics>),
    /// Dynamics already in discrete form, called once per sample interval.
    Discrete(Box<DiscreteDynamics>),
}

impl Dynamics {
    /// Shared model adapter step: advance the mean over one sample interval
    /// and return it with its sensitivity matrices `(x̄, F, Γ)`.
    ///
    /// `k` is the sample index being left, `(t0, t1)` the interval epochs.
    /// Process noise is evaluated at its nominal (zero) value.
    pub fn discretize(
        &self,
        k: usize,
        t0: Epoch,
        t1: Epoch,
        x: &DVector<f64>,
        u: &DVector<f64>,
        nv: usize,
        substeps: usize,
    ) -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), YabfError> {
        let nominal = DVector::<f64>::zeros(nv);
        match self {
            Dynamics::Continuous(f) => {
                c2d::discretize(f.as_ref(), t0, t1, x, u, &nominal, substeps, true)
            }
            Dynamics::Discrete(f) => f(x, u, &nominal, k),
        }
    }
}

/// Process and measurement noise statistics.
///
/// `q` is the process-noise covariance (nv×nv) and `r` the measurement-noise
/// covariance (nz×nz); both must be symmetric positive definite. The
/// square-root information filter derives its whitening transforms from
/// these, once, at setup.
pub struct NoiseModel {
    pub q: DMatrix<f64>,
    pub r: DMatrix<f64>,
}

const SYMMETRY_TOL: f64 = 1e-9;

impl NoiseModel {
    pub fn new(q: DMatrix<f64>, r: DMatrix<f64>) -> Self {
        Self { q, r }
    }

    /// Checks both covariances for shape, symmetry and positive
    /// definiteness. Runs once at filter construction, before any
    /// propagation.
    pub fn validate(&self) -> Result<(), YabfError> {
        Self::check_spd(&self.q, "process noise covariance")?;
        Self::check_spd(&self.r, "measurement noise covariance")
    }

    fn check_spd(m: &DMatrix<f64>, name: &'static str) -> Result<(), YabfError> {
        if !m.is_square() || m.nrows() == 0 {
            return Err(YabfError::DimensionMismatchErr(name));
        }
        let skew = (m - m.transpose()).norm();
        if skew > SYMMETRY_TOL * (1.0 + m.norm()) {
            return Err(YabfError::NotPositiveDefiniteErr { matrix: name });
        }
        match m.clone().cholesky() {
            Some(_) => Ok(()),
            None => Err(YabfError::NotPositiveDefiniteErr { matrix: name }),
        }
    }

    /// Process square-root-information factor `Rq` with `RqᵀRq = Q⁻¹`,
    /// obtained from the Cholesky factor of `Q` by a triangular solve.
    pub fn process_sqrt_info(&self) -> Result<DMatrix<f64>, YabfError> {
        let lq = self
            .q
            .clone()
            .cholesky()
            .ok_or(YabfError::NotPositiveDefiniteErr {
                matrix: "process noise covariance",
            })?
            .l();
        let eye = DMatrix::<f64>::identity(self.q.nrows(), self.q.nrows());
        lq.solve_lower_triangular(&eye)
            .ok_or(YabfError::NotPositiveDefiniteErr {
                matrix: "process noise covariance",
            })
    }

    /// Measurement whitening factor: the lower Cholesky factor `Lw` of `R`,
    /// so that `Lw⁻¹ z` has identity covariance. Applied by triangular
    /// solves rather than through an explicit inverse.
    pub fn whitening_factor(&self) -> Result<DMatrix<f64>, YabfError> {
        Ok(self
            .r
            .clone()
            .cholesky()
            .ok_or(YabfError::NotPositiveDefiniteErr {
                matrix: "measurement noise covariance",
            })?
            .l())
    }
}
