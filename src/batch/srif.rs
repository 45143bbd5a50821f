use crate::alloc::boxed::Box;
use crate::alloc::vec::Vec;
use crate::errors::YabfError;
use crate::models::{Dynamics, MeasurementModel, NoiseModel};

use super::config::FilterConfig;
use super::contract::{BatchEstimator, Dims};
use super::history::EstimateHistory;

use crate::linalg::{DMatrix, DVector};
use crate::time::Epoch;

const DEFAULT_SUBSTEPS: usize = 20;

/// Extended square-root information filter.
///
/// Uncertainty is carried as an upper-triangular information factor `R` with
/// `RᵀR = P⁻¹`, together with the information vector `ζ = R·x̂`. Process
/// noise and measurements are fused exclusively through orthogonal (QR)
/// transforms: orthogonal transforms have unit condition number, so the
/// factored information never amplifies round-off the way repeated
/// covariance products and inversions can. The covariance itself is never
/// formed or inverted inside the recurrence; the emitted `(mean,
/// covariance)` snapshots are recovered from the factor by triangular
/// solves, for the output history only.
pub struct Srif {
    pub dims: Dims,
    pub dynamics: Dynamics,
    pub measurement: Box<MeasurementModel>,
    pub noise: NoiseModel,
    pub epoch0: Epoch,
    pub epochs: Vec<Epoch>,
    pub controls: Vec<DVector<f64>>,
    pub substeps: usize,
    /// Process square-root-information factor, `RqᵀRq = Q⁻¹`. Computed once.
    pub rq: DMatrix<f64>,
    /// Measurement whitening factor (lower Cholesky factor of R). Its
    /// inverse-transpose action is applied by triangular solves.
    pub lw: DMatrix<f64>,
    /// Measurement history pre-whitened into identity-covariance space.
    pub whitened: Vec<DVector<f64>>,
    /// Posterior information factor per snapshot, kept alongside the
    /// standard outputs so factored results stay inspectable.
    pub factors: Vec<DMatrix<f64>>,
    // running posterior in information form, plus its mean for linearization
    rfac: DMatrix<f64>,
    zeta: DVector<f64>,
    x: DVector<f64>,
    // a-priori (factor, information vector, mean) between the two phases
    pending: Option<(DMatrix<f64>, DVector<f64>, DVector<f64>)>,
    hist: EstimateHistory,
}

impl Srif {
    /// function that returns a `Srif` from a validated configuration.
    /// Default substep count is 20.
    ///
    /// Setup work done once, all of it before any propagation: Cholesky
    /// factorizations of `Q`, `R` and `P₀` (failure is a fatal precondition
    /// violation), the whitening of the whole measurement history, and the
    /// initial information pair `(R₀, ζ₀)`.
    pub fn build(cfg: FilterConfig) -> Result<Self, YabfError> {
        let (dims, substeps) = cfg.validate(DEFAULT_SUBSTEPS)?;

        let rq = cfg.noise.process_sqrt_info()?;
        let lw = cfg.noise.whitening_factor()?;
        let whitened = cfg
            .history
            .measurements
            .iter()
            .map(|z| {
                lw.solve_lower_triangular(z)
                    .ok_or(YabfError::NotPositiveDefiniteErr {
                        matrix: "measurement noise covariance",
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        // R₀ᵀR₀ = P₀⁻¹, orthogonalized to an upper-triangular factor so the
        // triangular readout applies from sample 0 on.
        let l0 = cfg
            .p0
            .clone()
            .cholesky()
            .ok_or(YabfError::NotPositiveDefiniteErr {
                matrix: "initial covariance",
            })?
            .l();
        let eye = DMatrix::<f64>::identity(dims.nx, dims.nx);
        let l0inv =
            l0.solve_lower_triangular(&eye)
                .ok_or(YabfError::NotPositiveDefiniteErr {
                    matrix: "initial covariance",
                })?;
        let rfac = l0inv.qr().r();
        let zeta = &rfac * &cfg.x0;

        let mut factors = Vec::with_capacity(dims.kmax + 1);
        for _ in 0..=dims.kmax {
            factors.push(DMatrix::zeros(dims.nx, dims.nx));
        }
        let hist = EstimateHistory::new(dims.nx, dims.kmax);
        Ok(Self {
            dims,
            dynamics: cfg.dynamics,
            measurement: cfg.measurement,
            noise: cfg.noise,
            epoch0: cfg.epoch0,
            epochs: cfg.history.epochs,
            controls: cfg.history.controls,
            substeps,
            rq,
            lw,
            whitened,
            factors,
            rfac,
            zeta,
            x: cfg.x0,
            pending: None,
            hist,
        })
    }

    /// current posterior information factor
    pub fn information_factor(&self) -> &DMatrix<f64> {
        &self.rfac
    }

    /// current posterior information vector
    pub fn information_vector(&self) -> &DVector<f64> {
        &self.zeta
    }

    fn interval(&self, k: usize) -> (Epoch, Epoch) {
        let start = if k == 0 { self.epoch0 } else { self.epochs[k - 1] };
        (start, self.epochs[k])
    }

    /// Recover `(mean, covariance)` from an information pair by triangular
    /// solves; nothing here feeds the next iteration.
    fn readout(
        rfac: &DMatrix<f64>,
        zeta: &DVector<f64>,
        sample: usize,
    ) -> Result<(DVector<f64>, DMatrix<f64>), YabfError> {
        let nx = rfac.nrows();
        let singular = YabfError::SingularErr {
            matrix: "information factor",
            sample,
        };
        let mean = rfac
            .solve_upper_triangular(zeta)
            .ok_or_else(|| singular.clone())?;
        let eye = DMatrix::<f64>::identity(nx, nx);
        let rinv = rfac.solve_upper_triangular(&eye).ok_or(singular)?;
        let cov = &rinv * rinv.transpose();
        Ok((mean, cov))
    }
}

impl BatchEstimator for Srif {
    fn dims(&self) -> Dims {
        self.dims
    }

    fn init(&mut self) -> Result<(), YabfError> {
        let (mean, cov) = Self::readout(&self.rfac, &self.zeta, 0)?;
        self.hist.set_snapshot(0, &mean, &cov);
        self.factors[0].copy_from(&self.rfac);
        self.x = mean;
        self.pending = None;
        Ok(())
    }

    /// Dynamics discretization and process-noise fusion in one orthogonal
    /// step: QR of
    ///
    /// ```text
    /// [  Rq        0      ]          [    0    ]
    /// [ -A·Γ       A      ]   over   [  A·x̄   ]      with A = R_k·F⁻¹,
    /// ```
    ///
    /// whose trailing nx-by-nx triangle and trailing nx transformed entries
    /// are the a-priori information pair at `k + 1`.
    fn propagate(&mut self, k: usize) -> Result<(), YabfError> {
        let (nx, nv) = (self.dims.nx, self.dims.nv);
        let (t0, t1) = self.interval(k);
        let (xbar, fmat, gmat) = self.dynamics.discretize(
            k,
            t0,
            t1,
            &self.x,
            &self.controls[k],
            nv,
            self.substeps,
        )?;

        // A = R_k·F⁻¹ without inverting F: solve Fᵀ·Aᵀ = R_kᵀ by LU.
        let a = fmat
            .transpose()
            .lu()
            .solve(&self.rfac.transpose())
            .ok_or(YabfError::SingularErr {
                matrix: "state transition matrix",
                sample: k,
            })?
            .transpose();

        let mut block = DMatrix::<f64>::zeros(nv + nx, nv + nx);
        block.view_mut((0, 0), (nv, nv)).copy_from(&self.rq);
        block.view_mut((nv, 0), (nx, nv)).copy_from(&(-(&a * &gmat)));
        block.view_mut((nv, nv), (nx, nx)).copy_from(&a);
        let mut rhs = DVector::<f64>::zeros(nv + nx);
        rhs.rows_mut(nv, nx).copy_from(&(&a * &xbar));

        let qr = block.qr();
        qr.q_tr_mul(&mut rhs);
        let tri = qr.r();
        let rbar = tri.view((nv, nv), (nx, nx)).into_owned();
        let zbar = rhs.rows(nv, nx).into_owned();
        self.pending = Some((rbar, zbar, xbar));
        Ok(())
    }

    /// Measurement fusion: linearize at the a-priori mean, whiten `H` and
    /// the residual, recast the nonlinear measurement as the pseudo-linear
    /// `z_w - ẑ_w + H_w·x̄`, then QR the stacked `[R̄; H_w]` system. The
    /// trailing nz transformed entries are the whitened residual; their
    /// squared norm is the innovation statistic, with no innovation
    /// covariance ever formed or inverted.
    fn update(&mut self, k: usize) -> Result<(), YabfError> {
        let (nx, nz) = (self.dims.nx, self.dims.nz);
        let (rbar, zbar, xbar) = self
            .pending
            .take()
            .ok_or(YabfError::ConfigErr("update called before propagate"))?;

        let (zhat, hmat) = (self.measurement)(&xbar, k)?;
        let singular_r = YabfError::SingularErr {
            matrix: "measurement whitening factor",
            sample: k,
        };
        let hw = self
            .lw
            .solve_lower_triangular(&hmat)
            .ok_or_else(|| singular_r.clone())?;
        let zhat_w = self.lw.solve_lower_triangular(&zhat).ok_or(singular_r)?;
        let resid = &self.whitened[k] - zhat_w + &hw * &xbar;

        let mut stack = DMatrix::<f64>::zeros(nx + nz, nx);
        stack.view_mut((0, 0), (nx, nx)).copy_from(&rbar);
        stack.view_mut((nx, 0), (nz, nx)).copy_from(&hw);
        let mut rhs = DVector::<f64>::zeros(nx + nz);
        rhs.rows_mut(0, nx).copy_from(&zbar);
        rhs.rows_mut(nx, nz).copy_from(&resid);

        let qr = stack.qr();
        qr.q_tr_mul(&mut rhs);
        self.rfac = qr.r();
        self.zeta = rhs.rows(0, nx).into_owned();
        let stat = rhs.rows(nx, nz).norm_squared();

        let (mean, cov) = Self::readout(&self.rfac, &self.zeta, k)?;
        self.hist.set_snapshot(k + 1, &mean, &cov);
        self.hist.set_stat(k, stat);
        self.factors[k + 1].copy_from(&self.rfac);
        self.x = mean;
        Ok(())
    }

    fn history(&self) -> &EstimateHistory {
        &self.hist
    }
}
