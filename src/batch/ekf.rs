use crate::alloc::boxed::Box;
use crate::alloc::vec::Vec;
use crate::errors::YabfError;
use crate::models::{Dynamics, MeasurementModel, NoiseModel};

use super::config::FilterConfig;
use super::contract::{BatchEstimator, Dims};
use super::history::EstimateHistory;

use crate::linalg::{DMatrix, DVector};
use crate::time::Epoch;

const DEFAULT_SUBSTEPS: usize = 10;

/// Covariance-form batch extended Kalman filter.
///
/// The baseline estimator: classical Riccati propagation and update over
/// the full recorded history. Maintains the running posterior as a
/// `(mean, covariance)` pair.
pub struct Ekf {
    pub dims: Dims,
    pub dynamics: Dynamics,
    pub measurement: Box<MeasurementModel>,
    pub noise: NoiseModel,
    pub epoch0: Epoch,
    pub epochs: Vec<Epoch>,
    pub controls: Vec<DVector<f64>>,
    pub measurements: Vec<DVector<f64>>,
    pub substeps: usize,
    // running posterior
    x: DVector<f64>,
    p: DMatrix<f64>,
    // a-priori estimate between the two phases of one sample
    pending: Option<(DVector<f64>, DMatrix<f64>)>,
    hist: EstimateHistory,
}

impl Ekf {
    /// function that returns an `Ekf` from a validated configuration.
    /// Default substep count is 10.
    pub fn build(cfg: FilterConfig) -> Result<Self, YabfError> {
        let (dims, substeps) = cfg.validate(DEFAULT_SUBSTEPS)?;
        let hist = EstimateHistory::new(dims.nx, dims.kmax);
        Ok(Self {
            dims,
            dynamics: cfg.dynamics,
            measurement: cfg.measurement,
            noise: cfg.noise,
            epoch0: cfg.epoch0,
            epochs: cfg.history.epochs,
            controls: cfg.history.controls,
            measurements: cfg.history.measurements,
            substeps,
            x: cfg.x0,
            p: cfg.p0,
            pending: None,
            hist,
        })
    }

    /// current posterior mean
    pub fn current_mean(&self) -> &DVector<f64> {
        &self.x
    }

    /// current posterior covariance
    pub fn current_covariance(&self) -> &DMatrix<f64> {
        &self.p
    }

    fn interval(&self, k: usize) -> (Epoch, Epoch) {
        let start = if k == 0 { self.epoch0 } else { self.epochs[k - 1] };
        (start, self.epochs[k])
    }
}

impl BatchEstimator for Ekf {
    fn dims(&self) -> Dims {
        self.dims
    }

    fn init(&mut self) -> Result<(), YabfError> {
        self.hist.set_snapshot(0, &self.x, &self.p);
        self.pending = None;
        Ok(())
    }

    fn propagate(&mut self, k: usize) -> Result<(), YabfError> {
        let (t0, t1) = self.interval(k);
        let (xbar, fmat, gmat) = self.dynamics.discretize(
            k,
            t0,
            t1,
            &self.x,
            &self.controls[k],
            self.dims.nv,
            self.substeps,
        )?;
        // P̄ = F·P·Fᵀ + Γ·Q·Γᵀ
        let pbar =
            &fmat * &self.p * fmat.transpose() + &gmat * &self.noise.q * gmat.transpose();
        self.pending = Some((xbar, pbar));
        Ok(())
    }

    fn update(&mut self, k: usize) -> Result<(), YabfError> {
        let (xbar, pbar) = self
            .pending
            .take()
            .ok_or(YabfError::ConfigErr("update called before propagate"))?;
        let (zbar, hmat) = (self.measurement)(&xbar, k)?;
        let innovation = &self.measurements[k] - zbar;
        let s = &hmat * &pbar * hmat.transpose() + &self.noise.r;
        let chol = s.clone().cholesky().ok_or(YabfError::SingularErr {
            matrix: "innovation covariance",
            sample: k,
        })?;
        // W = P̄·Hᵀ·S⁻¹, via the Cholesky solve of S·Wᵀ = H·P̄
        let gain = chol.solve(&(&hmat * &pbar)).transpose();
        let stat = innovation.dot(&chol.solve(&innovation));

        self.x = &xbar + &gain * &innovation;
        self.p = &pbar - &gain * &s * gain.transpose();
        self.hist.set_snapshot(k + 1, &self.x, &self.p);
        self.hist.set_stat(k, stat);
        Ok(())
    }

    fn history(&self) -> &EstimateHistory {
        &self.hist
    }
}
