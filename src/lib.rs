//! Yet another batch filter.
//!
//! Offline (full-history) state estimation: given a dynamics model, a
//! measurement model and a recorded time/control/measurement history, the
//! filters in this crate reconstruct the state trajectory and its
//! uncertainty at every sample. Two estimator forms share one recurrence:
//! a covariance-form extended Kalman filter ([`bf::Ekf`]) and an extended
//! square-root information filter ([`bf::Srif`]) that carries a triangular
//! factor of the inverse covariance and fuses everything through QR.
#![no_std]
#[macro_use]
extern crate log;
extern crate alloc;
extern crate hifitime;
extern crate itertools;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
    pub use na::RealField;
}

/// Export yabf
pub mod bf {
    pub use super::batch::{
        config::FilterConfig,
        contract::{BatchEstimator, Dims, MIN_SUBSTEPS},
        ekf::Ekf,
        history::{EstimateHistory, TimeHistory},
        srif::Srif,
    };
    pub use super::c2d::discretize;
    pub use super::errors::YabfError;
    pub use super::models::{
        ContinuousDynamics, DiscreteDynamics, Dynamics, MeasurementModel, NoiseModel,
    };
}

pub mod batch;
pub mod c2d;
pub mod errors;
pub mod models;
mod tests;
