/// import yabf crate
extern crate yabf;
/// import the batch estimator contract and the square-root information filter.
use yabf::bf::{BatchEstimator, Dynamics, FilterConfig, NoiseModel, Srif, TimeHistory, YabfError};
/// import Re-exports of hifitime (for time) and nalgebra (for matrix)
use yabf::{
    linalg::{DMatrix, DVector},
    time::{Duration, Epoch},
};

fn main() {
    use rand::prelude::*;

    // same tracking problem as the EKF demo, but the dynamics are kept in
    // continuous form and discretized by the RK integrator inside the run,
    // and the uncertainty is carried as a triangular information factor.
    let kmax = 50_usize;
    let epoch0 = Epoch::from_gregorian_tai(2024, 1, 1, 0, 0, 0, 0);

    let mut rng = rand::thread_rng();
    let f = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 1.0]);
    let g = DMatrix::from_row_slice(2, 1, &[0.5, 1.0]);
    let mut x_true = DVector::from_row_slice(&[0.0, 1.0]);
    let mut epochs = Vec::with_capacity(kmax);
    let mut measurements = Vec::with_capacity(kmax);
    for k in 0..kmax {
        let v = DVector::from_element(1, 0.1 * rng.gen_range(-1.0..1.0));
        x_true = &f * &x_true + &g * v;
        epochs.push(epoch0 + Duration::from_seconds((k + 1) as f64));
        measurements.push(DVector::from_element(1, x_true[0] + rng.gen_range(-1.0..1.0)));
    }

    let dynamics = Dynamics::Continuous(Box::new(
        |_t: Epoch,
         x: &DVector<f64>,
         _u: &DVector<f64>,
         v: &DVector<f64>|
         -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), YabfError> {
            let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]);
            let d = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
            Ok((&a * x + &d * v, a, d))
        },
    ));
    let measurement = Box::new(
        |x: &DVector<f64>, _k: usize| -> Result<(DVector<f64>, DMatrix<f64>), YabfError> {
            let h = DMatrix::from_row_slice(1, 2, &[1.0, 0.0]);
            Ok((&h * x, h))
        },
    );

    let cfg = FilterConfig {
        dynamics,
        measurement,
        epoch0,
        x0: DVector::from_row_slice(&[0.0, 1.0]),
        p0: DMatrix::identity(2, 2),
        history: TimeHistory::new(epochs, vec![DVector::zeros(0); kmax], measurements).unwrap(),
        noise: NoiseModel::new(
            DMatrix::from_element(1, 1, 0.01),
            DMatrix::from_element(1, 1, 0.33),
        ),
        substeps: None,
    };

    let mut srif = Srif::build(cfg).expect("configuration rejected");
    srif.run().expect("batch run failed");

    let hist = srif.history();
    println!("true final state     = {:.4}", x_true.transpose());
    println!(
        "estimated final mean = {:.4}",
        hist.means[kmax].transpose()
    );
    println!("final covariance     = {:.6}", hist.covariances[kmax]);

    // the factor and the recovered covariance stay duals of each other
    let r = &srif.factors[kmax];
    let residual = (r.transpose() * r * &hist.covariances[kmax]
        - DMatrix::<f64>::identity(2, 2))
    .norm();
    println!("information/covariance duality residual = {:.3e}", residual);
}
