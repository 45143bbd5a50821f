//! Continuous-to-discrete conversion of a dynamics model over one sample
//! interval, by fixed-step classic Runge-Kutta.
//!
//! The state and its sensitivity ODEs are integrated together:
//!
//! ```text
//! ẋ = f(t, x, u, v̄)      Ḟ = A·F      Γ̇ = A·Γ + D
//! ```
//!
//! with `F(t0) = I`, `Γ(t0) = 0`, so that the returned `(x̄, F, Γ)` are the
//! discretized state and its partials with respect to the previous state and
//! the process-noise input. Deterministic and side-effect free; failures
//! from the model callable propagate unchanged.

use crate::errors::YabfError;
use crate::models::ContinuousDynamics;

use crate::linalg::{DMatrix, DVector};
use crate::time::{Duration, Epoch};

struct Slope {
    x: DVector<f64>,
    f: DMatrix<f64>,
    g: DMatrix<f64>,
}

/// Integrate the dynamics (and, if `with_sensitivity`, the sensitivity
/// matrices) from `t0` to `t1` in `substeps` RK4 steps.
///
/// `nominal_v` is the process-noise value the model is evaluated at, usually
/// zero. With `with_sensitivity = false` the returned `F` stays identity and
/// `Γ` zero; only the mean is advanced.
#[allow(clippy::too_many_arguments)]
pub fn discretize(
    f: &ContinuousDynamics,
    t0: Epoch,
    t1: Epoch,
    x0: &DVector<f64>,
    u: &DVector<f64>,
    nominal_v: &DVector<f64>,
    substeps: usize,
    with_sensitivity: bool,
) -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), YabfError> {
    let nx = x0.len();
    let nv = nominal_v.len();
    let h = (t1 - t0).to_seconds() / substeps as f64;
    let half = Duration::from_seconds(0.5 * h);
    let full = Duration::from_seconds(h);

    let mut t = t0;
    let mut x = x0.clone();
    let mut fm = DMatrix::<f64>::identity(nx, nx);
    let mut gm = DMatrix::<f64>::zeros(nx, nv);

    // Slopes of the joint (x, F, Γ) system at one evaluation point.
    let eval = |t: Epoch,
                x: &DVector<f64>,
                fm: &DMatrix<f64>,
                gm: &DMatrix<f64>|
     -> Result<Slope, YabfError> {
        let (xdot, a, d) = f(t, x, u, nominal_v)?;
        if with_sensitivity {
            Ok(Slope {
                x: xdot,
                f: &a * fm,
                g: &a * gm + d,
            })
        } else {
            Ok(Slope {
                x: xdot,
                f: DMatrix::zeros(nx, nx),
                g: DMatrix::zeros(nx, nv),
            })
        }
    };

    for _ in 0..substeps {
        let k1 = eval(t, &x, &fm, &gm)?;
        let k2 = eval(
            t + half,
            &(&x + &k1.x * (0.5 * h)),
            &(&fm + &k1.f * (0.5 * h)),
            &(&gm + &k1.g * (0.5 * h)),
        )?;
        let k3 = eval(
            t + half,
            &(&x + &k2.x * (0.5 * h)),
            &(&fm + &k2.f * (0.5 * h)),
            &(&gm + &k2.g * (0.5 * h)),
        )?;
        let k4 = eval(
            t + full,
            &(&x + &k3.x * h),
            &(&fm + &k3.f * h),
            &(&gm + &k3.g * h),
        )?;

        x += (&k1.x + &k2.x * 2.0 + &k3.x * 2.0 + &k4.x) * (h / 6.0);
        fm += (&k1.f + &k2.f * 2.0 + &k3.f * 2.0 + &k4.f) * (h / 6.0);
        gm += (&k1.g + &k2.g * 2.0 + &k3.g * 2.0 + &k4.g) * (h / 6.0);
        t = t + full;
    }

    Ok((x, fm, gm))
}
