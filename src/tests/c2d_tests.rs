#[cfg(test)]
mod tests {
    use crate::alloc::string::String;
    use crate::bf::{discretize, YabfError};
    use crate::linalg::{DMatrix, DVector};
    use crate::time::{Duration, Epoch};

    fn t0() -> Epoch {
        Epoch::from_gregorian_tai(2024, 1, 1, 0, 0, 0, 0)
    }

    /// Constant-velocity kinematics are nilpotent, so RK4 discretizes them
    /// exactly: F = [[1, dt], [0, 1]], Γ = [dt²/2, dt].
    #[test]
    fn test_constant_velocity_discretization_is_exact() {
        let f = |_t: Epoch, x: &DVector<f64>, _u: &DVector<f64>, v: &DVector<f64>|
         -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), YabfError> {
            let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]);
            let d = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
            Ok((&a * x + &d * v, a, d))
        };
        let x0 = DVector::from_row_slice(&[3.0, -2.0]);
        let u = DVector::<f64>::zeros(0);
        let v = DVector::<f64>::zeros(1);
        let (x, fm, gm) = discretize(
            &f,
            t0(),
            t0() + Duration::from_seconds(1.0),
            &x0,
            &u,
            &v,
            5,
            true,
        )
        .unwrap();

        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] + 2.0).abs() < 1e-12);
        let f_exact = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 0.0, 1.0]);
        let g_exact = DMatrix::from_row_slice(2, 1, &[0.5, 1.0]);
        assert!((&fm - f_exact).norm() < 1e-12);
        assert!((&gm - g_exact).norm() < 1e-12);
    }

    #[test]
    fn test_harmonic_oscillator_accuracy() {
        let f = |_t: Epoch, x: &DVector<f64>, _u: &DVector<f64>, _v: &DVector<f64>|
         -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), YabfError> {
            let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -1.0, 0.0]);
            let d = DMatrix::<f64>::zeros(2, 1);
            Ok((&a * x, a, d))
        };
        let x0 = DVector::from_row_slice(&[1.0, 0.0]);
        let u = DVector::<f64>::zeros(0);
        let v = DVector::<f64>::zeros(1);
        let (x, fm, _gm) = discretize(
            &f,
            t0(),
            t0() + Duration::from_seconds(1.0),
            &x0,
            &u,
            &v,
            20,
            true,
        )
        .unwrap();

        let (c, s) = (1.0_f64.cos(), 1.0_f64.sin());
        assert!((x[0] - c).abs() < 1e-6);
        assert!((x[1] + s).abs() < 1e-6);
        // F is the rotation by -1 radian for this system
        let f_exact = DMatrix::from_row_slice(2, 2, &[c, s, -s, c]);
        assert!((&fm - f_exact).norm() < 1e-6);
    }

    #[test]
    fn test_sensitivity_flag_off_leaves_jacobians_untouched() {
        let f = |_t: Epoch, x: &DVector<f64>, _u: &DVector<f64>, _v: &DVector<f64>|
         -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), YabfError> {
            let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]);
            let d = DMatrix::<f64>::zeros(2, 1);
            Ok((&a * x, a, d))
        };
        let x0 = DVector::from_row_slice(&[0.0, 1.0]);
        let u = DVector::<f64>::zeros(0);
        let v = DVector::<f64>::zeros(1);
        let (x, fm, gm) = discretize(
            &f,
            t0(),
            t0() + Duration::from_seconds(2.0),
            &x0,
            &u,
            &v,
            10,
            false,
        )
        .unwrap();

        assert!((x[0] - 2.0).abs() < 1e-12);
        assert!((&fm - DMatrix::<f64>::identity(2, 2)).norm() == 0.0);
        assert!(gm.norm() == 0.0);
    }

    #[test]
    fn test_model_failure_propagates_unchanged() {
        let f = |_t: Epoch, _x: &DVector<f64>, _u: &DVector<f64>, _v: &DVector<f64>|
         -> Result<(DVector<f64>, DMatrix<f64>, DMatrix<f64>), YabfError> {
            Err(YabfError::ModelErr(String::from("thruster table lookup")))
        };
        let x0 = DVector::from_row_slice(&[0.0]);
        let u = DVector::<f64>::zeros(0);
        let v = DVector::<f64>::zeros(1);
        let err = discretize(
            &f,
            t0(),
            t0() + Duration::from_seconds(1.0),
            &x0,
            &u,
            &v,
            5,
            true,
        )
        .unwrap_err();
        assert_eq!(
            err,
            YabfError::ModelErr(String::from("thruster table lookup"))
        );
    }
}
