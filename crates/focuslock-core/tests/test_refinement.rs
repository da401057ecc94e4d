mod common;

use approx::assert_relative_eq;
use ndarray::Array2;

use common::{gaussian_spot, shift_array, to_u16};
use focuslock_core::config::RefineConfig;
use focuslock_core::frame::FocusOffset;
use focuslock_core::{OffsetEstimator, RefineStatus};

const PROBES: [(f64, f64); 6] = [
    (0.0, 0.0),
    (0.37, -0.81),
    (-1.2, 0.45),
    (2.6, 1.9),
    (-0.05, -2.3),
    (1.1, 3.4),
];

fn loaded_estimator() -> OffsetEstimator {
    let im1 = gaussian_spot(32, 64, 14.3, 30.6, 2.0);
    let im2 = gaussian_spot(32, 64, 16.1, 28.2, 2.0);
    let mut est = OffsetEstimator::new(32, 64, 1).unwrap();
    est.load_image_pair(&im1.view(), &im2.view(), 0.0, 0.0).unwrap();
    est
}

#[test]
fn test_gradient_matches_finite_differences() {
    let mut est = loaded_estimator();
    let h = 1e-4;

    for &(dy, dx) in &PROBES {
        let analytic = est.gradient(FocusOffset::new(dy, dx));
        let num_dy = (est.cost(FocusOffset::new(dy + h, dx)) - est.cost(FocusOffset::new(dy - h, dx)))
            / (2.0 * h);
        let num_dx = (est.cost(FocusOffset::new(dy, dx + h)) - est.cost(FocusOffset::new(dy, dx - h)))
            / (2.0 * h);

        assert_relative_eq!(analytic[0], num_dy, epsilon = 1e-6, max_relative = 1e-4);
        assert_relative_eq!(analytic[1], num_dx, epsilon = 1e-6, max_relative = 1e-4);
    }
}

#[test]
fn test_hessian_matches_finite_differences() {
    let mut est = loaded_estimator();
    let h = 1e-4;

    for &(dy, dx) in &PROBES {
        let analytic = est.hessian(FocusOffset::new(dy, dx));
        let gy_plus = est.gradient(FocusOffset::new(dy + h, dx));
        let gy_minus = est.gradient(FocusOffset::new(dy - h, dx));
        let gx_plus = est.gradient(FocusOffset::new(dy, dx + h));
        let gx_minus = est.gradient(FocusOffset::new(dy, dx - h));

        let yy = (gy_plus[0] - gy_minus[0]) / (2.0 * h);
        let yx = (gy_plus[1] - gy_minus[1]) / (2.0 * h);
        let xy = (gx_plus[0] - gx_minus[0]) / (2.0 * h);
        let xx = (gx_plus[1] - gx_minus[1]) / (2.0 * h);

        assert_relative_eq!(analytic[0], yy, epsilon = 1e-6, max_relative = 1e-4);
        assert_relative_eq!(analytic[1], yx, epsilon = 1e-6, max_relative = 1e-4);
        assert_relative_eq!(analytic[2], xy, epsilon = 1e-6, max_relative = 1e-4);
        assert_relative_eq!(analytic[3], xx, epsilon = 1e-6, max_relative = 1e-4);
        assert_eq!(analytic[1], analytic[2]);
    }
}

#[test]
fn test_shifted_spectrum_is_cached_per_offset() {
    let mut est = loaded_estimator();
    assert_eq!(est.shift_updates(), 0);

    let a = FocusOffset::new(0.25, -0.75);
    let cost = est.cost(a);
    let gradient = est.gradient(a);
    let hessian = est.hessian(a);
    assert_eq!(est.shift_updates(), 1);

    assert_eq!(est.cost(a), cost);
    assert_eq!(est.gradient(a), gradient);
    assert_eq!(est.hessian(a), hessian);
    assert_eq!(est.shift_updates(), 1);
    assert_eq!(est.last_cost(), cost);
    assert_eq!(est.last_gradient(), gradient);
    assert_eq!(est.last_hessian(), hessian);

    let b = FocusOffset::new(0.25, -0.5);
    est.gradient(b);
    est.hessian(b);
    assert_eq!(est.shift_updates(), 2);

    est.cost(a);
    assert_eq!(est.shift_updates(), 3);
    assert_eq!(est.last_cost(), cost);
}

#[test]
fn test_new_image_pair_invalidates_shift_cache() {
    let mut est = loaded_estimator();
    let a = FocusOffset::new(0.5, 0.5);
    let before = est.cost(a);

    let im = gaussian_spot(32, 64, 16.0, 32.0, 2.0);
    est.load_image_pair(&im.view(), &im.view(), 0.0, 0.0).unwrap();
    let after = est.cost(a);

    assert_eq!(est.shift_updates(), 2);
    assert_ne!(before, after);
}

#[test]
fn test_cost_is_negative_correlation_at_integer_offsets() {
    let im1 = gaussian_spot(16, 16, 7.0, 8.0, 1.5);
    let im2 = gaussian_spot(16, 16, 5.0, 9.0, 1.5);
    let mut est = OffsetEstimator::new(16, 16, 1).unwrap();
    est.load_image_pair(&im1.view(), &im2.view(), 0.0, 0.0).unwrap();

    // Shifting image2 by (2, -1) lands it exactly on image1.
    let direct: f64 = im1.iter().map(|v| v * v).sum();
    assert_relative_eq!(est.cost(FocusOffset::new(2.0, -1.0)), -direct, max_relative = 1e-6);
}

#[test]
fn test_minimize_converges_to_subpixel_offset() {
    let im1 = gaussian_spot(32, 64, 18.7, 29.4, 2.0);
    let im2 = gaussian_spot(32, 64, 14.4, 31.9, 2.0);
    let mut est = OffsetEstimator::new(32, 64, 1).unwrap();

    let refinement = est
        .find_offset(&im1.view(), &im2.view(), 0.0, 0.0, &RefineConfig::default())
        .unwrap();

    assert_eq!(refinement.status, RefineStatus::Converged);
    assert!(refinement.iterations <= 10, "took {} iterations", refinement.iterations);
    assert!((refinement.offset.dy - 4.3).abs() < 1e-3, "dy={}", refinement.offset.dy);
    assert!((refinement.offset.dx + 2.5).abs() < 1e-3, "dx={}", refinement.offset.dx);
    assert_eq!(est.offset(), refinement.offset);

    // The final cost is stored and lies below the coarse one.
    let coarse = est.coarse_offset();
    let final_cost = est.last_cost();
    assert!(est.cost(coarse) > final_cost);
}

#[test]
fn test_minimize_with_downsampling() {
    let downsample = 4;
    let mut est = OffsetEstimator::new(64, 128, downsample).unwrap();
    let cases = [(5.2, -9.6), (-3.7, 14.1), (0.4, 0.9)];

    for &(dy, dx) in &cases {
        let im1 = gaussian_spot(64, 128, 32.0 + dy, 64.0 + dx, downsample as f64);
        let im2 = gaussian_spot(64, 128, 32.0, 64.0, downsample as f64);
        let refinement = est
            .find_offset(&im1.view(), &im2.view(), 0.0, 0.0, &RefineConfig::default())
            .unwrap();

        assert!(refinement.is_converged());
        let pixels = refinement.pixel_offset(downsample);
        assert!((pixels.dy - dy).abs() < 0.1, "dy={} expected {}", pixels.dy, dy);
        assert!((pixels.dx - dx).abs() < 0.1, "dx={} expected {}", pixels.dx, dx);
        assert_eq!(est.pixel_offset(), pixels);
    }
}

#[test]
fn test_flat_surface_is_not_solvable() {
    let blank = Array2::<u16>::from_elem((16, 16), 100);
    let mut est = OffsetEstimator::new(16, 16, 1).unwrap();
    est.load_image_pair(&blank.view(), &blank.view(), 100.0, 100.0)
        .unwrap();

    let refinement = est.minimize(1e-6, 50);
    assert_eq!(refinement.status, RefineStatus::NotSolvable);
    assert_eq!(refinement.iterations, 1);
    assert!(refinement.offset.is_finite());
    assert!(refinement.into_result().is_err());
}

#[test]
fn test_minimize_before_loading_is_not_solvable() {
    let mut est = OffsetEstimator::new(8, 8, 1).unwrap();
    let refinement = est.minimize(1e-6, 10);
    assert_eq!(refinement.status, RefineStatus::NotSolvable);
    assert_eq!(refinement.offset, FocusOffset::default());
}

#[test]
fn test_iteration_budget_is_reported() {
    let mut est = loaded_estimator();
    let refinement = est.minimize(0.0, 3);
    assert_eq!(refinement.status, RefineStatus::MaxIterationsExceeded);
    assert_eq!(refinement.iterations, 3);
    assert!(refinement.offset.is_finite());
    assert_eq!(est.offset(), refinement.offset);

    let none = est.minimize(1e-6, 0);
    assert_eq!(none.status, RefineStatus::MaxIterationsExceeded);
    assert_eq!(none.offset, est.coarse_offset());
}

#[test]
fn test_minimize_restarts_from_coarse_offset() {
    let mut est = loaded_estimator();
    let first = est.minimize(1e-8, 50);
    let second = est.minimize(1e-8, 50);
    assert_eq!(first, second);
}

#[test]
fn test_end_to_end_focus_spot() {
    let base = gaussian_spot(256, 256, 130.3, 125.7, 2.0);
    let shifted = shift_array(&base, 3.0, -2.0);
    let im1 = to_u16(&shifted, 4000.0);
    let im2 = to_u16(&base, 4000.0);

    let mut est = OffsetEstimator::new(256, 256, 2).unwrap();
    est.load_image_pair(&im1.view(), &im2.view(), 0.0, 0.0).unwrap();
    let refinement = est.minimize(1e-6, 50);

    assert_eq!(refinement.status, RefineStatus::Converged);
    let pixels = refinement.pixel_offset(2);
    assert!((pixels.dy - 3.0).abs() < 0.05, "dy={}", pixels.dy);
    assert!((pixels.dx + 2.0).abs() < 0.05, "dx={}", pixels.dx);
}
