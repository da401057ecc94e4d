//! Planned 2D complex FFT over `ndarray` grids.
//!
//! Plans and scratch space are created once per grid size and reused for
//! every transform, so per-frame work is limited to the butterflies.

use std::sync::Arc;

use ndarray::{Array2, Axis};
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

pub struct Fft2d {
    height: usize,
    width: usize,
    row_forward: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
    line: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

impl Fft2d {
    pub fn new(height: usize, width: usize) -> Self {
        let mut planner = FftPlanner::new();
        let row_forward = planner.plan_fft_forward(width);
        let col_forward = planner.plan_fft_forward(height);
        let row_inverse = planner.plan_fft_inverse(width);
        let col_inverse = planner.plan_fft_inverse(height);

        let scratch_len = [&row_forward, &col_forward, &row_inverse, &col_inverse]
            .iter()
            .map(|plan| plan.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);

        Self {
            height,
            width,
            row_forward,
            col_forward,
            row_inverse,
            col_inverse,
            line: vec![Complex64::new(0.0, 0.0); height.max(width)],
            scratch: vec![Complex64::new(0.0, 0.0); scratch_len],
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// In-place forward transform: rows, then columns.
    pub fn forward(&mut self, data: &mut Array2<Complex64>) {
        debug_assert_eq!(data.dim(), self.dim());
        let (row, col) = (Arc::clone(&self.row_forward), Arc::clone(&self.col_forward));
        self.process_lanes(data, Axis(1), row.as_ref());
        self.process_lanes(data, Axis(0), col.as_ref());
    }

    /// In-place inverse transform, unnormalized (scaled by `height * width`).
    pub fn inverse(&mut self, data: &mut Array2<Complex64>) {
        debug_assert_eq!(data.dim(), self.dim());
        let (row, col) = (Arc::clone(&self.row_inverse), Arc::clone(&self.col_inverse));
        self.process_lanes(data, Axis(0), col.as_ref());
        self.process_lanes(data, Axis(1), row.as_ref());
    }

    /// Transform every 1D lane of `data` running along `axis`.
    fn process_lanes(&mut self, data: &mut Array2<Complex64>, axis: Axis, plan: &dyn Fft<f64>) {
        let n = data.len_of(axis);
        let line = &mut self.line[..n];
        for mut lane in data.lanes_mut(axis) {
            for (dst, src) in line.iter_mut().zip(lane.iter()) {
                *dst = *src;
            }
            plan.process_with_scratch(line, &mut self.scratch);
            for (dst, src) in lane.iter_mut().zip(line.iter()) {
                *dst = *src;
            }
        }
    }
}

/// Copy a real grid into a complex buffer with zero imaginary part.
pub fn load_real(src: &Array2<f64>, dst: &mut Array2<Complex64>) {
    for (d, &s) in dst.iter_mut().zip(src.iter()) {
        *d = Complex64::new(s, 0.0);
    }
}

/// Sum of `weights * re(data)` over the grid.
pub fn real_dot(weights: &Array2<f64>, data: &Array2<Complex64>) -> f64 {
    weights
        .iter()
        .zip(data.iter())
        .map(|(&w, c)| w * c.re)
        .sum()
}
