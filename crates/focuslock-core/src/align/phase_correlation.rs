//! Phase-correlation offset estimator for the focus lock.
//!
//! Both frames are rebinned into the top-left quadrant of a grid twice the
//! binned size, so the FFT product computes a linear rather than circular
//! correlation. The coarse offset is the integer peak of that correlation.
//! Sub-pixel refinement then minimizes
//!
//! ```text
//! cost(d) = -sum(reference * shift(target, d)) / (grid_h * grid_w)
//! ```
//!
//! with Newton steps whose gradient and Hessian come from the Fourier shift
//! theorem. Offsets are `position(image1) - position(image2)` in grid pixels;
//! the peak index is converted with `offset = index - origin`, without any
//! extra `+1`.

use ndarray::{Array2, ArrayView2, Zip};
use num_complex::Complex64;
use num_traits::AsPrimitive;
use tracing::{debug, trace, warn};

use crate::config::{EstimatorConfig, RefineConfig};
use crate::error::Result;
use crate::fft::{load_real, real_dot, Fft2d};
use crate::frame::{split_packed, FocusOffset, FrameShape};

use super::fourier_shift::FourierShift;
use super::rebin::{flip_quadrant, rebin_into};
use super::subpixel::{solve_symmetric_2x2, RefineStatus, Refinement};

/// Internal buffer selector for [`OffsetEstimator::debug_plane`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugPlane {
    /// Rebinned, zero-padded reference image.
    Reference,
    /// Real part of the shared transform workspace.
    Workspace,
    ShiftedReal,
    ShiftedImag,
    TargetReal,
    TargetImag,
}

pub struct OffsetEstimator {
    shape: FrameShape,
    downsample: usize,
    /// Rebinned extents, `(rows, cols)`.
    binned: (usize, usize),
    /// Grid index of zero displacement, `(row, col)`.
    origin: (usize, usize),
    fft: Fft2d,
    rebinned: Array2<f64>,
    flipped: Array2<f64>,
    reference: Array2<f64>,
    reference_spectrum: Array2<Complex64>,
    target_spectrum: Array2<Complex64>,
    workspace: Array2<Complex64>,
    shift: FourierShift,
    coarse: FocusOffset,
    offset: FocusOffset,
    magnitude: f64,
    cost: f64,
    gradient: [f64; 2],
    hessian: [f64; 4],
}

impl OffsetEstimator {
    /// Allocate buffers and transform plans for `height x width` frames.
    ///
    /// Fails when `downsample` is zero or does not divide both dimensions.
    pub fn new(height: usize, width: usize, downsample: usize) -> Result<Self> {
        let shape = FrameShape::new(height, width);
        EstimatorConfig {
            downsample,
            ..Default::default()
        }
        .validate(shape)?;

        let binned = (height / downsample, width / downsample);
        let grid = (2 * binned.0, 2 * binned.1);
        let origin = (binned.0 - 1, binned.1 - 1);
        debug!(
            height,
            width,
            downsample,
            grid_h = grid.0,
            grid_w = grid.1,
            "Offset estimator initialized"
        );

        Ok(Self {
            shape,
            downsample,
            binned,
            origin,
            fft: Fft2d::new(grid.0, grid.1),
            rebinned: Array2::zeros(grid),
            flipped: Array2::zeros(grid),
            reference: Array2::zeros(grid),
            reference_spectrum: Array2::zeros(grid),
            target_spectrum: Array2::zeros(grid),
            workspace: Array2::zeros(grid),
            shift: FourierShift::new(grid.0, grid.1),
            coarse: FocusOffset::default(),
            offset: FocusOffset::default(),
            magnitude: 0.0,
            cost: 0.0,
            gradient: [0.0; 2],
            hessian: [0.0; 4],
        })
    }

    pub fn from_config(shape: FrameShape, config: &EstimatorConfig) -> Result<Self> {
        Self::new(shape.height, shape.width, config.downsample)
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    pub fn downsample(&self) -> usize {
        self.downsample
    }

    /// Padded working grid size, `(rows, cols)`.
    pub fn grid_dim(&self) -> (usize, usize) {
        self.fft.dim()
    }

    pub fn origin(&self) -> (usize, usize) {
        self.origin
    }

    /// Rebin one raw frame into the working grid and return it.
    pub fn rebin<T>(&mut self, image: &ArrayView2<T>, background: f64) -> Result<&Array2<f64>>
    where
        T: AsPrimitive<f64>,
    {
        self.shape.check(image)?;
        rebin_into(image, background, self.downsample, &mut self.rebinned);
        Ok(&self.rebinned)
    }

    /// Load a new reference/target pair and compute the coarse offset.
    ///
    /// Accepts any pixel type convertible to `f64` (`u16`, `f32`, `f64`, ...).
    /// Returns the integer-pixel offset, also available from [`offset`](Self::offset).
    pub fn load_image_pair<T>(
        &mut self,
        image1: &ArrayView2<T>,
        image2: &ArrayView2<T>,
        background1: f64,
        background2: f64,
    ) -> Result<FocusOffset>
    where
        T: AsPrimitive<f64>,
    {
        self.shape.check(image1)?;
        self.shape.check(image2)?;

        // Reference: keep the real-space copy and its spectrum.
        rebin_into(image1, background1, self.downsample, &mut self.rebinned);
        self.reference.assign(&self.rebinned);
        load_real(&self.reference, &mut self.workspace);
        self.fft.forward(&mut self.workspace);
        self.reference_spectrum.assign(&self.workspace);

        // Target, reversed along both axes so the spectral product correlates.
        rebin_into(image2, background2, self.downsample, &mut self.rebinned);
        self.flipped.fill(0.0);
        flip_quadrant(&self.rebinned, self.binned.0, self.binned.1, &mut self.flipped);
        load_real(&self.flipped, &mut self.workspace);
        self.fft.forward(&mut self.workspace);

        Zip::from(&mut self.workspace)
            .and(&self.reference_spectrum)
            .for_each(|w, &r| *w *= r);
        self.fft.inverse(&mut self.workspace);

        let (peak_row, peak_col, peak) = find_peak(&self.workspace);
        let (grid_h, grid_w) = self.grid_dim();
        self.coarse = FocusOffset::new(
            peak_row as f64 - self.origin.0 as f64,
            peak_col as f64 - self.origin.1 as f64,
        );
        self.offset = self.coarse;
        self.magnitude = peak / (grid_h * grid_w) as f64;

        // Unflipped target spectrum for the shift theorem.
        load_real(&self.rebinned, &mut self.workspace);
        self.fft.forward(&mut self.workspace);
        self.target_spectrum.assign(&self.workspace);
        self.shift.invalidate();

        debug!(
            dy = self.coarse.dy,
            dx = self.coarse.dx,
            magnitude = self.magnitude,
            "Coarse offset"
        );
        Ok(self.coarse)
    }

    /// Load a pair packed back to back in one `2 * height x width` buffer.
    pub fn load_packed_pair<T>(&mut self, combined: &ArrayView2<T>, background: f64) -> Result<FocusOffset>
    where
        T: AsPrimitive<f64>,
    {
        let (image1, image2) = split_packed(combined.view(), self.shape)?;
        self.load_image_pair(&image1, &image2, background, background)
    }

    /// Load a pair and refine its offset in one call.
    pub fn find_offset<T>(
        &mut self,
        image1: &ArrayView2<T>,
        image2: &ArrayView2<T>,
        background1: f64,
        background2: f64,
        config: &RefineConfig,
    ) -> Result<Refinement>
    where
        T: AsPrimitive<f64>,
    {
        self.load_image_pair(image1, image2, background1, background2)?;
        Ok(self.minimize(config.step_tolerance, config.max_iterations))
    }

    /// Newton refinement starting from the coarse offset.
    ///
    /// Each iteration solves `H * step = g` and subtracts the step; it stops
    /// once `|step|^2 < step_tolerance^2`. No damping or line search is
    /// applied, so a singular Hessian or a non-converging sequence is
    /// reported through the returned status.
    pub fn minimize(&mut self, step_tolerance: f64, max_iterations: usize) -> Refinement {
        let mut offset = self.coarse;
        let tolerance_sqr = step_tolerance * step_tolerance;

        for iteration in 1..=max_iterations {
            let gradient = self.gradient(offset);
            let hessian = self.hessian(offset);

            let Some(step) = solve_symmetric_2x2(&hessian, &gradient) else {
                warn!(iteration, dy = offset.dy, dx = offset.dx, "Hessian is singular");
                return self.finish(offset, RefineStatus::NotSolvable, iteration);
            };

            let step = FocusOffset::new(step[0], step[1]);
            offset.dy -= step.dy;
            offset.dx -= step.dx;
            trace!(iteration, dy = offset.dy, dx = offset.dx, step = step.norm_sqr().sqrt());

            if step.norm_sqr() < tolerance_sqr {
                return self.finish(offset, RefineStatus::Converged, iteration);
            }
        }

        warn!(max_iterations, dy = offset.dy, dx = offset.dx, "Refinement did not converge");
        self.finish(offset, RefineStatus::MaxIterationsExceeded, max_iterations)
    }

    fn finish(&mut self, offset: FocusOffset, status: RefineStatus, iterations: usize) -> Refinement {
        self.offset = offset;
        self.cost(offset);
        debug!(?status, iterations, dy = offset.dy, dx = offset.dx, "Refinement finished");
        Refinement {
            offset,
            status,
            iterations,
        }
    }

    /// Negative normalized correlation of the reference with the target
    /// shifted by `offset`.
    pub fn cost(&mut self, offset: FocusOffset) -> f64 {
        self.shift.update(&self.target_spectrum, offset);
        self.workspace.assign(self.shift.shifted());
        self.cost = self.project();
        self.cost
    }

    /// Analytic `[d/dy, d/dx]` of [`cost`](Self::cost).
    pub fn gradient(&mut self, offset: FocusOffset) -> [f64; 2] {
        self.shift.update(&self.target_spectrum, offset);
        let dy = self.derivative(|wy, _| Complex64::new(0.0, -wy));
        let dx = self.derivative(|_, wx| Complex64::new(0.0, -wx));
        self.gradient = [dy, dx];
        self.gradient
    }

    /// Analytic Hessian of [`cost`](Self::cost), row-major `[yy, yx, xy, xx]`.
    ///
    /// The cross term is computed once and mirrored.
    pub fn hessian(&mut self, offset: FocusOffset) -> [f64; 4] {
        self.shift.update(&self.target_spectrum, offset);
        let yy = self.derivative(|wy, _| Complex64::new(-wy * wy, 0.0));
        let xx = self.derivative(|_, wx| Complex64::new(-wx * wx, 0.0));
        let xy = self.derivative(|wy, wx| Complex64::new(-wy * wx, 0.0));
        self.hessian = [yy, xy, xy, xx];
        self.hessian
    }

    /// Cost of the shifted spectrum scaled per bin by `factor(w_y, w_x)`.
    fn derivative<F>(&mut self, factor: F) -> f64
    where
        F: Fn(f64, f64) -> Complex64,
    {
        let freq_y = self.shift.freq_y();
        let freq_x = self.shift.freq_x();
        Zip::indexed(&mut self.workspace)
            .and(self.shift.shifted())
            .for_each(|(row, col), w, &s| *w = s * factor(freq_y[row], freq_x[col]));
        self.project()
    }

    /// Inverse-transform the workspace and dot its real part with the reference.
    fn project(&mut self) -> f64 {
        self.fft.inverse(&mut self.workspace);
        let (grid_h, grid_w) = self.grid_dim();
        -real_dot(&self.reference, &self.workspace) / (grid_h * grid_w) as f64
    }

    /// Current offset estimate in grid pixels: coarse after loading,
    /// refined after [`minimize`](Self::minimize).
    pub fn offset(&self) -> FocusOffset {
        self.offset
    }

    /// Current offset estimate in raw camera pixels.
    pub fn pixel_offset(&self) -> FocusOffset {
        self.offset.scaled(self.downsample as f64)
    }

    pub fn coarse_offset(&self) -> FocusOffset {
        self.coarse
    }

    /// Peak of the coarse correlation, normalized by the grid size.
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn last_cost(&self) -> f64 {
        self.cost
    }

    pub fn last_gradient(&self) -> [f64; 2] {
        self.gradient
    }

    pub fn last_hessian(&self) -> [f64; 4] {
        self.hessian
    }

    /// Number of times the shifted target spectrum has been recomputed.
    pub fn shift_updates(&self) -> usize {
        self.shift.updates()
    }

    /// Copy of an internal buffer, for inspection.
    pub fn debug_plane(&self, plane: DebugPlane) -> Array2<f64> {
        match plane {
            DebugPlane::Reference => self.reference.clone(),
            DebugPlane::Workspace => self.workspace.mapv(|c| c.re),
            DebugPlane::ShiftedReal => self.shift.shifted().mapv(|c| c.re),
            DebugPlane::ShiftedImag => self.shift.shifted().mapv(|c| c.im),
            DebugPlane::TargetReal => self.target_spectrum.mapv(|c| c.re),
            DebugPlane::TargetImag => self.target_spectrum.mapv(|c| c.im),
        }
    }
}

/// First strict maximum of the real part, in row-major scan order.
fn find_peak(data: &Array2<Complex64>) -> (usize, usize, f64) {
    let mut best_row = 0;
    let mut best_col = 0;
    let mut best_val = f64::NEG_INFINITY;

    for ((row, col), value) in data.indexed_iter() {
        if value.re > best_val {
            best_val = value.re;
            best_row = row;
            best_col = col;
        }
    }

    (best_row, best_col, best_val)
}
