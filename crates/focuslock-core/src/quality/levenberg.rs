//! Levenberg-Marquardt search for the displacement that maximizes the
//! Gaussian correlation.
//!
//! Only the axis-aligned second derivatives are available, so the damped
//! Hessian is diagonal and each axis takes an independent Newton step.

use tracing::{debug, trace};

use crate::config::SpotFitConfig;
use crate::consts::{LM_INITIAL_LAMBDA, LM_LAMBDA_DOWN, LM_LAMBDA_UP};

use super::gaussian_fit::GaussianCorrelator;

/// Outcome of [`GaussianCorrelator::maximize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotFit {
    /// Displacement of the Gaussian from the image center.
    pub x: f64,
    pub y: f64,
    /// Correlation at `(x, y)`.
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl GaussianCorrelator {
    /// Maximize the correlation starting from `(x, y)`.
    ///
    /// A step is accepted only if it increases the correlation; rejected steps
    /// raise the damping and retry from the same point. Stops once the relative
    /// change of an accepted step falls below `config.tolerance`.
    pub fn maximize(&mut self, x: f64, y: f64, config: &SpotFitConfig) -> SpotFit {
        let mut lambda = LM_INITIAL_LAMBDA;
        let (mut x, mut y) = (x, y);
        let mut current = self.value(x, y);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < config.max_iterations {
            iterations += 1;

            let hx = self.ddx(x, y).abs() * (1.0 + lambda);
            let hy = self.ddy(x, y).abs() * (1.0 + lambda);
            let step_x = self.dx(x, y) / hx;
            let step_y = self.dy(x, y) / hy;
            if !(step_x.is_finite() && step_y.is_finite()) {
                lambda *= LM_LAMBDA_UP;
                continue;
            }

            let (nx, ny) = (x + step_x, y + step_y);
            let candidate = self.value(nx, ny);
            if candidate.is_nan() || candidate < current {
                lambda *= LM_LAMBDA_UP;
                continue;
            }

            lambda *= LM_LAMBDA_DOWN;
            let previous = current;
            current = candidate;
            x = nx;
            y = ny;
            trace!(iterations, x, y, value = current, lambda);

            if (previous - current).abs() <= config.tolerance * current.abs() {
                converged = true;
                break;
            }
        }

        debug!(x, y, value = current, iterations, converged, "Spot fit finished");
        SpotFit {
            x,
            y,
            value: current,
            iterations,
            converged,
        }
    }
}
