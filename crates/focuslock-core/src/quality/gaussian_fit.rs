//! Correlation of a reference image with a translated 2D Gaussian.
//!
//! The template is separable, so a new position costs `size_x + size_y`
//! exponentials plus one outer product. Value and axis-aligned derivatives
//! are each computed lazily and cached until the position or the reference
//! image changes.
//!
//! Axis 0 of the reference is `x`, axis 1 is `y`. Pixel `i` along an axis of
//! length `n` sits at `i + 0.5 - n / 2`, so a query at `(0, 0)` centers the
//! Gaussian on the middle of the image.

use ndarray::{Array2, ArrayView2, Zip};
use num_traits::AsPrimitive;
use tracing::debug;

use crate::error::{FocusError, Result};

use super::cache::{CacheStats, Quantity, QuantityCache};

pub struct GaussianCorrelator {
    sigma: f64,
    /// `1 / sigma^2`
    inv_sigma_sq: f64,
    xi: Vec<f64>,
    yi: Vec<f64>,
    gx: Vec<f64>,
    gy: Vec<f64>,
    template: Array2<f64>,
    reference: Array2<f64>,
    cache: QuantityCache,
}

impl GaussianCorrelator {
    pub fn new(sigma: f64, size_x: usize, size_y: usize) -> Result<Self> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(FocusError::InvalidSigma(sigma));
        }
        if size_x == 0 || size_y == 0 {
            return Err(FocusError::InvalidDimensions {
                height: size_x,
                width: size_y,
            });
        }
        debug!(sigma, size_x, size_y, "Gaussian correlator initialized");

        Ok(Self {
            sigma,
            inv_sigma_sq: 1.0 / (sigma * sigma),
            xi: pixel_centers(size_x),
            yi: pixel_centers(size_y),
            gx: vec![0.0; size_x],
            gy: vec![0.0; size_y],
            template: Array2::zeros((size_x, size_y)),
            reference: Array2::zeros((size_x, size_y)),
            cache: QuantityCache::default(),
        })
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// `(size_x, size_y)`
    pub fn dim(&self) -> (usize, usize) {
        self.reference.dim()
    }

    /// Pixel coordinate of zero displacement, `(size_x / 2 - 0.5, size_y / 2 - 0.5)`.
    pub fn center(&self) -> (f64, f64) {
        let (sx, sy) = self.dim();
        (0.5 * sx as f64 - 0.5, 0.5 * sy as f64 - 0.5)
    }

    /// Replace the reference image. Cached values are dropped even if the
    /// next query repeats the last position.
    pub fn set_reference<T>(&mut self, image: &ArrayView2<T>) -> Result<()>
    where
        T: AsPrimitive<f64>,
    {
        if image.dim() != self.dim() {
            return Err(FocusError::ShapeMismatch {
                expected: self.dim(),
                actual: image.dim(),
            });
        }
        Zip::from(&mut self.reference)
            .and(image)
            .for_each(|r, &v| *r = v.as_());
        self.cache.invalidate();
        Ok(())
    }

    pub fn reference(&self) -> &Array2<f64> {
        &self.reference
    }

    /// Correlation of the reference with the Gaussian displaced by `(x, y)`.
    pub fn value(&mut self, x: f64, y: f64) -> f64 {
        self.evaluate(Quantity::Value, x, y)
    }

    pub fn dx(&mut self, x: f64, y: f64) -> f64 {
        self.evaluate(Quantity::Dx, x, y)
    }

    pub fn dy(&mut self, x: f64, y: f64) -> f64 {
        self.evaluate(Quantity::Dy, x, y)
    }

    pub fn ddx(&mut self, x: f64, y: f64) -> f64 {
        self.evaluate(Quantity::Ddx, x, y)
    }

    pub fn ddy(&mut self, x: f64, y: f64) -> f64 {
        self.evaluate(Quantity::Ddy, x, y)
    }

    /// The Gaussian template at `(x, y)`.
    pub fn template(&mut self, x: f64, y: f64) -> &Array2<f64> {
        self.cache.check(x, y);
        self.render_template();
        &self.template
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn evaluate(&mut self, quantity: Quantity, x: f64, y: f64) -> f64 {
        self.cache.check(x, y);
        if let Some(value) = self.cache.get(quantity) {
            return value;
        }

        self.render_template();
        let (x, y) = self.cache.position();
        let s = self.inv_sigma_sq;
        let value = match quantity {
            Quantity::Value => self.weighted_sum(|_| 1.0, |_| 1.0),
            Quantity::Dx => self.weighted_sum(|xi| (xi - x) * s, |_| 1.0),
            Quantity::Dy => self.weighted_sum(|_| 1.0, |yi| (yi - y) * s),
            Quantity::Ddx => self.weighted_sum(
                |xi| {
                    let t = (x - xi) * s;
                    t * t - s
                },
                |_| 1.0,
            ),
            Quantity::Ddy => self.weighted_sum(
                |_| 1.0,
                |yi| {
                    let t = (y - yi) * s;
                    t * t - s
                },
            ),
        };
        self.cache.store(quantity, value);
        value
    }

    /// Rebuild the template at the cached position if it is stale.
    fn render_template(&mut self) {
        if self.cache.is_template_fresh() {
            return;
        }
        let (x, y) = self.cache.position();
        let half_s = 0.5 * self.inv_sigma_sq;
        for (g, &xi) in self.gx.iter_mut().zip(&self.xi) {
            let d = xi - x;
            *g = (-half_s * d * d).exp();
        }
        for (g, &yi) in self.gy.iter_mut().zip(&self.yi) {
            let d = yi - y;
            *g = (-half_s * d * d).exp();
        }

        let gx = &self.gx;
        let gy = &self.gy;
        Zip::indexed(&mut self.template).for_each(|(i, k), t| *t = gx[i] * gy[k]);
        self.cache.mark_template_fresh();
    }

    /// `sum(template * reference * wx(x_i) * wy(y_k))`
    fn weighted_sum<FX, FY>(&self, wx: FX, wy: FY) -> f64
    where
        FX: Fn(f64) -> f64,
        FY: Fn(f64) -> f64,
    {
        let y_weights: Vec<f64> = self.yi.iter().map(|&yi| wy(yi)).collect();
        self.template
            .outer_iter()
            .zip(self.reference.outer_iter())
            .zip(&self.xi)
            .map(|((t_row, r_row), &xi)| {
                let row: f64 = t_row
                    .iter()
                    .zip(r_row.iter())
                    .zip(&y_weights)
                    .map(|((&t, &r), &w)| t * r * w)
                    .sum();
                row * wx(xi)
            })
            .sum()
    }
}

/// Centered pixel coordinates `i + 0.5 - n / 2` for an axis of length `n`.
pub fn pixel_centers(n: usize) -> Vec<f64> {
    let start = -0.5 * n as f64;
    (0..n).map(|i| start + i as f64 + 0.5).collect()
}
