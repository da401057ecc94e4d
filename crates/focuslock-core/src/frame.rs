use ndarray::{ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{FocusError, Result};

/// Raw camera frame extents, rows first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameShape {
    pub height: usize,
    pub width: usize,
}

impl FrameShape {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// Shape of a buffer holding two frames stacked along the row axis.
    pub fn packed(&self) -> Self {
        Self {
            height: 2 * self.height,
            width: self.width,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn check<T>(&self, image: &ArrayView2<T>) -> Result<()> {
        if image.dim() != self.dim() {
            return Err(FocusError::ShapeMismatch {
                expected: self.dim(),
                actual: image.dim(),
            });
        }
        Ok(())
    }
}

/// Displacement between two images, slow axis (`dy`) first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FocusOffset {
    pub dy: f64,
    pub dx: f64,
}

impl FocusOffset {
    pub fn new(dy: f64, dx: f64) -> Self {
        Self { dy, dx }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            dy: self.dy * factor,
            dx: self.dx * factor,
        }
    }

    pub fn norm_sqr(&self) -> f64 {
        self.dy * self.dy + self.dx * self.dx
    }

    pub fn is_finite(&self) -> bool {
        self.dy.is_finite() && self.dx.is_finite()
    }
}

/// Split a packed buffer into its two stacked frames.
///
/// Rows `[0, h)` hold the first image and rows `[h, 2h)` the second.
pub fn split_packed<T>(
    combined: ArrayView2<'_, T>,
    shape: FrameShape,
) -> Result<(ArrayView2<'_, T>, ArrayView2<'_, T>)> {
    shape.packed().check(&combined)?;
    Ok(combined.split_at(Axis(0), shape.height))
}
