//! Undamped Newton refinement of the coarse correlation peak.

use crate::error::{FocusError, Result};
use crate::frame::FocusOffset;

/// Final state of a Newton refinement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefineStatus {
    Converged,
    MaxIterationsExceeded,
    NotSolvable,
}

/// Result of [`OffsetEstimator::minimize`](super::OffsetEstimator::minimize).
///
/// `offset` is the last iterate in grid pixels, whatever the status; callers
/// decide whether a non-converged estimate is usable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Refinement {
    pub offset: FocusOffset,
    pub status: RefineStatus,
    pub iterations: usize,
}

impl Refinement {
    pub fn is_converged(&self) -> bool {
        self.status == RefineStatus::Converged
    }

    /// The offset expressed in raw (un-binned) camera pixels.
    pub fn pixel_offset(&self, downsample: usize) -> FocusOffset {
        self.offset.scaled(downsample as f64)
    }

    pub fn into_result(self) -> Result<FocusOffset> {
        match self.status {
            RefineStatus::Converged => Ok(self.offset),
            RefineStatus::NotSolvable => Err(FocusError::NotSolvable),
            RefineStatus::MaxIterationsExceeded => Err(FocusError::MaxIterationsExceeded {
                iterations: self.iterations,
                dy: self.offset.dy,
                dx: self.offset.dx,
            }),
        }
    }
}

/// Solve `H * step = g` for a symmetric 2x2 `H` stored row-major.
///
/// Only the upper off-diagonal `H[0][1]` is read. Returns `None` when the
/// leading diagonal term or the Schur complement is exactly zero, or when the
/// solution is not finite.
pub fn solve_symmetric_2x2(hessian: &[f64; 4], gradient: &[f64; 2]) -> Option<[f64; 2]> {
    let a = hessian[0];
    let b = hessian[1];
    let c = hessian[3];

    if a == 0.0 {
        return None;
    }
    let ratio = b / a;
    let schur = c - ratio * b;
    if schur == 0.0 {
        return None;
    }

    let s1 = (gradient[1] - ratio * gradient[0]) / schur;
    let s0 = (gradient[0] - b * s1) / a;

    if s0.is_finite() && s1.is_finite() {
        Some([s0, s1])
    } else {
        None
    }
}
