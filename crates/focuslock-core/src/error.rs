use thiserror::Error;

#[derive(Error, Debug)]
pub enum FocusError {
    #[error("Invalid downsample factor: {downsample}")]
    InvalidDownsample { downsample: usize },

    #[error("Frame dimensions {height}x{width} are not divisible by downsample factor {downsample}")]
    NotDivisible {
        height: usize,
        width: usize,
        downsample: usize,
    },

    #[error("Invalid image dimensions: {height}x{width}")]
    InvalidDimensions { height: usize, width: usize },

    #[error("Image shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid Gaussian sigma: {0}")]
    InvalidSigma(f64),

    #[error("Newton step is not solvable (singular Hessian)")]
    NotSolvable,

    #[error("Refinement did not converge after {iterations} iterations (last offset {dy}, {dx})")]
    MaxIterationsExceeded { iterations: usize, dy: f64, dx: f64 },
}

pub type Result<T> = std::result::Result<T, FocusError>;
