mod fourier_shift;
pub mod phase_correlation;
pub mod rebin;
pub mod subpixel;

pub use fourier_shift::angular_frequencies;
pub use phase_correlation::{DebugPlane, OffsetEstimator};
pub use subpixel::{solve_symmetric_2x2, RefineStatus, Refinement};
