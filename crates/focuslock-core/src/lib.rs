pub mod align;
pub mod config;
pub mod consts;
pub mod error;
pub mod fft;
pub mod frame;
pub mod quality;

pub use align::{DebugPlane, OffsetEstimator, Refinement, RefineStatus};
pub use error::{FocusError, Result};
pub use frame::{FocusOffset, FrameShape};
pub use quality::{CacheStats, GaussianCorrelator, SpotFit};
