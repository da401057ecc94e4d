pub mod cache;
pub mod gaussian_fit;
pub mod levenberg;

pub use cache::{CacheStats, Quantity};
pub use gaussian_fit::GaussianCorrelator;
pub use levenberg::SpotFit;
