pub mod config;
pub mod offset;
pub mod packed;
pub mod spot;
pub mod track;

use clap::Args;
use focuslock_core::config::{EstimatorConfig, FocusLockConfig};

/// Estimator overrides shared by the offset commands.
#[derive(Args, Clone, Debug, Default)]
pub struct EstimatorArgs {
    /// Rebinning factor (overrides the settings file)
    #[arg(short, long)]
    pub downsample: Option<usize>,

    /// Background level subtracted from every pixel (overrides the settings file)
    #[arg(short, long)]
    pub background: Option<f64>,
}

impl EstimatorArgs {
    pub fn resolve(&self, config: &FocusLockConfig) -> EstimatorConfig {
        EstimatorConfig {
            downsample: self.downsample.unwrap_or(config.estimator.downsample),
            background: self.background.unwrap_or(config.estimator.background),
        }
    }
}
