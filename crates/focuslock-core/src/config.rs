use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_SPOT_MAX_ITERATIONS, DEFAULT_SPOT_SIGMA,
    DEFAULT_SPOT_TOLERANCE, DEFAULT_STEP_TOLERANCE,
};
use crate::error::{FocusError, Result};
use crate::frame::FrameShape;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FocusLockConfig {
    #[serde(default)]
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub refine: RefineConfig,
    #[serde(default)]
    pub spot_fit: SpotFitConfig,
}

/// Phase-correlation estimator setup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Integer rebinning factor; must divide both frame dimensions.
    pub downsample: usize,
    /// Scalar background subtracted from every raw pixel before rebinning.
    pub background: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            downsample: 1,
            background: 0.0,
        }
    }
}

impl EstimatorConfig {
    /// Check that a frame of the given shape can be rebinned by `downsample`.
    pub fn validate(&self, shape: FrameShape) -> Result<()> {
        if self.downsample == 0 {
            return Err(FocusError::InvalidDownsample {
                downsample: self.downsample,
            });
        }
        if shape.height == 0 || shape.width == 0 {
            return Err(FocusError::InvalidDimensions {
                height: shape.height,
                width: shape.width,
            });
        }
        if shape.height % self.downsample != 0 || shape.width % self.downsample != 0 {
            return Err(FocusError::NotDivisible {
                height: shape.height,
                width: shape.width,
                downsample: self.downsample,
            });
        }
        Ok(())
    }
}

/// Newton refinement stopping rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineConfig {
    /// Stop once the step length drops below this (grid pixels).
    pub step_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            step_tolerance: DEFAULT_STEP_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Gaussian template correlator and its maximizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotFitConfig {
    pub sigma: f64,
    pub max_iterations: usize,
    /// Relative change of the objective at which the maximizer stops.
    pub tolerance: f64,
}

impl Default for SpotFitConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SPOT_SIGMA,
            max_iterations: DEFAULT_SPOT_MAX_ITERATIONS,
            tolerance: DEFAULT_SPOT_TOLERANCE,
        }
    }
}
