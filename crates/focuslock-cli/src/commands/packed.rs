use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use focuslock_core::config::FocusLockConfig;
use focuslock_core::{FrameShape, OffsetEstimator};

use super::EstimatorArgs;
use crate::frames::read_packed;
use crate::summary::print_offset_report;

#[derive(Args)]
pub struct PackedArgs {
    /// Raw little-endian u16 buffer with both frames stacked row-wise
    pub file: PathBuf,

    /// Height of one frame
    #[arg(long)]
    pub height: usize,

    /// Width of one frame
    #[arg(long)]
    pub width: usize,

    #[command(flatten)]
    pub estimator: EstimatorArgs,
}

pub fn run(args: &PackedArgs, config: &FocusLockConfig) -> Result<()> {
    let shape = FrameShape::new(args.height, args.width);
    let settings = args.estimator.resolve(config);
    let mut estimator = OffsetEstimator::from_config(shape, &settings)?;

    let combined = read_packed(&args.file, shape)?;
    estimator.load_packed_pair(&combined.view(), settings.background)?;
    let refinement = estimator.minimize(config.refine.step_tolerance, config.refine.max_iterations);

    print_offset_report(&estimator, &refinement);
    Ok(())
}
