use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use focuslock_core::config::FocusLockConfig;
use focuslock_core::{FrameShape, OffsetEstimator};

use super::EstimatorArgs;
use crate::frames::load_gray16;
use crate::summary::print_offset_report;

#[derive(Args)]
pub struct OffsetArgs {
    /// First (reference) image
    pub image1: PathBuf,

    /// Second image
    pub image2: PathBuf,

    #[command(flatten)]
    pub estimator: EstimatorArgs,

    /// Fail unless the refinement converges
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: &OffsetArgs, config: &FocusLockConfig) -> Result<()> {
    let image1 = load_gray16(&args.image1)?;
    let image2 = load_gray16(&args.image2)?;
    if image1.dim() != image2.dim() {
        bail!(
            "Image sizes differ: {:?} vs {:?}",
            image1.dim(),
            image2.dim()
        );
    }

    let (height, width) = image1.dim();
    let settings = args.estimator.resolve(config);
    let mut estimator = OffsetEstimator::from_config(FrameShape::new(height, width), &settings)?;
    let refinement = estimator.find_offset(
        &image1.view(),
        &image2.view(),
        settings.background,
        settings.background,
        &config.refine,
    )?;

    print_offset_report(&estimator, &refinement);

    if args.strict {
        refinement.into_result()?;
    }
    Ok(())
}
