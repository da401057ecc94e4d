use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::Args;
use focuslock_core::config::{EstimatorConfig, FocusLockConfig, RefineConfig};
use focuslock_core::{FocusOffset, FrameShape, OffsetEstimator, RefineStatus};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;
use rayon::prelude::*;

use super::EstimatorArgs;
use crate::frames::load_gray16;
use crate::summary::status_name;

#[derive(Args)]
pub struct TrackArgs {
    /// Reference image every frame is compared against
    pub reference: PathBuf,

    /// Frames to track
    #[arg(required = true)]
    pub frames: Vec<PathBuf>,

    #[command(flatten)]
    pub estimator: EstimatorArgs,
}

struct TrackRow {
    offset: FocusOffset,
    magnitude: f64,
    status: RefineStatus,
}

pub fn run(args: &TrackArgs, config: &FocusLockConfig) -> Result<()> {
    let reference = load_gray16(&args.reference)?;
    let (height, width) = reference.dim();
    let shape = FrameShape::new(height, width);
    let settings = args.estimator.resolve(config);
    settings.validate(shape)?;

    let total = args.frames.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Tracking [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let rows = track_frames(&reference, &args.frames, &settings, &config.refine, &pb);
    pb.finish();

    let rows = rows.into_iter().collect::<Result<Vec<_>>>()?;

    println!("\nOffsets against {} (raw pixels):", args.reference.display());
    println!(
        "{:>5}  {:>10}  {:>10}  {:>10}  {:<14}  File",
        "Frame", "dy", "dx", "Magnitude", "Status"
    );
    println!("{}", "-".repeat(64));

    for (i, (row, path)) in rows.iter().zip(&args.frames).enumerate() {
        println!(
            "{:>5}  {:>+10.4}  {:>+10.4}  {:>10.4}  {:<14}  {}",
            i,
            row.offset.dy,
            row.offset.dx,
            row.magnitude,
            status_name(row.status),
            path.display()
        );
    }

    let failed = rows
        .iter()
        .filter(|r| r.status != RefineStatus::Converged)
        .count();
    if failed > 0 {
        println!("\n{failed} of {total} frames did not converge");
    }

    Ok(())
}

/// Estimate every frame against `reference`, advancing `pb` once per frame
/// whether or not it succeeds.
fn track_frames(
    reference: &Array2<u16>,
    frames: &[PathBuf],
    settings: &EstimatorConfig,
    refine: &RefineConfig,
    pb: &ProgressBar,
) -> Vec<Result<TrackRow>> {
    let (height, width) = reference.dim();
    let shape = FrameShape::new(height, width);

    // One estimator per worker; plans and buffers are reused across frames.
    frames
        .par_iter()
        .map_init(
            || OffsetEstimator::from_config(shape, settings),
            |estimator, path| -> Result<TrackRow> {
                pb.inc(1);
                let estimator = estimator.as_mut().map_err(|e| anyhow!("{e}"))?;
                track_frame(estimator, reference, path, settings, refine)
            },
        )
        .collect()
}

fn track_frame(
    estimator: &mut OffsetEstimator,
    reference: &Array2<u16>,
    path: &Path,
    settings: &EstimatorConfig,
    refine: &RefineConfig,
) -> Result<TrackRow> {
    let frame = load_gray16(path)?;
    if frame.dim() != reference.dim() {
        bail!(
            "{} is {:?}, reference is {:?}",
            path.display(),
            frame.dim(),
            reference.dim()
        );
    }
    let refinement = estimator.find_offset(
        &reference.view(),
        &frame.view(),
        settings.background,
        settings.background,
        refine,
    )?;
    Ok(TrackRow {
        offset: refinement.pixel_offset(settings.downsample),
        magnitude: estimator.magnitude(),
        status: refinement.status,
    })
}
