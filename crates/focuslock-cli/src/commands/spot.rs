use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use focuslock_core::config::{FocusLockConfig, SpotFitConfig};
use focuslock_core::quality::Quantity;
use focuslock_core::GaussianCorrelator;

use crate::frames::load_gray16;
use crate::summary::print_spot_report;

#[derive(Args)]
pub struct SpotArgs {
    /// Image containing the spot
    pub image: PathBuf,

    /// Starting displacement along the image rows axis
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub x: f64,

    /// Starting displacement along the image columns axis
    #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
    pub y: f64,

    /// Gaussian width (overrides the settings file)
    #[arg(long)]
    pub sigma: Option<f64>,
}

pub fn run(args: &SpotArgs, config: &FocusLockConfig) -> Result<()> {
    let image = load_gray16(&args.image)?;
    let (size_x, size_y) = image.dim();
    let fit_config = SpotFitConfig {
        sigma: args.sigma.unwrap_or(config.spot_fit.sigma),
        ..config.spot_fit.clone()
    };

    let mut correlator = GaussianCorrelator::new(fit_config.sigma, size_x, size_y)?;
    correlator.set_reference(&image.view())?;

    println!("Correlation at x {:+.4}, y {:+.4}:", args.x, args.y);
    for quantity in Quantity::ALL {
        let value = correlator.evaluate(quantity, args.x, args.y);
        println!("  {:<6}{:>16.6}", format!("{quantity:?}"), value);
    }

    let fit = correlator.maximize(args.x, args.y, &fit_config);
    print_spot_report(correlator.sigma(), correlator.center(), (args.x, args.y), &fit);

    let stats = correlator.stats();
    tracing::debug!(checks = stats.checks, updates = stats.updates, "Correlator cache");
    Ok(())
}
