use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use focuslock_core::config::FocusLockConfig;

use crate::summary::print_config_summary;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show a readable summary instead of TOML
    #[arg(long)]
    pub summary: bool,
}

/// Print or save the effective settings as TOML.
pub fn run(args: &ConfigArgs, config: &FocusLockConfig) -> Result<()> {
    if args.summary {
        print_config_summary(config);
        return Ok(());
    }

    let toml_str = toml::to_string_pretty(config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
