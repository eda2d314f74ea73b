use std::path::PathBuf;

use clap::Parser;

use crate::core::measure::{Hemisphere, Measure};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML (created with commented defaults if missing)
    #[arg(long, default_value = "cortexvar.toml")]
    pub config: PathBuf,

    /// Surface measure to cluster: curvature | eccentricity (overrides config)
    #[arg(long)]
    pub measure: Option<Measure>,

    /// Hemisphere to process: LH | RH (overrides config)
    #[arg(long)]
    pub hemisphere: Option<Hemisphere>,

    /// Output directory (overrides config)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Skip heatmap rendering
    #[arg(long, default_value_t = false)]
    pub no_plots: bool,

    /// Compute the similarity matrix on a single thread
    #[arg(long, default_value_t = false)]
    pub serial: bool,

    /// Log at debug level
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
