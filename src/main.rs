// Entry point: loads config, runs the clustering analysis and renders heatmaps.
use std::error::Error;

use clap::Parser;
use tracing::{info, Level};

use cortexvar::cli::Args;
use cortexvar::config::AppConfig;
use cortexvar::pipeline;
use cortexvar::report::{block_edges, render_similarity_heatmap};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    let mut cfg = AppConfig::load_or_default(&args.config);
    if let Some(measure) = args.measure {
        cfg.analysis.measure = measure;
    }
    if let Some(hemisphere) = args.hemisphere {
        cfg.analysis.hemisphere = hemisphere;
    }
    if let Some(dir) = args.output.clone() {
        cfg.output.dir = dir;
    }
    if args.no_plots {
        cfg.output.plots = false;
    }
    if args.serial {
        cfg.analysis.parallel = false;
    }

    info!(
        measure = %cfg.analysis.measure,
        hemisphere = %cfg.analysis.hemisphere,
        clusters = cfg.analysis.n_clusters,
        seed = cfg.analysis.seed,
        "starting analysis"
    );
    let outcome = pipeline::run(&cfg)?;

    if cfg.output.plots {
        let tag = outcome.measure.short_tag();
        let raw_path = cfg.output.dir.join(format!("similarity_{tag}.png"));
        render_similarity_heatmap(
            &raw_path,
            &outcome.similarity,
            &format!("Weighted Jaccard similarity ({})", outcome.measure),
            &[],
        )?;
        let ordered_path = cfg.output.dir.join(format!("similarity_reordered_{tag}.png"));
        render_similarity_heatmap(
            &ordered_path,
            &outcome.reordered,
            &format!("Weighted Jaccard similarity by cluster ({})", outcome.measure),
            &block_edges(&outcome.assignment.sizes()),
        )?;
        info!(raw = %raw_path.display(), ordered = %ordered_path.display(), "heatmaps saved");
    }

    println!(
        "Clustered {} subjects into {} groups; sizes {:?}",
        outcome.subjects.len(),
        outcome.assignment.n_clusters(),
        outcome.assignment.sizes()
    );
    Ok(())
}
