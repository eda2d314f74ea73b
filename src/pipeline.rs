//! End-to-end run: inputs -> features -> similarity -> clusters -> artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array1, Array2};
use tracing::info;

use crate::config::{AnalysisConfig, AppConfig, OutputConfig};
use crate::core::aggregate::{self, ClusterSeparation};
use crate::core::features::{FeatureExtractor, FeatureSet};
use crate::core::mask::MaskSet;
use crate::core::measure::Measure;
use crate::core::similarity::{similarity_matrix, SimilarityMatrix};
use crate::core::spectral::{ClusterAssignment, SpectralClustering};
use crate::error::{AnalysisError, Result};
use crate::io::npz::{self, DEFAULT_KEY};
use crate::io::regions::{load_eccentricity_mask, load_region_masks};
use crate::io::subjects::load_subject_list;
use crate::io::surface::{NpzSurfaceSource, SurfaceSource};

/// Subject list and the masks of the configured hemisphere.
#[derive(Clone, Debug)]
pub struct AnalysisInputs {
    pub subjects: Vec<String>,
    pub masks: MaskSet,
}

pub fn load_inputs(cfg: &AppConfig) -> Result<AnalysisInputs> {
    let hemisphere = cfg.analysis.hemisphere;
    let subjects = load_subject_list(&cfg.input.subject_list)?;
    let roi = load_region_masks(&cfg.input.roi_masks)?;
    let subregion = load_region_masks(&cfg.input.subregion_masks)?;
    let eccentricity = load_eccentricity_mask(&cfg.input.eccentricity_mask_path(hemisphere))?;
    info!(subjects = subjects.len(), %hemisphere, "inputs loaded");
    Ok(AnalysisInputs {
        subjects,
        masks: MaskSet {
            roi: roi.mask(hemisphere).clone(),
            subregion: subregion.mask(hemisphere).clone(),
            eccentricity,
        },
    })
}

#[derive(Clone, Debug)]
pub struct AnalysisOutcome {
    pub measure: Measure,
    pub subjects: Vec<String>,
    pub features: FeatureSet,
    pub similarity: SimilarityMatrix,
    pub assignment: ClusterAssignment,
    pub ordering: Vec<usize>,
    pub reordered: SimilarityMatrix,
    pub cluster_means: Vec<Vec<f64>>,
    pub block_labels: Array2<f64>,
    pub separation: ClusterSeparation,
}

pub fn run_analysis<S: SurfaceSource + ?Sized>(
    analysis: &AnalysisConfig,
    inputs: &AnalysisInputs,
    source: &S,
) -> Result<AnalysisOutcome> {
    let extractor = FeatureExtractor::new(
        analysis.measure,
        analysis.hemisphere,
        &inputs.masks,
        analysis.original_masking(),
    )?;
    let features = extractor.extract_all(source, &inputs.subjects)?;

    let similarity = similarity_matrix(&features.binarized, analysis.parallel)?;
    let assignment = SpectralClustering::new(analysis.spectral_params()).fit_predict(&similarity)?;

    let cluster_means = aggregate::cluster_means(&features.original, &assignment)?;
    let ordering = aggregate::cluster_ordering(&assignment);
    let reordered = aggregate::reordered_matrix(&similarity, &ordering);
    let block_labels = aggregate::block_labels(&assignment);
    let separation = ClusterSeparation::compute(&similarity, &block_labels);
    info!(
        mean_within = ?separation.mean_within,
        sd_within = ?separation.sd_within,
        mean_between = ?separation.mean_between,
        sd_between = ?separation.sd_between,
        "cluster separation"
    );

    Ok(AnalysisOutcome {
        measure: analysis.measure,
        subjects: inputs.subjects.clone(),
        features,
        similarity,
        assignment,
        ordering,
        reordered,
        cluster_means,
        block_labels,
        separation,
    })
}

pub fn cluster_mean_path(dir: &Path, cluster: usize, measure: Measure) -> PathBuf {
    dir.join(format!(
        "cluster_{cluster}_{}_weightedJaccard_eccentricityMask.npz",
        measure.map_tag()
    ))
}

pub fn assignment_path(dir: &Path, measure: Measure) -> PathBuf {
    dir.join(format!("clusters_individualIndeces_{}.npz", measure.short_tag()))
}

fn tagged_path(dir: &Path, stem: &str, measure: Measure) -> PathBuf {
    dir.join(format!("{stem}_{}.npz", measure.short_tag()))
}

/// Persist cluster means and the assignment vector, plus the optional
/// matrix and block-label exports. Returns the written paths.
pub fn write_artifacts(outcome: &AnalysisOutcome, output: &OutputConfig) -> Result<Vec<PathBuf>> {
    let dir = output.dir.as_path();
    fs::create_dir_all(dir).map_err(|e| AnalysisError::io(dir, e))?;
    let measure = outcome.measure;
    let mut written = Vec::new();

    for (k, mean) in outcome.cluster_means.iter().enumerate() {
        let path = cluster_mean_path(dir, k, measure);
        npz::write_array(&path, DEFAULT_KEY, &Array1::from(mean.clone()))?;
        written.push(path);
    }

    let labels: Array1<i64> = outcome
        .assignment
        .labels()
        .iter()
        .map(|&l| l as i64)
        .collect();
    let path = assignment_path(dir, measure);
    npz::write_array(&path, DEFAULT_KEY, &labels)?;
    written.push(path);

    if output.export_matrices {
        let path = tagged_path(dir, "similarity", measure);
        npz::write_array(&path, DEFAULT_KEY, &outcome.similarity.to_array())?;
        written.push(path);

        let path = tagged_path(dir, "similarity_reordered", measure);
        npz::write_array(&path, DEFAULT_KEY, &outcome.reordered.to_array())?;
        written.push(path);

        let ordering: Array1<i64> = outcome.ordering.iter().map(|&i| i as i64).collect();
        let path = tagged_path(dir, "ordering", measure);
        npz::write_array(&path, DEFAULT_KEY, &ordering)?;
        written.push(path);
    }

    if output.export_block_labels {
        let path = tagged_path(dir, "block_labels", measure);
        npz::write_array(&path, DEFAULT_KEY, &outcome.block_labels)?;
        written.push(path);
    }

    info!(files = written.len(), dir = %dir.display(), "artifacts written");
    Ok(written)
}

/// Load inputs from disk, run the analysis and write its artifacts.
pub fn run(cfg: &AppConfig) -> Result<AnalysisOutcome> {
    let inputs = load_inputs(cfg)?;
    let source = NpzSurfaceSource::new(&cfg.input.surface_dir);
    let outcome = run_analysis(&cfg.analysis, &inputs, &source)?;
    write_artifacts(&outcome, &cfg.output)?;
    Ok(outcome)
}
