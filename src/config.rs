use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::measure::{Hemisphere, Measure, OriginalMasking};
use crate::core::spectral::SpectralParams;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InputConfig {
    #[serde(default = "InputConfig::default_subject_list")]
    pub subject_list: PathBuf,
    /// Early visual cortex superset, keys `LH`/`RH`.
    #[serde(default = "InputConfig::default_roi_masks")]
    pub roi_masks: PathBuf,
    /// Dorsal early visual cortex, keys `LH`/`RH`.
    #[serde(default = "InputConfig::default_subregion_masks")]
    pub subregion_masks: PathBuf,
    /// `{hemisphere}` is replaced with `LH` or `RH`.
    #[serde(default = "InputConfig::default_eccentricity_mask")]
    pub eccentricity_mask: String,
    #[serde(default = "InputConfig::default_surface_dir")]
    pub surface_dir: PathBuf,
}

impl InputConfig {
    fn default_subject_list() -> PathBuf {
        PathBuf::from("list_subj")
    }
    fn default_roi_masks() -> PathBuf {
        PathBuf::from("masks/early_visual_cortex.npz")
    }
    fn default_subregion_masks() -> PathBuf {
        PathBuf::from("masks/dorsal_early_visual_cortex.npz")
    }
    fn default_eccentricity_mask() -> String {
        "masks/MaskEccentricity_above1below8ecc_{hemisphere}.npz".to_string()
    }
    fn default_surface_dir() -> PathBuf {
        PathBuf::from("surface")
    }

    pub fn eccentricity_mask_path(&self, hemisphere: Hemisphere) -> PathBuf {
        PathBuf::from(
            self.eccentricity_mask
                .replace("{hemisphere}", hemisphere.tag()),
        )
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            subject_list: Self::default_subject_list(),
            roi_masks: Self::default_roi_masks(),
            subregion_masks: Self::default_subregion_masks(),
            eccentricity_mask: Self::default_eccentricity_mask(),
            surface_dir: Self::default_surface_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default = "AnalysisConfig::default_measure")]
    pub measure: Measure,
    #[serde(default = "AnalysisConfig::default_hemisphere")]
    pub hemisphere: Hemisphere,
    #[serde(default = "AnalysisConfig::default_n_clusters")]
    pub n_clusters: usize,
    #[serde(default = "AnalysisConfig::default_seed")]
    pub seed: u64,
    #[serde(default = "AnalysisConfig::default_kmeans_n_init")]
    pub kmeans_n_init: usize,
    #[serde(default = "AnalysisConfig::default_kmeans_max_iter")]
    pub kmeans_max_iter: usize,
    #[serde(default = "AnalysisConfig::default_kmeans_tol")]
    pub kmeans_tol: f64,
    #[serde(default = "AnalysisConfig::default_parallel")]
    pub parallel: bool,
    /// Overrides the measure's own masking of the unbinarized maps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_masking: Option<OriginalMasking>,
}

impl AnalysisConfig {
    fn default_measure() -> Measure {
        Measure::Eccentricity
    }
    fn default_hemisphere() -> Hemisphere {
        Hemisphere::Left
    }
    fn default_n_clusters() -> usize {
        6
    }
    fn default_seed() -> u64 {
        123
    }
    fn default_kmeans_n_init() -> usize {
        10
    }
    fn default_kmeans_max_iter() -> usize {
        300
    }
    fn default_kmeans_tol() -> f64 {
        1e-4
    }
    fn default_parallel() -> bool {
        true
    }

    pub fn original_masking(&self) -> OriginalMasking {
        self.original_masking
            .unwrap_or_else(|| self.measure.default_original_masking())
    }

    pub fn spectral_params(&self) -> SpectralParams {
        SpectralParams {
            n_clusters: self.n_clusters,
            seed: self.seed,
            n_init: self.kmeans_n_init,
            max_iter: self.kmeans_max_iter,
            tol: self.kmeans_tol,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            measure: Self::default_measure(),
            hemisphere: Self::default_hemisphere(),
            n_clusters: Self::default_n_clusters(),
            seed: Self::default_seed(),
            kmeans_n_init: Self::default_kmeans_n_init(),
            kmeans_max_iter: Self::default_kmeans_max_iter(),
            kmeans_tol: Self::default_kmeans_tol(),
            parallel: Self::default_parallel(),
            original_masking: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: PathBuf,
    #[serde(default = "OutputConfig::default_plots")]
    pub plots: bool,
    #[serde(default = "OutputConfig::default_export_block_labels")]
    pub export_block_labels: bool,
    #[serde(default = "OutputConfig::default_export_matrices")]
    pub export_matrices: bool,
}

impl OutputConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("output")
    }
    fn default_plots() -> bool {
        true
    }
    fn default_export_block_labels() -> bool {
        false
    }
    fn default_export_matrices() -> bool {
        true
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            plots: Self::default_plots(),
            export_block_labels: Self::default_export_block_labels(),
            export_matrices: Self::default_export_matrices(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// Prefix every value line with `# `, keeping section headers live.
    fn commented(text: &str) -> String {
        let mut out = String::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                out.push('\n');
            } else if trimmed.starts_with('[') && trimmed.ends_with(']') {
                out.push_str(line);
                out.push('\n');
            } else {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match toml::from_str(&contents) {
                    Ok(cfg) => return cfg,
                    Err(err) => {
                        warn!("Failed to parse config {}: {err}. Using defaults.", path.display());
                    }
                },
                Err(err) => {
                    warn!("Failed to read config {}: {err}. Using defaults.", path.display());
                }
            }
            return Self::default();
        }

        // File does not exist: write defaults and return them.
        let default_cfg = Self::default();
        match toml::to_string_pretty(&default_cfg) {
            Ok(text) => {
                if let Err(err) = fs::write(path, Self::commented(&text)) {
                    warn!("Failed to write default config to {}: {err}", path.display());
                }
            }
            Err(err) => warn!("Failed to serialize default config: {err}; continuing with defaults"),
        }
        default_cfg
    }
}
