//! core/features.rs — Per-subject feature extraction.
//!
//! For each subject the raw ROI-restricted map is binarized over *all* ROI
//! vertices first and only then reduced to the composite mask. The
//! unbinarized copy kept for cluster means is masked separately according
//! to `OriginalMasking`.

use tracing::{debug, info};

use crate::core::mask::{self, Mask, MaskSet};
use crate::core::measure::{binarize, BinarizeRule, Code, Hemisphere, Measure, OriginalMasking};
use crate::error::{AnalysisError, Result};
use crate::io::surface::SurfaceSource;

#[derive(Clone, Debug, PartialEq)]
pub struct SubjectFeatures {
    pub binarized: Vec<Code>,
    pub original: Vec<f64>,
}

/// Feature vectors for all subjects, in subject-list order.
#[derive(Clone, Debug, Default)]
pub struct FeatureSet {
    pub binarized: Vec<Vec<Code>>,
    pub original: Vec<Vec<f64>>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.binarized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binarized.is_empty()
    }
}

pub struct FeatureExtractor<'a> {
    measure: Measure,
    hemisphere: Hemisphere,
    rules: &'static [BinarizeRule],
    roi: &'a Mask,
    composite: Mask,
    original_mask: Mask,
}

impl<'a> FeatureExtractor<'a> {
    pub fn new(
        measure: Measure,
        hemisphere: Hemisphere,
        masks: &'a MaskSet,
        original_masking: OriginalMasking,
    ) -> Result<Self> {
        let composite = mask::compose(masks)?;
        if composite.count() == 0 {
            return Err(AnalysisError::EmptySelection);
        }
        let original_mask = match original_masking {
            OriginalMasking::Composite => composite.clone(),
            OriginalMasking::SubRegion => mask::subregion_in_roi(masks)?,
        };
        info!(
            %measure,
            %hemisphere,
            roi_vertices = masks.roi.count(),
            selected_vertices = composite.count(),
            original_vertices = original_mask.count(),
            "composite mask ready"
        );
        Ok(Self {
            measure,
            hemisphere,
            rules: measure.rules(),
            roi: &masks.roi,
            composite,
            original_mask,
        })
    }

    pub fn composite(&self) -> &Mask {
        &self.composite
    }

    /// Apply the binarization and masking policy to one ROI-restricted map.
    pub fn features_from_map(&self, subject: &str, roi_values: &[f64]) -> Result<SubjectFeatures> {
        let original = self
            .original_mask
            .select(roi_values, "subject map vs ROI vertex count")?;

        let binned = binarize(self.rules, roi_values);
        let selected = self
            .composite
            .select(&binned, "subject map vs ROI vertex count")?;

        let retained = self.composite.indices();
        let binarized = selected
            .into_iter()
            .zip(retained)
            .map(|(code, vertex)| {
                code.ok_or_else(|| AnalysisError::UnbinnedValue {
                    subject: subject.to_string(),
                    vertex,
                    value: roi_values[vertex],
                })
            })
            .collect::<Result<Vec<Code>>>()?;

        Ok(SubjectFeatures {
            binarized,
            original,
        })
    }

    pub fn extract_subject<S: SurfaceSource + ?Sized>(
        &self,
        source: &S,
        subject: &str,
    ) -> Result<SubjectFeatures> {
        let values = source
            .fetch_subject_map(self.measure, subject, self.roi, self.hemisphere)
            .map_err(|source| AnalysisError::DataFetch {
                subject: subject.to_string(),
                measure: self.measure,
                source,
            })?;
        self.features_from_map(subject, &values)
    }

    pub fn extract_all<S: SurfaceSource + ?Sized>(
        &self,
        source: &S,
        subjects: &[String],
    ) -> Result<FeatureSet> {
        let mut set = FeatureSet {
            binarized: Vec::with_capacity(subjects.len()),
            original: Vec::with_capacity(subjects.len()),
        };
        for subject in subjects {
            let features = self.extract_subject(source, subject)?;
            debug!(
                subject = subject.as_str(),
                binarized_len = features.binarized.len(),
                original_len = features.original.len(),
                "extracted features"
            );
            set.binarized.push(features.binarized);
            set.original.push(features.original);
        }
        info!(subjects = set.len(), "feature extraction complete");
        Ok(set)
    }
}
