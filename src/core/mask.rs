//! core/mask.rs — Boolean vertex masks and their composition.
//!
//! Masks live in a vertex space: either the full hemisphere or the
//! ROI-restricted space (one entry per active ROI vertex). Every binary
//! operation checks lengths and fails with `MaskDimensionMismatch`.

use crate::error::{AnalysisError, Result};

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Mask {
    bits: Vec<bool>,
}

impl Mask {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Nonzero entries are members.
    pub fn from_numeric(values: &[f64]) -> Self {
        Self {
            bits: values.iter().map(|&v| v != 0.0).collect(),
        }
    }

    pub fn full(len: usize) -> Self {
        Self {
            bits: vec![true; len],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        self.bits[idx]
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Number of member vertices.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Positions of member vertices, ascending.
    pub fn indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect()
    }

    pub fn and(&self, other: &Mask, what: &'static str) -> Result<Mask> {
        check_len(what, self.len(), other.len())?;
        Ok(Mask {
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(&a, &b)| a && b)
                .collect(),
        })
    }

    /// Keep the entries of `values` at member positions, in order.
    pub fn select<T: Copy>(&self, values: &[T], what: &'static str) -> Result<Vec<T>> {
        check_len(what, self.len(), values.len())?;
        Ok(self
            .bits
            .iter()
            .zip(values)
            .filter_map(|(&b, &v)| b.then_some(v))
            .collect())
    }

    /// Re-index this mask into the space of `within`'s member vertices.
    pub fn restrict_to(&self, within: &Mask, what: &'static str) -> Result<Mask> {
        Ok(Mask {
            bits: within.select(&self.bits, what)?,
        })
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(AnalysisError::MaskDimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Masks of one hemisphere feeding the composite selection.
#[derive(Clone, Debug)]
pub struct MaskSet {
    /// Early visual cortex superset, full hemisphere space.
    pub roi: Mask,
    /// Dorsal early visual sub-region, full hemisphere space.
    pub subregion: Mask,
    /// Eccentricity band, ROI-restricted space.
    pub eccentricity: Mask,
}

/// Composite selection in ROI-restricted space: ROI ∧ sub-region, re-indexed
/// by the ROI, then ∧ eccentricity band.
pub fn compose(masks: &MaskSet) -> Result<Mask> {
    let both = masks.roi.and(&masks.subregion, "ROI vs sub-region mask")?;
    let in_roi = both.restrict_to(&masks.roi, "ROI vs sub-region mask")?;
    in_roi.and(&masks.eccentricity, "eccentricity mask vs ROI vertex count")
}

/// Sub-region membership in ROI-restricted space, eccentricity band ignored.
pub fn subregion_in_roi(masks: &MaskSet) -> Result<Mask> {
    masks
        .subregion
        .restrict_to(&masks.roi, "ROI vs sub-region mask")
}
