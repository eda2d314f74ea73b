//! Region-definition masks per hemisphere.
//!
//! A region archive holds one full-hemisphere 0/1 array per hemisphere
//! under the keys `LH` and `RH`.

use std::path::Path;

use crate::core::mask::Mask;
use crate::core::measure::Hemisphere;
use crate::error::Result;
use crate::io::npz;

#[derive(Clone, Debug)]
pub struct RegionMasks {
    pub left: Mask,
    pub right: Mask,
}

impl RegionMasks {
    pub fn mask(&self, hemisphere: Hemisphere) -> &Mask {
        match hemisphere {
            Hemisphere::Left => &self.left,
            Hemisphere::Right => &self.right,
        }
    }

    /// Vertex indices covered by the region in `hemisphere`.
    pub fn index(&self, hemisphere: Hemisphere) -> Vec<usize> {
        self.mask(hemisphere).indices()
    }
}

pub fn load_region_masks(path: &Path) -> Result<RegionMasks> {
    let left = npz::read_vector(path, Hemisphere::Left.tag())?;
    let right = npz::read_vector(path, Hemisphere::Right.tag())?;
    Ok(RegionMasks {
        left: Mask::from_numeric(&left),
        right: Mask::from_numeric(&right),
    })
}

/// Eccentricity-band mask over ROI-restricted vertices, reshaped to 1-D.
pub fn load_eccentricity_mask(path: &Path) -> Result<Mask> {
    let values = npz::read_vector(path, npz::DEFAULT_KEY)?;
    Ok(Mask::from_numeric(&values))
}
