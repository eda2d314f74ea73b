//! Per-subject surface maps.

use std::path::{Path, PathBuf};

use crate::core::mask::Mask;
use crate::core::measure::{Hemisphere, Measure};
use crate::io::npz;

pub type FetchError = Box<dyn std::error::Error + Send + Sync>;

/// Accessor returning one subject's scalar map for `measure`, restricted to
/// the active vertices of `roi` (full-hemisphere space) in order.
pub trait SurfaceSource {
    fn fetch_subject_map(
        &self,
        measure: Measure,
        subject: &str,
        roi: &Mask,
        hemisphere: Hemisphere,
    ) -> Result<Vec<f64>, FetchError>;
}

/// Maps stored as `<root>/<subject>/<measure>_<hemisphere>.npz`, each holding a
/// full-hemisphere array under the key `list`.
#[derive(Clone, Debug)]
pub struct NpzSurfaceSource {
    root: PathBuf,
}

impl NpzSurfaceSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn map_path(&self, measure: Measure, subject: &str, hemisphere: Hemisphere) -> PathBuf {
        self.root
            .join(subject)
            .join(format!("{}_{}.npz", measure.name(), hemisphere.tag()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SurfaceSource for NpzSurfaceSource {
    fn fetch_subject_map(
        &self,
        measure: Measure,
        subject: &str,
        roi: &Mask,
        hemisphere: Hemisphere,
    ) -> Result<Vec<f64>, FetchError> {
        let path = self.map_path(measure, subject, hemisphere);
        let full = npz::read_vector(&path, npz::DEFAULT_KEY)?;
        Ok(roi.select(&full, "surface map vs hemisphere vertex count")?)
    }
}
