//! Inter-subject variability of cortical surface maps.
//!
//! Per-subject maps (curvature or eccentricity) are binarized inside a
//! composite ROI mask, compared pairwise with a symmetrized weighted Jaccard
//! index, and grouped by spectral clustering on the resulting affinity
//! matrix. Cluster-mean maps and a block-ordered similarity matrix are the
//! outputs.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod report;

pub use error::{AnalysisError, Result};
