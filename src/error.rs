//! Error type shared by every stage of the analysis.
//!
//! All variants abort the run; nothing here is retried or recovered.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::measure::Measure;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("mask dimension mismatch for {what}: expected {expected}, got {actual}")]
    MaskDimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("cluster {cluster} has no members")]
    EmptyCluster { cluster: usize },

    #[error("failed to fetch {measure} map for subject {subject}: {source}")]
    DataFetch {
        subject: String,
        measure: Measure,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("composite mask selects no vertices")]
    EmptySelection,

    #[error("subject {subject}: value {value} at retained vertex {vertex} matches no binarization rule")]
    UnbinnedValue {
        subject: String,
        vertex: usize,
        value: f64,
    },

    #[error("cannot form {k} clusters from {n} subjects")]
    InvalidClusterCount { k: usize, n: usize },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {message}")]
    Npz { path: PathBuf, message: String },
}

impl AnalysisError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn npz(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Npz {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
