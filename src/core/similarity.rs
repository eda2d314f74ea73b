//! core/similarity.rs — N×N subject similarity from binarized features.
//!
//! Entry (i, j) is the mean of the weighted Jaccard in both directions.
//! Both directions are evaluated for every cell; rows are independent, so
//! the parallel path fills disjoint rows on the rayon pool.

use rayon::prelude::*;
use tracing::info;

use crate::core::jaccard::weighted_jaccard;
use crate::core::measure::Code;
use crate::error::{AnalysisError, Result};

/// Dense row-major square matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    data: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Self {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for row in rows {
            assert_eq!(row.len(), n, "matrix rows must have length {n}");
            data.extend_from_slice(row);
        }
        Self { n, data }
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        self.data[i * self.n + j] = v;
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.n).map(|i| self.get(i, i)).collect()
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| (i + 1..self.n).all(|j| self.get(i, j) == self.get(j, i)))
    }

    /// Reorder rows and columns by `order` (new position -> old index).
    pub fn permuted(&self, order: &[usize]) -> Self {
        assert_eq!(order.len(), self.n, "ordering length must equal matrix size");
        let mut out = Self::zeros(self.n);
        for (r, &i) in order.iter().enumerate() {
            for (c, &j) in order.iter().enumerate() {
                out.set(r, c, self.get(i, j));
            }
        }
        out
    }

    pub fn to_array(&self) -> ndarray::Array2<f64> {
        ndarray::Array2::from_shape_fn((self.n, self.n), |(i, j)| self.get(i, j))
    }
}

fn fill_row(row: &mut [f64], i: usize, vectors: &[Vec<Code>]) {
    let a = &vectors[i];
    for (j, cell) in row.iter_mut().enumerate() {
        let b = &vectors[j];
        let forward = weighted_jaccard(a, b);
        let backward = weighted_jaccard(b, a);
        *cell = (forward + backward) / 2.0;
    }
}

/// Compute the symmetrized weighted-Jaccard matrix of `vectors`.
pub fn similarity_matrix(vectors: &[Vec<Code>], parallel: bool) -> Result<SimilarityMatrix> {
    let n = vectors.len();
    if let Some(first) = vectors.first() {
        let len = first.len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != len) {
            return Err(AnalysisError::MaskDimensionMismatch {
                what: "binarized feature vector length",
                expected: len,
                actual: bad.len(),
            });
        }
    }

    let mut matrix = SimilarityMatrix::zeros(n);
    if n == 0 {
        return Ok(matrix);
    }
    if parallel {
        matrix
            .data
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| fill_row(row, i, vectors));
    } else {
        matrix
            .data
            .chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| fill_row(row, i, vectors));
    }
    info!(
        subjects = n,
        vector_len = vectors[0].len(),
        parallel,
        "similarity matrix computed"
    );
    Ok(matrix)
}
