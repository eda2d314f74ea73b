//! core/aggregate.rs — Per-cluster means, block ordering and block labels.

use ndarray::Array2;

use crate::core::similarity::SimilarityMatrix;
use crate::core::spectral::ClusterAssignment;
use crate::error::{AnalysisError, Result};

/// Subject indices grouped by ascending label, original order kept inside
/// each group.
pub fn cluster_ordering(assignment: &ClusterAssignment) -> Vec<usize> {
    (0..assignment.n_clusters())
        .flat_map(|k| assignment.members(k))
        .collect()
}

/// Similarity matrix with rows and columns in cluster order.
pub fn reordered_matrix(matrix: &SimilarityMatrix, ordering: &[usize]) -> SimilarityMatrix {
    matrix.permuted(ordering)
}

/// Elementwise mean of the unbinarized vectors of each cluster's members.
///
/// An empty cluster is an error rather than a NaN map.
pub fn cluster_means(original: &[Vec<f64>], assignment: &ClusterAssignment) -> Result<Vec<Vec<f64>>> {
    if original.len() != assignment.len() {
        return Err(AnalysisError::MaskDimensionMismatch {
            what: "subject count vs cluster assignment",
            expected: assignment.len(),
            actual: original.len(),
        });
    }
    let dim = original.first().map_or(0, Vec::len);
    if let Some(bad) = original.iter().find(|v| v.len() != dim) {
        return Err(AnalysisError::MaskDimensionMismatch {
            what: "original feature vector length",
            expected: dim,
            actual: bad.len(),
        });
    }

    (0..assignment.n_clusters())
        .map(|k| {
            let members = assignment.members(k);
            if members.is_empty() {
                return Err(AnalysisError::EmptyCluster { cluster: k });
            }
            let mut mean = vec![0.0f64; dim];
            for &i in &members {
                for (m, &x) in mean.iter_mut().zip(&original[i]) {
                    *m += x;
                }
            }
            let count = members.len() as f64;
            mean.iter_mut().for_each(|m| *m /= count);
            Ok(mean)
        })
        .collect()
}

/// N×N pair labels: `k + 2` when both subjects are in cluster k, 1.0 otherwise.
pub fn block_labels(assignment: &ClusterAssignment) -> Array2<f64> {
    let labels = assignment.labels();
    let n = labels.len();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if labels[i] == labels[j] {
            (labels[i] + 2) as f64
        } else {
            1.0
        }
    })
}

/// Descriptive within/between-cluster similarity over the strict upper
/// triangle. `None` when a group has no pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ClusterSeparation {
    pub mean_within: Option<f64>,
    pub sd_within: Option<f64>,
    pub mean_between: Option<f64>,
    pub sd_between: Option<f64>,
}

impl ClusterSeparation {
    pub fn compute(matrix: &SimilarityMatrix, blocks: &Array2<f64>) -> Self {
        let n = matrix.n();
        let mut within = Vec::new();
        let mut between = Vec::new();
        for i in 0..n {
            for j in i + 1..n {
                if blocks[[i, j]] > 1.0 {
                    within.push(matrix.get(i, j));
                } else {
                    between.push(matrix.get(i, j));
                }
            }
        }
        let (mean_within, sd_within) = mean_sd(&within);
        let (mean_between, sd_between) = mean_sd(&between);
        Self {
            mean_within,
            sd_within,
            mean_between,
            sd_between,
        }
    }
}

/// Mean and population standard deviation.
fn mean_sd(values: &[f64]) -> (Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (Some(mean), Some(var.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assignment() -> ClusterAssignment {
        ClusterAssignment::new(vec![2, 0, 1, 0, 2, 1], 3)
    }

    #[test]
    fn ordering_groups_by_label_and_keeps_subject_order() {
        let order = cluster_ordering(&assignment());
        assert_eq!(order, vec![1, 3, 2, 5, 0, 4]);

        let mut sorted = order.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..6).collect::<Vec<_>>());
    }

    #[test]
    fn reordered_blocks_hold_the_same_values() {
        let a = assignment();
        let n = a.len();
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.01 * (i + j) as f64 }).collect())
            .collect();
        let m = SimilarityMatrix::from_rows(&rows);
        let order = cluster_ordering(&a);
        let r = reordered_matrix(&m, &order);

        let mut start = 0;
        for k in 0..a.n_clusters() {
            let members = a.members(k);
            let size = members.len();
            let mut original: Vec<f64> = members
                .iter()
                .flat_map(|&i| members.iter().map(move |&j| (i, j)))
                .map(|(i, j)| m.get(i, j))
                .collect();
            let mut block: Vec<f64> = (start..start + size)
                .flat_map(|r_i| (start..start + size).map(move |c| (r_i, c)))
                .map(|(i, j)| r.get(i, j))
                .collect();
            original.sort_by(f64::total_cmp);
            block.sort_by(f64::total_cmp);
            assert_eq!(original, block);
            start += size;
        }

        let mut all_orig = m.as_slice().to_vec();
        let mut all_reordered = r.as_slice().to_vec();
        all_orig.sort_by(f64::total_cmp);
        all_reordered.sort_by(f64::total_cmp);
        assert_eq!(all_orig, all_reordered);
    }

    #[test]
    fn means_use_member_vectors_only() {
        let original = vec![
            vec![1.0, 2.0],
            vec![3.0, 4.0],
            vec![5.0, 6.0],
            vec![7.0, 8.0],
            vec![9.0, 10.0],
            vec![11.0, 12.0],
        ];
        let means = cluster_means(&original, &assignment()).unwrap();
        assert_eq!(means.len(), 3);
        assert_relative_eq!(means[0][0], 5.0);
        assert_relative_eq!(means[0][1], 6.0);
        assert_relative_eq!(means[1][0], 8.0);
        assert_relative_eq!(means[2][1], 6.0);
    }

    #[test]
    fn empty_cluster_is_an_error() {
        let a = ClusterAssignment::new(vec![0, 0, 2], 3);
        let original = vec![vec![1.0], vec![2.0], vec![3.0]];
        assert!(matches!(
            cluster_means(&original, &a),
            Err(AnalysisError::EmptyCluster { cluster: 1 })
        ));
    }

    #[test]
    fn block_labels_mark_cluster_pairs() {
        let a = ClusterAssignment::new(vec![1, 0, 1], 2);
        let b = block_labels(&a);
        assert_eq!(b[[0, 2]], 3.0);
        assert_eq!(b[[2, 0]], 3.0);
        assert_eq!(b[[1, 1]], 2.0);
        assert_eq!(b[[0, 1]], 1.0);
    }

    #[test]
    fn separation_splits_upper_triangle() {
        let a = ClusterAssignment::new(vec![0, 0, 1], 2);
        let m = SimilarityMatrix::from_rows(&[
            vec![1.0, 0.8, 0.2],
            vec![0.8, 1.0, 0.4],
            vec![0.2, 0.4, 1.0],
        ]);
        let s = ClusterSeparation::compute(&m, &block_labels(&a));
        assert_relative_eq!(s.mean_within.unwrap(), 0.8);
        assert_relative_eq!(s.sd_within.unwrap(), 0.0);
        assert_relative_eq!(s.mean_between.unwrap(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(s.sd_between.unwrap(), 0.1, epsilon = 1e-12);

        let single = ClusterAssignment::new(vec![0, 0, 0], 1);
        let s = ClusterSeparation::compute(&m, &block_labels(&single));
        assert!(s.mean_between.is_none());
    }
}
