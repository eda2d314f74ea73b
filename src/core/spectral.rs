//! core/spectral.rs — Spectral clustering on a precomputed affinity matrix.
//!
//! Algorithm:
//! 1. Drop self-loops and form the symmetric normalized Laplacian
//!    L = I - D^(-1/2) A D^(-1/2) (isolated vertices get a zero row).
//! 2. Full eigendecomposition; keep the K eigenvectors with the smallest
//!    eigenvalues, divide each row by sqrt(degree), and flip each vector's
//!    sign so its largest-magnitude entry is positive.
//! 3. k-means on the embedded rows: greedy k-means++ seeding, Lloyd
//!    iterations, `n_init` restarts drawn from one seeded RNG, lowest
//!    inertia kept.

use nalgebra::{DMatrix, SymmetricEigen};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::core::similarity::SimilarityMatrix;
use crate::error::{AnalysisError, Result};

/// Subject index -> cluster label in `0..k`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterAssignment {
    labels: Vec<usize>,
    k: usize,
}

impl ClusterAssignment {
    pub fn new(labels: Vec<usize>, k: usize) -> Self {
        debug_assert!(labels.iter().all(|&l| l < k), "label out of range");
        Self { labels, k }
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn n_clusters(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Subject indices with label `cluster`, ascending.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, &l)| (l == cluster).then_some(i))
            .collect()
    }

    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }
}

#[derive(Clone, Debug)]
pub struct SpectralParams {
    pub n_clusters: usize,
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for SpectralParams {
    fn default() -> Self {
        Self {
            n_clusters: 6,
            seed: 123,
            n_init: 10,
            max_iter: 300,
            tol: 1e-4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SpectralClustering {
    params: SpectralParams,
}

impl SpectralClustering {
    pub fn new(params: SpectralParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SpectralParams {
        &self.params
    }

    /// Partition the vertices of `affinity` into `n_clusters` groups.
    ///
    /// `affinity` must be symmetric and non-negative.
    pub fn fit_predict(&self, affinity: &SimilarityMatrix) -> Result<ClusterAssignment> {
        let n = affinity.n();
        let k = self.params.n_clusters;
        if k == 0 || k > n {
            return Err(AnalysisError::InvalidClusterCount { k, n });
        }

        if !is_connected(affinity) {
            warn!("affinity graph is not fully connected; spectral embedding may be degenerate");
        }

        let embedding = spectral_embedding(affinity, k);
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let fit = kmeans(&embedding, k, &self.params, &mut rng);

        let assignment = ClusterAssignment::new(fit.labels, k);
        info!(
            clusters = k,
            inertia = fit.inertia,
            sizes = ?assignment.sizes(),
            "spectral clustering done"
        );
        Ok(assignment)
    }
}

fn is_connected(affinity: &SimilarityMatrix) -> bool {
    let n = affinity.n();
    if n == 0 {
        return true;
    }
    let mut seen = vec![false; n];
    let mut stack = vec![0usize];
    seen[0] = true;
    while let Some(i) = stack.pop() {
        for j in 0..n {
            if !seen[j] && i != j && affinity.get(i, j) > 0.0 {
                seen[j] = true;
                stack.push(j);
            }
        }
    }
    seen.into_iter().all(|s| s)
}

/// Rows of the returned vec are the embedded points (length `k` each).
pub fn spectral_embedding(affinity: &SimilarityMatrix, k: usize) -> Vec<Vec<f64>> {
    let n = affinity.n();

    let degree: Vec<f64> = (0..n)
        .map(|i| (0..n).filter(|&j| j != i).map(|j| affinity.get(i, j)).sum())
        .collect();
    let isolated: Vec<bool> = degree.iter().map(|&d| d == 0.0).collect();
    let scale: Vec<f64> = degree
        .iter()
        .zip(&isolated)
        .map(|(&d, &iso)| if iso { 1.0 } else { d.sqrt() })
        .collect();

    let laplacian = DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            if isolated[i] {
                0.0
            } else {
                1.0
            }
        } else {
            -affinity.get(i, j) / (scale[i] * scale[j])
        }
    });

    let eigen = SymmetricEigen::new(laplacian);

    // nalgebra does not order eigenvalues
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
    debug!(
        smallest = ?order.iter().take(k + 1).map(|&i| eigen.eigenvalues[i]).collect::<Vec<_>>(),
        "laplacian spectrum"
    );

    let mut embedding = vec![vec![0.0f64; k]; n];
    for (c, &col) in order.iter().take(k).enumerate() {
        let v = eigen.eigenvectors.column(col);
        let mut peak = 0.0f64;
        for i in 0..n {
            let x = v[i] / scale[i];
            embedding[i][c] = x;
            if x.abs() > peak.abs() {
                peak = x;
            }
        }
        if peak < 0.0 {
            for row in embedding.iter_mut() {
                row[c] = -row[c];
            }
        }
    }
    embedding
}

#[derive(Clone, Debug)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub centers: Vec<Vec<f64>>,
    pub inertia: f64,
    pub n_iter: usize,
}

#[inline]
fn sq_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the nearest center; ties go to the lowest index.
fn nearest(point: &[f64], centers: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, center) in centers.iter().enumerate() {
        let d = sq_dist(point, center);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

/// Run k-means `params.n_init` times and keep the lowest-inertia fit.
pub fn kmeans(points: &[Vec<f64>], k: usize, params: &SpectralParams, rng: &mut StdRng) -> KMeansFit {
    let tol = scaled_tolerance(points, params.tol);
    let mut best = lloyd(points, kmeans_plus_plus(points, k, rng), params.max_iter, tol);
    debug!(run = 0, inertia = best.inertia, n_iter = best.n_iter, "k-means restart");
    for run in 1..params.n_init.max(1) {
        let fit = lloyd(points, kmeans_plus_plus(points, k, rng), params.max_iter, tol);
        debug!(run, inertia = fit.inertia, n_iter = fit.n_iter, "k-means restart");
        if fit.inertia < best.inertia {
            best = fit;
        }
    }
    best
}

/// `tol` relative to the mean per-dimension variance of the data.
fn scaled_tolerance(points: &[Vec<f64>], tol: f64) -> f64 {
    let n = points.len();
    let Some(dims) = points.first().map(Vec::len) else {
        return 0.0;
    };
    if n == 0 || dims == 0 {
        return 0.0;
    }
    let mut total_var = 0.0;
    for d in 0..dims {
        let mean = points.iter().map(|p| p[d]).sum::<f64>() / n as f64;
        total_var += points.iter().map(|p| (p[d] - mean).powi(2)).sum::<f64>() / n as f64;
    }
    tol * total_var / dims as f64
}

/// Greedy k-means++: each new center is the best of 2 + ln(k) candidates
/// sampled proportionally to squared distance.
fn kmeans_plus_plus(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = points.len();
    let n_trials = 2 + (k as f64).ln() as usize;
    let mut centers = Vec::with_capacity(k);

    let first = rng.random_range(0..n);
    centers.push(points[first].clone());
    let mut closest: Vec<f64> = points.iter().map(|p| sq_dist(p, &points[first])).collect();
    let mut potential: f64 = closest.iter().sum();

    while centers.len() < k {
        let mut best_candidate = None;
        let mut best_potential = f64::INFINITY;
        let mut best_closest = Vec::new();

        for _ in 0..n_trials {
            let candidate = if potential > 0.0 {
                sample_weighted(&closest, potential, rng)
            } else {
                rng.random_range(0..n)
            };
            let updated: Vec<f64> = points
                .iter()
                .zip(&closest)
                .map(|(p, &c)| c.min(sq_dist(p, &points[candidate])))
                .collect();
            let pot: f64 = updated.iter().sum();
            if pot < best_potential {
                best_potential = pot;
                best_candidate = Some(candidate);
                best_closest = updated;
            }
        }

        let chosen = best_candidate.unwrap_or(0);
        centers.push(points[chosen].clone());
        closest = best_closest;
        potential = best_potential;
    }
    centers
}

fn sample_weighted(weights: &[f64], total: f64, rng: &mut StdRng) -> usize {
    let target = rng.random::<f64>() * total;
    let mut acc = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        acc += w;
        if acc > target {
            return i;
        }
    }
    weights.len() - 1
}

fn assign(points: &[Vec<f64>], centers: &[Vec<f64>], labels: &mut [usize], dists: &mut [f64]) {
    for (i, p) in points.iter().enumerate() {
        let (c, d) = nearest(p, centers);
        labels[i] = c;
        dists[i] = d;
    }
}

fn lloyd(points: &[Vec<f64>], mut centers: Vec<Vec<f64>>, max_iter: usize, tol: f64) -> KMeansFit {
    let n = points.len();
    let k = centers.len();
    let dims = centers.first().map_or(0, Vec::len);
    let mut labels = vec![0usize; n];
    let mut dists = vec![0.0f64; n];
    assign(points, &centers, &mut labels, &mut dists);

    let mut n_iter = 0;
    for _ in 0..max_iter {
        n_iter += 1;

        let mut sums = vec![vec![0.0f64; dims]; k];
        let mut counts = vec![0usize; k];
        for (p, &l) in points.iter().zip(&labels) {
            counts[l] += 1;
            for (s, x) in sums[l].iter_mut().zip(p) {
                *s += x;
            }
        }
        relocate_empty(points, &mut labels, &mut dists, &mut sums, &mut counts);

        let mut shift = 0.0;
        for c in 0..k {
            if counts[c] == 0 {
                continue;
            }
            let new_center: Vec<f64> = sums[c].iter().map(|s| s / counts[c] as f64).collect();
            shift += sq_dist(&new_center, &centers[c]);
            centers[c] = new_center;
        }

        let previous = labels.clone();
        assign(points, &centers, &mut labels, &mut dists);
        if labels == previous || shift <= tol {
            break;
        }
    }

    let inertia = dists.iter().sum();
    KMeansFit {
        labels,
        centers,
        inertia,
        n_iter,
    }
}

/// Give each empty cluster the point farthest from its current center.
fn relocate_empty(
    points: &[Vec<f64>],
    labels: &mut [usize],
    dists: &mut [f64],
    sums: &mut [Vec<f64>],
    counts: &mut [usize],
) {
    for c in 0..counts.len() {
        if counts[c] > 0 {
            continue;
        }
        let far = (0..points.len())
            .filter(|&i| counts[labels[i]] > 1)
            .max_by(|&a, &b| dists[a].total_cmp(&dists[b]));
        let Some(i) = far else {
            continue;
        };
        let old = labels[i];
        counts[old] -= 1;
        for (s, x) in sums[old].iter_mut().zip(&points[i]) {
            *s -= x;
        }
        counts[c] = 1;
        sums[c] = points[i].clone();
        labels[i] = c;
        dists[i] = 0.0;
        debug!(cluster = c, point = i, "relocated point into empty cluster");
    }
}
