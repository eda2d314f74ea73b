use std::collections::HashMap;

use approx::assert_abs_diff_eq;

use cortexvar::config::AnalysisConfig;
use cortexvar::core::aggregate::{block_labels, cluster_ordering, reordered_matrix};
use cortexvar::core::jaccard::symmetric_weighted_jaccard;
use cortexvar::core::mask::{Mask, MaskSet};
use cortexvar::core::measure::{Hemisphere, Measure, OriginalMasking};
use cortexvar::core::similarity::similarity_matrix;
use cortexvar::core::spectral::ClusterAssignment;
use cortexvar::io::surface::{FetchError, SurfaceSource};
use cortexvar::pipeline::{run_analysis, AnalysisInputs};
use cortexvar::AnalysisError;

/// Full-hemisphere maps held in memory, keyed by subject.
struct MemorySource {
    maps: HashMap<String, Vec<f64>>,
}

impl SurfaceSource for MemorySource {
    fn fetch_subject_map(
        &self,
        _measure: Measure,
        subject: &str,
        roi: &Mask,
        _hemisphere: Hemisphere,
    ) -> Result<Vec<f64>, FetchError> {
        let full = self
            .maps
            .get(subject)
            .ok_or_else(|| format!("unknown subject {subject}"))?;
        Ok(roi.select(full, "memory map")?)
    }
}

const HEMI: usize = 60;
const ROI_END: usize = 50;
const SUB_START: usize = 5;

fn masks() -> MaskSet {
    let roi = Mask::new((0..HEMI).map(|v| v < ROI_END).collect());
    let subregion = Mask::new((0..HEMI).map(|v| v >= SUB_START).collect());
    // drop every seventh ROI vertex from the eccentricity band
    let eccentricity = Mask::new((0..ROI_END).map(|v| v % 7 != 3).collect());
    MaskSet {
        roi,
        subregion,
        eccentricity,
    }
}

/// Eccentricity value inside band `band` (0..4), jittered by `t` in [0, 1).
fn in_band(band: usize, t: f64) -> f64 {
    match band {
        0 => 0.2 + 1.6 * t,
        1 => 2.2 + 1.6 * t,
        2 => 4.2 + 1.6 * t,
        _ => 6.5 + 3.0 * t,
    }
}

/// Two groups with distinct band patterns. Vertices outside the sub-region
/// carry negative values that no rule bins.
fn source_and_subjects() -> (MemorySource, Vec<String>, Vec<usize>) {
    let mut maps = HashMap::new();
    let mut subjects = Vec::new();
    let mut truth = Vec::new();
    for s in 0..12 {
        let group = usize::from(s % 3 == 0);
        let id = format!("sub{s:02}");
        let map: Vec<f64> = (0..HEMI)
            .map(|v| {
                if v < SUB_START {
                    return -1.0;
                }
                let band = if group == 0 { v % 4 } else { (v / 3 + 1) % 4 };
                // one deviating vertex per subject
                let band = if v == SUB_START + s { (band + 1) % 4 } else { band };
                in_band(band, ((v * 31 + s * 17) % 100) as f64 / 100.0)
            })
            .collect();
        maps.insert(id.clone(), map);
        subjects.push(id);
        truth.push(group);
    }
    (MemorySource { maps }, subjects, truth)
}

fn analysis(k: usize) -> AnalysisConfig {
    AnalysisConfig {
        measure: Measure::Eccentricity,
        hemisphere: Hemisphere::Left,
        n_clusters: k,
        ..AnalysisConfig::default()
    }
}

#[test]
fn eccentricity_analysis_groups_band_patterns() {
    let (source, subjects, truth) = source_and_subjects();
    let inputs = AnalysisInputs {
        subjects,
        masks: masks(),
    };
    let outcome = run_analysis(&analysis(2), &inputs, &source).unwrap();

    let labels = outcome.assignment.labels();
    for i in 0..labels.len() {
        for j in 0..labels.len() {
            assert_eq!(labels[i] == labels[j], truth[i] == truth[j], "subjects {i},{j}");
        }
    }

    let selected = (SUB_START..ROI_END).filter(|v| v % 7 != 3).count();
    assert!(outcome
        .features
        .binarized
        .iter()
        .all(|f| f.len() == selected && f.iter().all(|c| [0, 2, 4, 6].contains(c))));

    // eccentricity means span the whole sub-region, band mask ignored
    let subregion_len = ROI_END - SUB_START;
    for (k, mean) in outcome.cluster_means.iter().enumerate() {
        assert_eq!(mean.len(), subregion_len);
        let members = outcome.assignment.members(k);
        let expected = members
            .iter()
            .map(|&i| outcome.features.original[i][0])
            .sum::<f64>()
            / members.len() as f64;
        assert_abs_diff_eq!(mean[0], expected, epsilon = 1e-12);
    }

    // ordering is a permutation grouping labels ascending
    let mut seen = outcome.ordering.clone();
    seen.sort_unstable();
    assert_eq!(seen, (0..12).collect::<Vec<_>>());
    let ordered_labels: Vec<usize> = outcome.ordering.iter().map(|&i| labels[i]).collect();
    assert!(ordered_labels.windows(2).all(|w| w[0] <= w[1]));

    for (a, &i) in outcome.ordering.iter().enumerate() {
        for (b, &j) in outcome.ordering.iter().enumerate() {
            assert_eq!(outcome.reordered.get(a, b), outcome.similarity.get(i, j));
        }
    }
}

#[test]
fn subregion_override_applies_to_curvature_originals() {
    let (mut source, subjects, _) = source_and_subjects();
    // shift so the two lower bands become negative curvature
    for map in source.maps.values_mut() {
        map.iter_mut().for_each(|v| *v -= 4.0);
    }
    let inputs = AnalysisInputs {
        subjects,
        masks: masks(),
    };
    let mut cfg = analysis(2);
    cfg.measure = Measure::Curvature;
    cfg.original_masking = Some(OriginalMasking::SubRegion);
    let outcome = run_analysis(&cfg, &inputs, &source).unwrap();
    assert!(outcome
        .features
        .original
        .iter()
        .all(|o| o.len() == ROI_END - SUB_START));
    let selected = (SUB_START..ROI_END).filter(|v| v % 7 != 3).count();
    assert!(outcome
        .features
        .binarized
        .iter()
        .all(|f| f.len() == selected && f.iter().all(|&c| c <= 1)));
    assert!(outcome.features.binarized[0].contains(&0));
    assert!(outcome.features.binarized[0].contains(&1));
}

#[test]
fn unbinned_value_at_retained_vertex_names_subject_and_vertex() {
    let (mut source, subjects, _) = source_and_subjects();
    source.maps.get_mut("sub04").unwrap()[SUB_START + 1] = -0.5;
    let inputs = AnalysisInputs {
        subjects,
        masks: masks(),
    };
    match run_analysis(&analysis(2), &inputs, &source) {
        Err(AnalysisError::UnbinnedValue {
            subject,
            vertex,
            value,
        }) => {
            assert_eq!(subject, "sub04");
            assert_eq!(vertex, SUB_START + 1);
            assert_eq!(value, -0.5);
        }
        other => panic!("expected UnbinnedValue, got {other:?}"),
    }
}

#[test]
fn too_many_clusters_is_rejected() {
    let (source, subjects, _) = source_and_subjects();
    let inputs = AnalysisInputs {
        subjects: subjects[..3].to_vec(),
        masks: masks(),
    };
    assert!(matches!(
        run_analysis(&analysis(6), &inputs, &source),
        Err(AnalysisError::InvalidClusterCount { k: 6, n: 3 })
    ));
}

#[test]
fn unknown_subject_surfaces_as_fetch_error() {
    let (source, mut subjects, _) = source_and_subjects();
    subjects.push("ghost".to_string());
    let inputs = AnalysisInputs {
        subjects,
        masks: masks(),
    };
    let err = run_analysis(&analysis(2), &inputs, &source).unwrap_err();
    assert!(matches!(err, AnalysisError::DataFetch { ref subject, .. } if subject == "ghost"));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn worked_similarity_example() {
    let v = vec![vec![0u8, 1, 1, 0], vec![0, 1, 0, 0], vec![1, 1, 1, 1]];
    let m = similarity_matrix(&v, false).unwrap();
    assert_eq!(m.diagonal(), vec![1.0; 3]);
    assert!(m.is_symmetric());
    for i in 0..3 {
        for j in 0..3 {
            assert_abs_diff_eq!(
                m.get(i, j),
                symmetric_weighted_jaccard(&v[i], &v[j]),
                epsilon = 1e-15
            );
        }
    }
    // [0,1,1,0] vs [0,1,0,0]: class 0 IoU 2/3, class 1 IoU 1/2
    // forward weights 2/4 each, backward 3/4 and 1/4
    let forward = 0.5 * (2.0 / 3.0) + 0.5 * 0.5;
    let backward = 0.75 * (2.0 / 3.0) + 0.25 * 0.5;
    assert_abs_diff_eq!(m.get(0, 1), (forward + backward) / 2.0, epsilon = 1e-12);
}

#[test]
fn ordering_and_blocks_for_a_fixed_assignment() {
    let assignment = ClusterAssignment::new(vec![1, 0, 1, 0, 2], 3);
    let order = cluster_ordering(&assignment);
    assert_eq!(order, vec![1, 3, 0, 2, 4]);

    let blocks = block_labels(&assignment);
    assert_eq!(blocks[[0, 2]], 3.0);
    assert_eq!(blocks[[1, 3]], 2.0);
    assert_eq!(blocks[[4, 4]], 4.0);
    assert_eq!(blocks[[0, 1]], 1.0);

    let v = vec![
        vec![1u8, 0, 0],
        vec![0, 1, 1],
        vec![1, 0, 1],
        vec![0, 1, 0],
        vec![1, 1, 1],
    ];
    let m = similarity_matrix(&v, true).unwrap();
    let r = reordered_matrix(&m, &order);
    assert_eq!(r.get(0, 1), m.get(1, 3));
    assert_eq!(r.get(4, 2), m.get(4, 0));
    assert!(r.is_symmetric());
}
