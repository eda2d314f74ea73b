//! core/measure.rs — Surface measures, hemispheres and the per-measure
//! binarization rules.
//!
//! A rule set is an ordered list of (predicate, code) pairs. Every rule is
//! tested against the raw value in written order and a match overwrites the
//! code, so the last matching rule wins. Values matching no rule stay unbinned.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete class code produced by binarization.
pub type Code = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measure {
    Curvature,
    Eccentricity,
}

impl Measure {
    /// Name passed to the surface-data accessor.
    pub fn name(self) -> &'static str {
        match self {
            Measure::Curvature => "curvature",
            Measure::Eccentricity => "eccentricity",
        }
    }

    /// Tag used in per-cluster mean map file names.
    pub fn map_tag(self) -> &'static str {
        match self {
            Measure::Curvature => "curvatureMaps",
            Measure::Eccentricity => "eccMaps",
        }
    }

    /// Short tag used in assignment and matrix file names.
    pub fn short_tag(self) -> &'static str {
        match self {
            Measure::Curvature => "curv",
            Measure::Eccentricity => "ecc",
        }
    }

    pub fn rules(self) -> &'static [BinarizeRule] {
        match self {
            Measure::Curvature => CURVATURE_RULES,
            Measure::Eccentricity => ECCENTRICITY_RULES,
        }
    }

    /// Masking applied to the unbinarized data kept for cluster means.
    pub fn default_original_masking(self) -> OriginalMasking {
        match self {
            Measure::Curvature => OriginalMasking::Composite,
            Measure::Eccentricity => OriginalMasking::SubRegion,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Measure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "curvature" | "curv" => Ok(Measure::Curvature),
            "eccentricity" | "ecc" => Ok(Measure::Eccentricity),
            other => Err(format!("unknown measure '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    #[serde(rename = "LH")]
    Left,
    #[serde(rename = "RH")]
    Right,
}

impl Hemisphere {
    pub fn tag(self) -> &'static str {
        match self {
            Hemisphere::Left => "LH",
            Hemisphere::Right => "RH",
        }
    }
}

impl fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for Hemisphere {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LH" | "LEFT" | "L" => Ok(Hemisphere::Left),
            "RH" | "RIGHT" | "R" => Ok(Hemisphere::Right),
            other => Err(format!("unknown hemisphere '{other}'")),
        }
    }
}

/// Which vertices of the raw map are kept for cluster-mean aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginalMasking {
    /// Same vertices as the binarized vector (ROI ∧ sub-region ∧ eccentricity band).
    Composite,
    /// Sub-region vertices within ROI space, eccentricity band not applied.
    SubRegion,
}

/// Half-open or closed comparison against a threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Predicate {
    /// `v >= t`
    AtLeast(f64),
    /// `v < t`
    Below(f64),
    /// `v > t`
    Above(f64),
    /// `lo < v <= hi`
    UpperClosed { lo: f64, hi: f64 },
    /// `lo <= v <= hi`
    Closed { lo: f64, hi: f64 },
}

impl Predicate {
    #[inline]
    pub fn matches(self, v: f64) -> bool {
        match self {
            Predicate::AtLeast(t) => v >= t,
            Predicate::Below(t) => v < t,
            Predicate::Above(t) => v > t,
            Predicate::UpperClosed { lo, hi } => v > lo && v <= hi,
            Predicate::Closed { lo, hi } => v >= lo && v <= hi,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinarizeRule {
    pub predicate: Predicate,
    pub code: Code,
}

const CURVATURE_RULES: &[BinarizeRule] = &[
    BinarizeRule {
        predicate: Predicate::AtLeast(0.0),
        code: 1,
    },
    BinarizeRule {
        predicate: Predicate::Below(0.0),
        code: 0,
    },
];

const ECCENTRICITY_RULES: &[BinarizeRule] = &[
    BinarizeRule {
        predicate: Predicate::Closed { lo: 0.0, hi: 2.0 },
        code: 0,
    },
    BinarizeRule {
        predicate: Predicate::UpperClosed { lo: 2.0, hi: 4.0 },
        code: 2,
    },
    BinarizeRule {
        predicate: Predicate::UpperClosed { lo: 4.0, hi: 6.0 },
        code: 4,
    },
    BinarizeRule {
        predicate: Predicate::Above(6.0),
        code: 6,
    },
];

/// Apply `rules` to a single value; `None` if no rule matched.
pub fn binarize_value(rules: &[BinarizeRule], v: f64) -> Option<Code> {
    let mut code = None;
    for rule in rules {
        if rule.predicate.matches(v) {
            code = Some(rule.code);
        }
    }
    code
}

/// Apply `rules` elementwise.
pub fn binarize(rules: &[BinarizeRule], values: &[f64]) -> Vec<Option<Code>> {
    values.iter().map(|&v| binarize_value(rules, v)).collect()
}
