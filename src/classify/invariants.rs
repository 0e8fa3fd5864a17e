//! Feature vector assembly for the fallback lookup.
//!
//! The identity database matches the hyperbolic volume by exact string
//! comparison, so the formatting here is part of the lookup contract:
//! six significant digits, and a trailing decimal point when the rounded
//! value is whole (a missing point causes false negative matches, e.g.
//! for 9_27's volume).

use serde::{Deserialize, Serialize};

use super::homfly::Homfly;
use crate::external::RawInvariants;

/// Raw volumes below this are floating-point noise around zero, not small
/// positive volumes: the smallest conjectured knot hyperbolic volume is
/// around 2.
pub const NOT_HYPERBOLIC_THRESHOLD: f64 = 0.1;

/// Cap the database search by crossing number only when the polygon's
/// diagram is small enough for the cap to help.
pub const MAX_CROSSINGS_CAP: usize = 16;

/// Three-way treatment of the hyperbolic volume estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeField {
    /// Below the noise threshold: exactly "not hyperbolic"
    NotHyperbolic,
    /// Formatted six-significant-digit decimal string
    Hyperbolic(String),
    /// Degenerate computation, dropped from the feature vector entirely
    Excluded,
}

impl VolumeField {
    /// The string placed in the lookup feature vector, if any.
    pub fn query_string(&self) -> Option<String> {
        match self {
            Self::NotHyperbolic => Some("Not hyperbolic".to_string()),
            Self::Hyperbolic(text) => Some(text.clone()),
            Self::Excluded => None,
        }
    }
}

/// Classify a raw volume estimate.
///
/// The noise check comes first: a tiny degenerate result is still "not
/// hyperbolic", only a degenerate result above the threshold is excluded.
pub fn volume_field(volume: f64, degenerate: bool) -> VolumeField {
    if volume < NOT_HYPERBOLIC_THRESHOLD {
        VolumeField::NotHyperbolic
    } else if degenerate {
        VolumeField::Excluded
    } else {
        VolumeField::Hyperbolic(format_volume(volume))
    }
}

/// Format a volume to six significant digits, appending a trailing decimal
/// point when the rounded value has no fractional part.
pub fn format_volume(volume: f64) -> String {
    let mut decimals = sig_decimals(volume);
    let mut text = format!("{volume:.decimals$}");

    // Rounding can carry into a new leading digit (9.9999996 rounds to
    // 10.0), which would print a seventh significant digit; re-derive
    // the precision from the rounded value.
    let rounded: f64 = text.parse().unwrap_or(volume);
    if sig_decimals(rounded) != decimals {
        decimals = sig_decimals(rounded);
        text = format!("{volume:.decimals$}");
    }
    let whole = match text.split_once('.') {
        Some((_, frac)) => frac.bytes().all(|b| b == b'0'),
        None => true,
    };
    if whole {
        text.push('.');
    }
    text
}

/// Decimal places that give six significant digits at this magnitude.
fn sig_decimals(volume: f64) -> usize {
    let magnitude = volume.abs().log10().floor() as i32;
    (5 - magnitude).max(0) as usize
}

/// Feature vector sent to the identity database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvariantQuery {
    /// Normalized HOMFLY polynomial, when computable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homfly: Option<String>,

    /// Alexander evaluations, the degraded substitute when no HOMFLY is
    /// available
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alexander_roots: Vec<(u32, f64)>,

    /// Vassiliev invariant of degree 2
    pub vassiliev_v2: i64,

    /// Vassiliev invariant of degree 3
    pub vassiliev_v3: i64,

    /// Search cap on crossing number, for small diagrams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_crossings: Option<usize>,

    /// Exact-match volume string; absent when the computation was excluded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperbolic_volume: Option<String>,

    /// Request a composite decomposition search
    #[serde(default)]
    pub composite: bool,
}

impl InvariantQuery {
    /// The same query with the composite decomposition flag set.
    pub fn with_composite(&self) -> Self {
        Self {
            composite: true,
            ..self.clone()
        }
    }
}

/// Assemble the lookup feature vector from raw invariants and an optional
/// normalized HOMFLY. Returns the query together with the volume
/// treatment, which the resolver needs for its composite-retry decision.
pub fn build_query(raw: &RawInvariants, homfly: Option<&Homfly>) -> (InvariantQuery, VolumeField) {
    let volume = volume_field(raw.hyperbolic_volume, raw.degenerate_volume);
    let query = InvariantQuery {
        homfly: homfly.map(|h| h.query_string().to_string()),
        alexander_roots: if homfly.is_some() {
            Vec::new()
        } else {
            raw.alexander_roots.clone()
        },
        vassiliev_v2: raw.vassiliev_v2,
        vassiliev_v3: raw.vassiliev_v3,
        max_crossings: (raw.gauss_length < MAX_CROSSINGS_CAP).then_some(raw.gauss_length),
        hyperbolic_volume: volume.query_string(),
        composite: false,
    };
    (query, volume)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(volume: f64) -> RawInvariants {
        RawInvariants {
            vassiliev_v2: 1,
            vassiliev_v3: -1,
            gauss_length: 8,
            hyperbolic_volume: volume,
            degenerate_volume: false,
            alexander_roots: vec![(2, 3.0), (3, 7.0), (4, 5.0)],
        }
    }

    #[test]
    fn whole_volume_gets_trailing_point() {
        assert_eq!(format_volume(9.0), "9.00000.");
    }

    #[test]
    fn fractional_volume_passes_through() {
        assert_eq!(format_volume(9.123456789), "9.12346");
    }

    #[test]
    fn rounding_across_a_power_of_ten_keeps_six_digits() {
        // The lookup is an exact string compare; a carry into a new
        // leading digit must not produce a seventh significant digit.
        assert_eq!(format_volume(9.9999996), "10.0000.");
        assert_eq!(format_volume(99.999996), "100.000.");
    }

    #[test]
    fn six_significant_digits_across_magnitudes() {
        // The figure-eight knot's volume, a real lookup value.
        assert_eq!(format_volume(2.0298832128193072), "2.02988");
        assert_eq!(format_volume(20.911), "20.9110");
        assert_eq!(format_volume(0.523599), "0.523599");
    }

    #[test]
    fn noise_is_not_hyperbolic() {
        assert_eq!(volume_field(0.05, false), VolumeField::NotHyperbolic);
        // The noise check wins over the degeneracy flag.
        assert_eq!(volume_field(0.05, true), VolumeField::NotHyperbolic);
    }

    #[test]
    fn degenerate_volume_is_excluded() {
        assert_eq!(volume_field(5.2, true), VolumeField::Excluded);
    }

    #[test]
    fn real_volume_is_hyperbolic() {
        assert_eq!(
            volume_field(2.0298832128193072, false),
            VolumeField::Hyperbolic("2.02988".to_string())
        );
    }

    #[test]
    fn homfly_suppresses_alexander_roots() {
        let (query, _) = build_query(&raw(2.5), Some(&Homfly::Trivial));
        assert_eq!(query.homfly.as_deref(), Some("1"));
        assert!(query.alexander_roots.is_empty());

        let (query, _) = build_query(&raw(2.5), None);
        assert!(query.homfly.is_none());
        assert_eq!(query.alexander_roots.len(), 3);
    }

    #[test]
    fn crossing_cap_only_for_small_diagrams() {
        let mut invariants = raw(2.5);
        let (query, _) = build_query(&invariants, None);
        assert_eq!(query.max_crossings, Some(8));

        invariants.gauss_length = 16;
        let (query, _) = build_query(&invariants, None);
        assert_eq!(query.max_crossings, None);
    }

    #[test]
    fn excluded_volume_is_absent_from_the_query() {
        let mut invariants = raw(5.2);
        invariants.degenerate_volume = true;
        let (query, volume) = build_query(&invariants, None);
        assert_eq!(volume, VolumeField::Excluded);
        assert!(query.hyperbolic_volume.is_none());
        let json = serde_json::to_string(&query).unwrap();
        assert!(!json.contains("hyperbolic_volume"));
    }
}
