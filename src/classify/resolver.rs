//! Classification resolution pipeline.
//!
//! Per polygon: the fast classifier first; its single-factor answers are
//! cross-validated through the invariant fallback when their HOMFLY is
//! known to be non-unique; the fallback itself retries once with a
//! composite decomposition search when a non-hyperbolic knot finds no
//! prime match. Every non-resolution terminates in `Unclassifiable` — a
//! single stubborn polygon never aborts a run.

use tracing::{debug, warn};

use super::homfly::{self, Homfly};
use super::invariants::{build_query, VolumeField};
use crate::external::{
    InvariantOracle, Polygon, PrimaryClassifier, PrimaryOutcome, SymbolicEngine,
};
use crate::models::{CandidateSet, KnotIdentity, PrimeComponent};
use crate::tables::AmbiguousHomflySet;

/// Terminal state of the resolution pipeline for one polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(KnotIdentity),
    Unclassifiable(CandidateSet),
}

/// Outcome of the invariant fallback path.
enum FallbackOutcome {
    Single(KnotIdentity),
    Ambiguous(CandidateSet),
}

/// Drives primary and fallback classification for one run.
pub struct Resolver<'a> {
    primary: &'a dyn PrimaryClassifier,
    oracle: &'a dyn InvariantOracle,
    symbolic: &'a dyn SymbolicEngine,
    ambiguous: &'a AmbiguousHomflySet,
    seed: u64,
}

impl<'a> Resolver<'a> {
    pub fn new(
        primary: &'a dyn PrimaryClassifier,
        oracle: &'a dyn InvariantOracle,
        symbolic: &'a dyn SymbolicEngine,
        ambiguous: &'a AmbiguousHomflySet,
        seed: u64,
    ) -> Self {
        Self {
            primary,
            oracle,
            symbolic,
            ambiguous,
            seed,
        }
    }

    /// Resolve one polygon to a knot identity, or give up explicitly.
    pub fn resolve(&self, polygon: &Polygon) -> Resolution {
        let outcome = match self.primary.classify(polygon, self.seed) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(%error, "primary classifier failed, trying fallback");
                PrimaryOutcome::Incomplete
            }
        };

        match outcome {
            PrimaryOutcome::Incomplete => self.fallback(polygon).into(),
            PrimaryOutcome::Resolved(factors) => {
                let identity = KnotIdentity::new(
                    factors
                        .iter()
                        .map(|f| PrimeComponent::Tabulated {
                            crossings: f.crossings,
                            index: f.index,
                        })
                        .collect(),
                );

                // Single-factor answers naming a knot with a non-unique
                // HOMFLY are consistent but not provably correct:
                // cross-validate through the fallback, exactly once.
                // Identities that already came from the fallback are never
                // re-checked, and composites are taken as-is.
                if identity.as_prime().is_some() && self.ambiguous.contains(&identity.encode()) {
                    debug!(knot = %identity, "ambiguous HOMFLY, cross-validating");
                    self.fallback(polygon).into()
                } else {
                    Resolution::Resolved(identity)
                }
            }
        }
    }

    /// The invariant-database path: assemble a feature vector from the raw
    /// geometry and look it up, retrying once with a composite search when
    /// a non-hyperbolic knot matches nothing.
    fn fallback(&self, polygon: &Polygon) -> FallbackOutcome {
        let raw = match self.oracle.invariants(polygon) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(%error, "invariant computation failed");
                return FallbackOutcome::Ambiguous(CandidateSet::default());
            }
        };

        let homfly = self.normalized_homfly(polygon);
        let (query, volume) = build_query(&raw, homfly.as_ref());

        let candidates = match self.oracle.lookup(&query) {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(%error, "identity lookup failed");
                return FallbackOutcome::Ambiguous(CandidateSet::default());
            }
        };

        match candidates.as_slice() {
            [single] => decode_candidate(single),
            [] if volume == VolumeField::NotHyperbolic => {
                // Not hyperbolic and no prime match: perhaps a composite.
                match self.oracle.lookup(&query.with_composite()) {
                    Ok(retry) => match retry.as_slice() {
                        [single] => decode_candidate(single),
                        _ => FallbackOutcome::Ambiguous(CandidateSet::new(retry)),
                    },
                    Err(error) => {
                        warn!(%error, "composite lookup failed");
                        FallbackOutcome::Ambiguous(CandidateSet::default())
                    }
                }
            }
            _ => FallbackOutcome::Ambiguous(CandidateSet::new(candidates)),
        }
    }

    /// Normalize the classifier's HOMFLY text for the feature vector.
    /// Any failure along the way drops the invariant rather than the
    /// polygon; the Alexander evaluations substitute.
    fn normalized_homfly(&self, polygon: &Polygon) -> Option<Homfly> {
        let text = match self.primary.homfly_text(polygon, self.seed) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(error) => {
                warn!(%error, "HOMFLY computation failed");
                return None;
            }
        };
        match homfly::normalize(&text, self.symbolic) {
            Ok(homfly) => Some(homfly),
            Err(error) => {
                warn!(%error, "HOMFLY normalization failed");
                None
            }
        }
    }
}

/// Decode one candidate identity string from the database. Composite
/// identifiers may arrive with bare `#` separators; canonicalize before
/// decoding. An undecodable candidate is carried into the unclassifiable
/// log rather than dropped.
fn decode_candidate(candidate: &str) -> FallbackOutcome {
    let canonical = candidate.replace(" # ", "#").replace('#', " # ");
    match KnotIdentity::decode(&canonical) {
        Some(identity) => FallbackOutcome::Single(identity),
        None => {
            warn!(candidate, "undecodable candidate identity");
            FallbackOutcome::Ambiguous(CandidateSet::new(vec![candidate.to_string()]))
        }
    }
}

impl From<FallbackOutcome> for Resolution {
    fn from(outcome: FallbackOutcome) -> Self {
        match outcome {
            FallbackOutcome::Single(identity) => Resolution::Resolved(identity),
            FallbackOutcome::Ambiguous(candidates) => Resolution::Unclassifiable(candidates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::InvariantQuery;
    use crate::external::{PrimeFactor, RawInvariants};
    use crate::models::Result;
    use std::cell::RefCell;

    struct StubPrimary {
        outcome: PrimaryOutcome,
        homfly: Option<String>,
        calls: RefCell<usize>,
    }

    impl StubPrimary {
        fn resolved(factors: Vec<(u32, u32)>) -> Self {
            Self {
                outcome: PrimaryOutcome::Resolved(
                    factors
                        .into_iter()
                        .map(|(crossings, index)| PrimeFactor { crossings, index })
                        .collect(),
                ),
                homfly: None,
                calls: RefCell::new(0),
            }
        }

        fn incomplete() -> Self {
            Self {
                outcome: PrimaryOutcome::Incomplete,
                homfly: None,
                calls: RefCell::new(0),
            }
        }
    }

    impl PrimaryClassifier for StubPrimary {
        fn classify(&self, _polygon: &Polygon, _seed: u64) -> Result<PrimaryOutcome> {
            *self.calls.borrow_mut() += 1;
            Ok(self.outcome.clone())
        }

        fn homfly_text(&self, _polygon: &Polygon, _seed: u64) -> Result<Option<String>> {
            Ok(self.homfly.clone())
        }
    }

    struct StubOracle {
        invariants: RawInvariants,
        /// Responses per lookup call, in order.
        responses: RefCell<Vec<Vec<String>>>,
        queries: RefCell<Vec<InvariantQuery>>,
    }

    impl StubOracle {
        fn new(volume: f64, responses: Vec<Vec<&str>>) -> Self {
            Self {
                invariants: RawInvariants {
                    vassiliev_v2: 1,
                    vassiliev_v3: -1,
                    gauss_length: 10,
                    hyperbolic_volume: volume,
                    degenerate_volume: false,
                    alexander_roots: vec![(2, 3.0), (3, 7.0), (4, 5.0)],
                },
                responses: RefCell::new(
                    responses
                        .into_iter()
                        .map(|r| r.into_iter().map(str::to_string).collect())
                        .collect(),
                ),
                queries: RefCell::new(Vec::new()),
            }
        }

        fn lookups(&self) -> usize {
            self.queries.borrow().len()
        }
    }

    impl InvariantOracle for StubOracle {
        fn invariants(&self, _polygon: &Polygon) -> Result<RawInvariants> {
            Ok(self.invariants.clone())
        }

        fn lookup(&self, query: &InvariantQuery) -> Result<Vec<String>> {
            self.queries.borrow_mut().push(query.clone());
            let mut responses = self.responses.borrow_mut();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(responses.remove(0))
            }
        }
    }

    struct EchoEngine;

    impl SymbolicEngine for EchoEngine {
        fn homfly_convention(&self, expr: &str) -> Result<String> {
            Ok(expr.to_string())
        }
    }

    fn hexagon() -> Polygon {
        Polygon::new(vec![
            [1.0, 0.0, 0.0],
            [0.5, 0.9, 0.2],
            [-0.5, 0.9, -0.2],
            [-1.0, 0.0, 0.0],
            [-0.5, -0.9, 0.2],
            [0.5, -0.9, -0.2],
        ])
    }

    fn resolver<'a>(
        primary: &'a StubPrimary,
        oracle: &'a StubOracle,
        engine: &'a EchoEngine,
        ambiguous: &'a AmbiguousHomflySet,
    ) -> Resolver<'a> {
        Resolver::new(primary, oracle, engine, ambiguous, 42)
    }

    #[test]
    fn primary_prime_resolves_directly() {
        let primary = StubPrimary::resolved(vec![(3, 1)]);
        let oracle = StubOracle::new(0.0, vec![]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        let resolution = r.resolve(&hexagon());
        assert_eq!(
            resolution,
            Resolution::Resolved(KnotIdentity::decode("3_1").unwrap())
        );
        // 3_1 has a unique HOMFLY; the fallback must stay untouched.
        assert_eq!(oracle.lookups(), 0);
    }

    #[test]
    fn primary_composite_resolves_without_recheck() {
        // Granny knot, reported by the primary path.
        let primary = StubPrimary::resolved(vec![(3, 1), (3, 1)]);
        let oracle = StubOracle::new(0.0, vec![]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        let resolution = r.resolve(&hexagon());
        assert_eq!(
            resolution,
            Resolution::Resolved(KnotIdentity::decode("3_1 # 3_1").unwrap())
        );
        assert_eq!(oracle.lookups(), 0);
    }

    #[test]
    fn unknot_factors_normalize() {
        let primary = StubPrimary::resolved(vec![]);
        let oracle = StubOracle::new(0.0, vec![]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        assert_eq!(
            r.resolve(&hexagon()),
            Resolution::Resolved(KnotIdentity::unknot())
        );
    }

    #[test]
    fn ambiguous_prime_is_cross_validated_exactly_once() {
        // 5_1 is on the non-unique-HOMFLY list; the fallback confirms it.
        let primary = StubPrimary::resolved(vec![(5, 1)]);
        let oracle = StubOracle::new(3.2, vec![vec!["5_1"]]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        let resolution = r.resolve(&hexagon());
        assert_eq!(
            resolution,
            Resolution::Resolved(KnotIdentity::decode("5_1").unwrap())
        );
        // One classify call, one lookup: the fallback answering with the
        // same ambiguous identity must not trigger another round.
        assert_eq!(*primary.calls.borrow(), 1);
        assert_eq!(oracle.lookups(), 1);
    }

    #[test]
    fn ambiguous_prime_corrected_by_fallback() {
        let primary = StubPrimary::resolved(vec![(8, 8)]);
        let oracle = StubOracle::new(7.9, vec![vec!["10_129"]]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        assert_eq!(
            r.resolve(&hexagon()),
            Resolution::Resolved(KnotIdentity::decode("10_129").unwrap())
        );
    }

    #[test]
    fn incomplete_primary_uses_fallback() {
        let primary = StubPrimary::incomplete();
        let oracle = StubOracle::new(15.5, vec![vec!["K11n34"]]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        assert_eq!(
            r.resolve(&hexagon()),
            Resolution::Resolved(KnotIdentity::decode("K11n34").unwrap())
        );
    }

    #[test]
    fn composite_retry_decodes_bare_separator() {
        // Non-hyperbolic, no prime match, composite search finds one.
        let primary = StubPrimary::incomplete();
        let oracle = StubOracle::new(0.02, vec![vec![], vec!["3_1#4_1"]]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        let resolution = r.resolve(&hexagon());
        assert_eq!(
            resolution,
            Resolution::Resolved(KnotIdentity::decode("3_1 # 4_1").unwrap())
        );
        assert_eq!(oracle.lookups(), 2);
        assert!(oracle.queries.borrow()[1].composite);
        assert!(!oracle.queries.borrow()[0].composite);
    }

    #[test]
    fn empty_composite_retry_is_unclassifiable_with_empty_candidates() {
        let primary = StubPrimary::incomplete();
        let oracle = StubOracle::new(0.0, vec![vec![], vec![]]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        let resolution = r.resolve(&hexagon());
        assert_eq!(resolution, Resolution::Unclassifiable(CandidateSet::default()));
        assert_eq!(oracle.lookups(), 2);
    }

    #[test]
    fn hyperbolic_zero_candidates_skip_composite_retry() {
        let primary = StubPrimary::incomplete();
        let oracle = StubOracle::new(6.5, vec![vec![]]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        assert_eq!(
            r.resolve(&hexagon()),
            Resolution::Unclassifiable(CandidateSet::default())
        );
        assert_eq!(oracle.lookups(), 1);
    }

    #[test]
    fn multiple_candidates_are_unclassifiable() {
        let primary = StubPrimary::incomplete();
        let oracle = StubOracle::new(6.5, vec![vec!["10_22", "10_35"]]);
        let engine = EchoEngine;
        let ambiguous = AmbiguousHomflySet::default();
        let r = resolver(&primary, &oracle, &engine, &ambiguous);

        assert_eq!(
            r.resolve(&hexagon()),
            Resolution::Unclassifiable(CandidateSet::new(vec![
                "10_22".to_string(),
                "10_35".to_string(),
            ]))
        );
    }
}
