//! Contracts for the external collaborators.
//!
//! The polygon sampler, the fast classifier, the invariant
//! oracle/database, and the symbolic algebra engine are all external
//! programs; the traits here are the exact surface the core pipeline
//! needs from each. Command-backed adapters live in [`command`].

pub mod command;

use crate::classify::InvariantQuery;
use crate::models::{Result, StickgenError};
use serde::{Deserialize, Serialize};

pub use command::{
    CommandInvariantOracle, CommandPolygonSampler, CommandPrimaryClassifier, CommandSymbolicEngine,
};

/// One closed equilateral polygon, as an ordered 3D vertex sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<[f64; 3]>,
}

impl Polygon {
    pub fn new(vertices: Vec<[f64; 3]>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[[f64; 3]] {
        &self.vertices
    }

    pub fn num_edges(&self) -> usize {
        self.vertices.len()
    }

    /// Single-line vertex rendering: space-separated coordinates within a
    /// vertex, tab-separated vertices. Used as the `string_repr` field of
    /// logged samples.
    pub fn knotplot_string(&self) -> String {
        self.vertices
            .iter()
            .map(|v| format!("{} {} {}", v[0], v[1], v[2]))
            .collect::<Vec<_>>()
            .join("\t")
    }

    /// Tab-separated rows, one vertex per line. The wire form for feeding
    /// geometry to the external tools.
    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for v in &self.vertices {
            out.push_str(&format!("{}\t{}\t{}\n", v[0], v[1], v[2]));
        }
        out
    }

    /// Parse whitespace/tab-delimited coordinate rows.
    pub fn from_rows(text: &str) -> Result<Self> {
        let mut vertices = Vec::new();
        for (line_num, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let coords: std::result::Result<Vec<f64>, _> =
                line.split_whitespace().map(str::parse).collect();
            match coords.as_deref() {
                Ok([x, y, z]) => vertices.push([*x, *y, *z]),
                _ => {
                    return Err(StickgenError::Parse(format!(
                        "vertex line {}: expected three coordinates, got {:?}",
                        line_num + 1,
                        line
                    )))
                }
            }
        }
        if vertices.len() < 3 {
            return Err(StickgenError::InvalidInput(format!(
                "polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        Ok(Self::new(vertices))
    }
}

/// One irreducible factor as reported by the fast classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimeFactor {
    pub crossings: u32,
    pub index: u32,
}

/// Outcome of the fast classifier: a full factor decomposition, or an
/// explicit incompleteness signal when the polygon's complexity exceeds
/// what it can classify. A tagged outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryOutcome {
    Resolved(Vec<PrimeFactor>),
    Incomplete,
}

/// Invariants the oracle computes from raw polygon geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawInvariants {
    /// Vassiliev invariant of degree 2
    pub vassiliev_v2: i64,

    /// Vassiliev invariant of degree 3
    pub vassiliev_v3: i64,

    /// Crossing count of the polygon's Gauss code diagram
    pub gauss_length: usize,

    /// Hyperbolic volume estimate of the knot complement
    pub hyperbolic_volume: f64,

    /// The volume computation encountered degenerate tetrahedra and is
    /// known unreliable
    #[serde(default)]
    pub degenerate_volume: bool,

    /// Alexander polynomial evaluations at roots of unity, as
    /// `(root, value)` pairs; the degraded substitute when no HOMFLY is
    /// available
    #[serde(default)]
    pub alexander_roots: Vec<(u32, f64)>,
}

/// Sampling parameters handed to the external polygon sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingWindow {
    pub confinement_radius: f64,
    pub num_edges: u32,
    /// Total iteration budget, burn-in included. The sampler consumes
    /// its burn-in prefix internally; only post-burn-in polygons reach
    /// the sink.
    pub total_iterations: u64,
    pub max_seconds: u64,
    pub seed: u64,
}

/// Consumer of generated polygons. The sampler calls `accept` once per
/// polygon, in sequence; the data flow is one-way and the call must return
/// before the next polygon is produced.
pub trait PolygonSink {
    fn accept(&mut self, polygon: &Polygon);
}

/// External confined equilateral polygon sampler.
///
/// Burn-in is the sampler's responsibility: it consumes the prefix of
/// the chain itself and yields only post-burn-in polygons, so the caller
/// must classify everything it receives.
pub trait PolygonSampler {
    fn sample(&mut self, window: &SamplingWindow, sink: &mut dyn PolygonSink) -> Result<()>;
}

/// External fast knot classifier.
pub trait PrimaryClassifier {
    /// Classify a polygon's topology, or signal incompleteness.
    fn classify(&self, polygon: &Polygon, seed: u64) -> Result<PrimaryOutcome>;

    /// The classifier's topology layer can emit a textual HOMFLY
    /// polynomial in its own notation, independently of full
    /// classification. `None` means the computation failed.
    fn homfly_text(&self, polygon: &Polygon, seed: u64) -> Result<Option<String>>;
}

/// External invariant computer and knot identity database.
pub trait InvariantOracle {
    /// Compute the raw geometric invariants of a polygon.
    fn invariants(&self, polygon: &Polygon) -> Result<RawInvariants>;

    /// Look up candidate identity strings matching a feature vector.
    /// Zero, one, or many candidates may come back.
    fn lookup(&self, query: &InvariantQuery) -> Result<Vec<String>>;
}

/// External symbolic algebra engine for two-variable polynomials.
pub trait SymbolicEngine {
    /// Parse an expression over the formal variables `a` and `z`,
    /// substitute each variable with itself multiplied by the imaginary
    /// unit, and return the canonical rendering. This converts between the
    /// two published sign conventions for the HOMFLY invariant.
    fn homfly_convention(&self, expr: &str) -> Result<String>;
}
