//! stickgen - random stick knot generation in spherical confinement.
//!
//! ## Architecture
//!
//! stickgen samples closed equilateral polygons inside a sphere and
//! censuses the knot types that come out:
//! - **Sampler**: an external tsmcmc Markov chain produces confined
//!   equilateral polygons, one per iteration
//! - **Classifier**: a fast primary classifier names most polygons; the
//!   slower invariant-database fallback handles what it cannot, and
//!   cross-validates knots whose HOMFLY polynomial is known non-unique
//! - **Aggregator**: every outcome lands in a frequency table; polygons
//!   that beat, tie, or miss the best known stick numbers are logged in
//!   full geometry
//! - **Batch**: many independent chains run as parallel OS processes
//!   with bounded concurrency
//!
//! ## Failure design
//!
//! Configuration errors are the only fatal class. Once sampling starts,
//! every external-tool failure degrades a single polygon to
//! `Unclassifiable` and the chain keeps going.

pub mod batch;
pub mod classify;
pub mod external;
pub mod models;
pub mod run;
pub mod tables;

// Re-exports for convenience
pub use classify::{Resolution, Resolver};
pub use external::{
    CommandInvariantOracle, CommandPolygonSampler, CommandPrimaryClassifier, CommandSymbolicEngine,
    Polygon, PolygonSampler, PolygonSink,
};
pub use models::{
    BatchConfig, Config, KnotIdentity, Result, RunConfig, SampleRecord, StickgenError,
};
pub use run::{RunOutput, RunSummary};
pub use tables::{AmbiguousHomflySet, StickNumberTable, StickVerdict};
