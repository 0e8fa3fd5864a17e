//! Knot classification: HOMFLY normalization, invariant feature vectors,
//! and the primary/fallback resolution pipeline.

mod homfly;
mod invariants;
mod resolver;

pub use homfly::{normalize, rewrite_plcurve_expr, Homfly};
pub use invariants::{
    build_query, format_volume, volume_field, InvariantQuery, VolumeField, MAX_CROSSINGS_CAP,
    NOT_HYPERBOLIC_THRESHOLD,
};
pub use resolver::{Resolution, Resolver};
