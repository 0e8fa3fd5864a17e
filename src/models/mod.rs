//! Core data models for stickgen.

mod config;
mod error;
mod knot;

pub use config::*;
pub use error::*;
pub use knot::*;
