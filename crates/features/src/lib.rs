//! Meridian Features
//!
//! The Feature Builder: converts a trailing window of bars into a
//! fixed-width feature vector, one per instrument per cycle.
//!
//! The schema is a fixed, ordered list of named transforms
//! ([`FeatureSchema::standard`]); a model trained against it stays valid
//! only as long as the ordering and semantics here do not change. The
//! builder is a pure function of its inputs: identical trailing bars always
//! produce identical output, and no bar at or after the decision timestamp
//! may contribute (enforced, not assumed).

mod builder;
mod error;
pub mod indicators;
mod schema;
mod vector;

pub use builder::{FeatureBuilder, FeatureConfig};
pub use error::{Error, Result};
pub use schema::FeatureSchema;
pub use vector::FeatureVector;
