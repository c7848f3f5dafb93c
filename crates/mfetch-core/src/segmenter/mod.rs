//! Segment planning.
//!
//! Splits a resource of known size into contiguous inclusive byte ranges,
//! one per download worker.

mod range;

pub use range::{plan_segments, Segment};
