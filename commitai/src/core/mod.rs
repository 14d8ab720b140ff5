//! Deterministic logic with no I/O.

pub mod error;
pub mod grouping;
pub mod message;
pub mod normalize;
pub mod types;
