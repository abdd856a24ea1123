//! rankdb - a strict, deterministic, in-memory multi-index record engine
//!
//! A container maintaining several synchronized ordered views over one
//! set of immutable records. Ranked views additionally answer
//! equivalence-class counts and rank queries in O(log n), independent of
//! how many records share a key.

pub mod container;
pub mod index;
pub mod observability;
pub mod record;
