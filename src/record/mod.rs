//! Record subsystem for rankdb
//!
//! The record store owns the canonical set of records; index views hold
//! handles into it, never copies.
//!
//! # Invariants
//!
//! - Records are immutable once inserted
//! - Handles are node-stable: only erasing a record invalidates its handle
//! - Insertion sequence numbers are strictly monotonic and never reused

mod field;
mod record;
mod store;

pub use field::FieldValue;
pub use record::{Record, RecordBuilder, RecordError, RecordResult};
pub use store::{RecordHandle, RecordStore};
