//! Multi-index container subsystem for rankdb
//!
//! One record store, several synchronized index views.
//!
//! # Design Principles
//!
//! - Views are derived state: the store is the source of truth
//! - Transactional mutation: insert/erase reach every view or none
//! - Checked preconditions: stale handles and unknown views fail, they
//!   never corrupt

mod container;
mod errors;
mod view;

pub use container::{InsertOutcome, MultiIndexContainer, ViewRef};
pub use errors::{EngineError, EngineResult};
pub use view::{Capability, ContainerBuilder, Uniqueness, ViewDef};
