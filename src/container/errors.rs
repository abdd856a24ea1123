//! Engine error types
//!
//! A rejected unique insert is NOT an error: it is reported in-band by
//! `InsertOutcome`. Errors cover build-time validation, misuse of
//! handles and views, and the fatal cross-view desync class.

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    // ==================
    // Build-time validation
    // ==================
    /// A container needs at least one view
    #[error("container requires at least one view")]
    NoViews,

    /// View names must be unique within a container
    #[error("duplicate view name: {0}")]
    DuplicateViewName(String),

    // ==================
    // Constraint violations
    // ==================
    /// Every record must carry every view's key field
    #[error("record is missing field '{field}' required by view '{view}'")]
    MissingKeyField {
        /// View whose projection failed
        view: String,
        /// The absent field
        field: String,
    },

    // ==================
    // Precondition violations
    // ==================
    /// No view with that name in this container
    #[error("unknown view: {0}")]
    UnknownView(String),

    /// The handle does not denote a live record in this container
    #[error("stale or foreign record handle")]
    StaleHandle,

    /// Rank queries need a ranked view
    #[error("view '{0}' does not maintain rank information")]
    RankUnsupported(String),

    // ==================
    // Corruption
    // ==================
    /// A view lost an entry the record store still holds. Fatal: the
    /// cross-view consistency invariant is broken.
    #[error("view '{view}' is out of sync with the record store")]
    ViewDesync {
        /// The desynchronized view
        view: String,
    },
}

impl EngineError {
    /// Whether this error signals broken engine invariants rather than
    /// recoverable misuse
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::ViewDesync { .. })
    }
}
