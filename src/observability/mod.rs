//! Observability subsystem for rankdb
//!
//! # Principles
//!
//! 1. Observability is read-only: no side effects on engine state
//! 2. Deterministic output (sorted log fields, exact counters)
//! 3. Synchronous, no background threads
//! 4. Nothing on the query path except counter bumps
//!
//! Probe counters double as the engine's operation-count instrumentation:
//! complexity claims are tested against node-visit counts, not wall clock.

mod logger;
mod metrics;

pub use logger::{LogEvent, Severity};
pub use metrics::{ContainerMetrics, MetricsSnapshot, ProbeCounter};

pub use logger::{error, fatal, info, trace, warn};
