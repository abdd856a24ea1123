//! View definitions and container builder
//!
//! A view is declared by name, projected key field, uniqueness policy,
//! and capability. Definitions are validated once, before the container
//! accepts any record.

use std::collections::HashSet;

use super::container::MultiIndexContainer;
use super::errors::{EngineError, EngineResult};

/// Uniqueness policy of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uniqueness {
    /// At most one record per key
    Unique,
    /// Any number of records per key
    NonUnique,
}

/// Query capability of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Ordered iteration and run-scan counting
    Ordered,
    /// Ordered plus O(log n) rank and count
    Ranked,
}

/// Declaration of one index view
#[derive(Debug, Clone)]
pub struct ViewDef {
    /// View name, unique within the container
    pub name: String,
    /// Record field projected as the view's key
    pub key_field: String,
    /// Uniqueness policy
    pub uniqueness: Uniqueness,
    /// Query capability
    pub capability: Capability,
}

impl ViewDef {
    /// Declare a view
    pub fn new(
        name: impl Into<String>,
        key_field: impl Into<String>,
        uniqueness: Uniqueness,
        capability: Capability,
    ) -> Self {
        Self {
            name: name.into(),
            key_field: key_field.into(),
            uniqueness,
            capability,
        }
    }
}

/// Builder for [`MultiIndexContainer`]
#[derive(Debug, Default)]
pub struct ContainerBuilder {
    defs: Vec<ViewDef>,
}

impl ContainerBuilder {
    /// Start an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unique ordered view
    pub fn ordered_unique(self, name: impl Into<String>, key_field: impl Into<String>) -> Self {
        self.view(ViewDef::new(
            name,
            key_field,
            Uniqueness::Unique,
            Capability::Ordered,
        ))
    }

    /// Add a non-unique ordered view
    pub fn ordered_non_unique(
        self,
        name: impl Into<String>,
        key_field: impl Into<String>,
    ) -> Self {
        self.view(ViewDef::new(
            name,
            key_field,
            Uniqueness::NonUnique,
            Capability::Ordered,
        ))
    }

    /// Add a unique ranked view
    pub fn ranked_unique(self, name: impl Into<String>, key_field: impl Into<String>) -> Self {
        self.view(ViewDef::new(
            name,
            key_field,
            Uniqueness::Unique,
            Capability::Ranked,
        ))
    }

    /// Add a non-unique ranked view
    pub fn ranked_non_unique(self, name: impl Into<String>, key_field: impl Into<String>) -> Self {
        self.view(ViewDef::new(
            name,
            key_field,
            Uniqueness::NonUnique,
            Capability::Ranked,
        ))
    }

    /// Add a fully spelled-out view definition
    pub fn view(mut self, def: ViewDef) -> Self {
        self.defs.push(def);
        self
    }

    /// Validate the definitions and build the container.
    ///
    /// Rejects an empty view list and duplicate view names.
    pub fn build(self) -> EngineResult<MultiIndexContainer> {
        if self.defs.is_empty() {
            return Err(EngineError::NoViews);
        }

        let mut seen = HashSet::new();
        for def in &self.defs {
            if !seen.insert(def.name.as_str()) {
                return Err(EngineError::DuplicateViewName(def.name.clone()));
            }
        }

        Ok(MultiIndexContainer::from_defs(self.defs))
    }
}
