//! Multi-index container
//!
//! Composes any number of index views (unique/non-unique, ordered/ranked)
//! over one record store.
//!
//! # Invariants
//!
//! - Insert and erase apply to every view or to none (transactional)
//! - Between completed operations, every view holds exactly the records
//!   the store holds
//! - A rejected unique insert mutates nothing and reports the blocking
//!   record's handle in-band

use crate::index::{KeyedIndex, OrderedIndex, RankedIndex};
use crate::observability::{self, ContainerMetrics, MetricsSnapshot};
use crate::record::{FieldValue, Record, RecordHandle, RecordStore};

use super::errors::{EngineError, EngineResult};
use super::view::{Capability, Uniqueness, ViewDef};

/// Result of a container insert.
///
/// On success `handle` names the new record. On a uniqueness conflict
/// `inserted` is false and `handle` names the record already holding the
/// contested key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOutcome {
    /// The inserted record, or the blocking record on conflict
    pub handle: RecordHandle,
    /// Whether the record was inserted
    pub inserted: bool,
}

struct ViewSlot {
    def: ViewDef,
    index: Box<dyn KeyedIndex>,
}

/// A record store with synchronized index views.
pub struct MultiIndexContainer {
    store: RecordStore,
    views: Vec<ViewSlot>,
    metrics: ContainerMetrics,
}

impl std::fmt::Debug for MultiIndexContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiIndexContainer")
            .field("store", &self.store)
            .field("view_count", &self.views.len())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl MultiIndexContainer {
    pub(crate) fn from_defs(defs: Vec<ViewDef>) -> Self {
        let views: Vec<ViewSlot> = defs
            .into_iter()
            .map(|def| {
                let index: Box<dyn KeyedIndex> = match def.capability {
                    Capability::Ordered => Box::new(OrderedIndex::new()),
                    Capability::Ranked => Box::new(RankedIndex::new()),
                };
                ViewSlot { def, index }
            })
            .collect();

        let view_count = views.len().to_string();
        observability::info("CONTAINER_READY", &[("views", view_count.as_str())]);

        Self {
            store: RecordStore::new(),
            views,
            metrics: ContainerMetrics::new(),
        }
    }

    /// Insert a record into every view, or into none.
    ///
    /// All view keys are projected and every unique view is probed before
    /// anything is mutated. A record missing any view's key field is a
    /// constraint violation; a uniqueness conflict is reported in-band
    /// with the blocking record's handle.
    pub fn insert(&mut self, record: Record) -> EngineResult<InsertOutcome> {
        let mut keys = Vec::with_capacity(self.views.len());
        for slot in &self.views {
            match record.get(&slot.def.key_field) {
                Some(value) => keys.push(value.clone()),
                None => {
                    return Err(EngineError::MissingKeyField {
                        view: slot.def.name.clone(),
                        field: slot.def.key_field.clone(),
                    })
                }
            }
        }

        // Dry run: any unique conflict aborts before the first mutation
        for (slot, key) in self.views.iter().zip(&keys) {
            if slot.def.uniqueness == Uniqueness::Unique {
                if let Some(existing) = slot.index.first_with_key(key) {
                    self.metrics.record_rejected_insert();
                    observability::trace(
                        "INSERT_REJECTED",
                        &[("view", slot.def.name.as_str())],
                    );
                    return Ok(InsertOutcome {
                        handle: existing,
                        inserted: false,
                    });
                }
            }
        }

        let (handle, seq) = self.store.insert(record);
        for (slot, key) in self.views.iter_mut().zip(keys) {
            slot.index.insert(key, seq, handle);
        }

        self.metrics.record_insert();
        Ok(InsertOutcome {
            handle,
            inserted: true,
        })
    }

    /// Erase a record from every view, returning it.
    ///
    /// The handle is validated first: a stale or foreign handle is a
    /// precondition violation and nothing is touched.
    pub fn erase(&mut self, handle: RecordHandle) -> EngineResult<Record> {
        let (seq, record) = self.store.remove(handle).ok_or(EngineError::StaleHandle)?;

        for slot in &mut self.views {
            let removed = record
                .get(&slot.def.key_field)
                .and_then(|key| slot.index.remove(key, seq));
            if removed.is_none() {
                observability::fatal("VIEW_DESYNC", &[("view", slot.def.name.as_str())]);
                return Err(EngineError::ViewDesync {
                    view: slot.def.name.clone(),
                });
            }
        }

        self.metrics.record_erase();
        Ok(record)
    }

    /// Look up a live record
    pub fn get(&self, handle: RecordHandle) -> Option<&Record> {
        self.store.get(handle)
    }

    /// Whether the handle denotes a live record in this container
    pub fn contains(&self, handle: RecordHandle) -> bool {
        self.store.contains(handle)
    }

    /// Access a view by name
    pub fn view(&self, name: &str) -> EngineResult<ViewRef<'_>> {
        let slot = self
            .views
            .iter()
            .find(|slot| slot.def.name == name)
            .ok_or_else(|| EngineError::UnknownView(name.to_string()))?;
        Ok(ViewRef {
            store: &self.store,
            slot,
        })
    }

    /// View names in declaration order
    pub fn view_names(&self) -> impl Iterator<Item = &str> {
        self.views.iter().map(|slot| slot.def.name.as_str())
    }

    /// Total live records
    pub fn size(&self) -> usize {
        self.store.len()
    }

    /// Whether the container holds no records
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Operation counters
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Read access to one view, with handles resolved to records.
#[derive(Clone, Copy)]
pub struct ViewRef<'a> {
    store: &'a RecordStore,
    slot: &'a ViewSlot,
}

impl<'a> ViewRef<'a> {
    /// The view's declaration
    pub fn def(&self) -> &'a ViewDef {
        let slot = self.slot;
        &slot.def
    }

    /// View name
    pub fn name(&self) -> &'a str {
        self.def().name.as_str()
    }

    /// Entries in this view; equals the container size between completed
    /// operations
    pub fn len(&self) -> usize {
        self.slot.index.len()
    }

    /// Whether the view holds no entries
    pub fn is_empty(&self) -> bool {
        self.slot.index.is_empty()
    }

    /// Records sharing this key. Zero for absent keys.
    pub fn count(&self, key: &FieldValue) -> usize {
        self.slot.index.count(key)
    }

    /// Records with key strictly less than `key`. Ranked views only.
    pub fn rank(&self, key: &FieldValue) -> EngineResult<usize> {
        let slot = self.slot;
        slot.index
            .rank(key)
            .ok_or_else(|| EngineError::RankUnsupported(slot.def.name.clone()))
    }

    /// The equivalence run for `key`: lazy, ascending, FIFO within the
    /// key. Restartable: each call starts a fresh iteration.
    pub fn find(&self, key: &FieldValue) -> impl Iterator<Item = &'a Record> + 'a {
        let slot = self.slot;
        let store = self.store;
        slot.index.range(key).filter_map(move |h| store.get(h))
    }

    /// All records in key order
    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + 'a {
        let slot = self.slot;
        let store = self.store;
        slot.index.iter().filter_map(move |h| store.get(h))
    }

    /// Tree nodes this view visited since the last reset
    pub fn probes(&self) -> u64 {
        self.slot.index.probes()
    }

    /// Reset the view's probe counter
    pub fn reset_probes(&self) {
        self.slot.index.reset_probes();
    }
}
