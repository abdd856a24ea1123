//! Record store: slot arena with stable handles
//!
//! The store owns every live record. A handle names one record for its
//! whole lifetime: it stays valid across unrelated insertions and
//! erasures and is invalidated the instant its record is erased.
//!
//! # Invariants
//!
//! - Slots are reused, but every reuse bumps the slot generation, so a
//!   retained handle to an erased record fails validation instead of
//!   aliasing the slot's new occupant
//! - Sequence numbers increase strictly and are never reused

use serde::{Deserialize, Serialize};

use super::record::Record;

/// A stable reference to one record in a store.
///
/// Valid until that record is erased; unrelated mutations never move or
/// invalidate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordHandle {
    slot: u32,
    generation: u32,
}

#[derive(Debug)]
struct StoredRecord {
    seq: u64,
    record: Record,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<StoredRecord>,
}

/// The canonical owner of all live records.
#[derive(Debug, Default)]
pub struct RecordStore {
    slots: Vec<Slot>,
    free: Vec<u32>,
    next_seq: u64,
}

impl RecordStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning its handle and insertion sequence number.
    ///
    /// Sequence numbers are strictly monotonic for the store's lifetime.
    pub fn insert(&mut self, record: Record) -> (RecordHandle, u64) {
        let seq = self.next_seq;
        self.next_seq += 1;

        let entry = Some(StoredRecord { seq, record });

        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize].entry = entry;
                slot
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry,
                });
                (self.slots.len() - 1) as u32
            }
        };

        let handle = RecordHandle {
            slot,
            generation: self.slots[slot as usize].generation,
        };
        (handle, seq)
    }

    /// Look up a live record
    pub fn get(&self, handle: RecordHandle) -> Option<&Record> {
        self.stored(handle).map(|stored| &stored.record)
    }

    /// Sequence number of a live record
    pub fn seq_of(&self, handle: RecordHandle) -> Option<u64> {
        self.stored(handle).map(|stored| stored.seq)
    }

    /// Whether the handle denotes a live record in this store
    pub fn contains(&self, handle: RecordHandle) -> bool {
        self.stored(handle).is_some()
    }

    /// Remove a record, freeing its slot.
    ///
    /// The slot generation is bumped so the removed record's handle (and
    /// only that handle) stops validating. Returns the record and its
    /// sequence number, or None for a stale or foreign handle.
    pub fn remove(&mut self, handle: RecordHandle) -> Option<(u64, Record)> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.generation != handle.generation || slot.entry.is_none() {
            return None;
        }

        let stored = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.slot);
        Some((stored.seq, stored.record))
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate live records in slot order
    pub fn iter(&self) -> impl Iterator<Item = (RecordHandle, &Record)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.entry.as_ref().map(|stored| {
                let handle = RecordHandle {
                    slot: i as u32,
                    generation: slot.generation,
                };
                (handle, &stored.record)
            })
        })
    }

    fn stored(&self, handle: RecordHandle) -> Option<&StoredRecord> {
        let slot = self.slots.get(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()
    }
}
