//! Baseline ordered index
//!
//! An AVL tree over (key, seq). Counting an equivalence class walks the
//! run after a boundary descent, so `count` is O(log n + m) where m is
//! the number of matches. The ranked variant exists to beat exactly that
//! bound.

use std::cmp::Ordering;

use crate::observability::ProbeCounter;
use crate::record::{FieldValue, RecordHandle};

use super::KeyedIndex;

type Link = Option<Box<Node>>;

#[derive(Debug)]
struct Node {
    key: FieldValue,
    seq: u64,
    handle: RecordHandle,
    height: u8,
    left: Link,
    right: Link,
}

impl Node {
    fn leaf(key: FieldValue, seq: u64, handle: RecordHandle) -> Box<Node> {
        Box::new(Node {
            key,
            seq,
            handle,
            height: 1,
            left: None,
            right: None,
        })
    }
}

fn height(link: &Link) -> u8 {
    link.as_ref().map_or(0, |node| node.height)
}

fn update(node: &mut Node) {
    node.height = 1 + height(&node.left).max(height(&node.right));
}

fn balance(node: &Node) -> i8 {
    height(&node.left) as i8 - height(&node.right) as i8
}

fn balance_of(link: &Link) -> i8 {
    link.as_ref().map_or(0, |node| balance(node))
}

/// Relink `node` with its left child and recompute the heights of
/// exactly those two nodes.
fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.left.take() else {
        // A rotation is only requested for a left-heavy node
        return node;
    };
    node.left = pivot.right.take();
    update(&mut node);
    pivot.right = Some(node);
    update(&mut pivot);
    pivot
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    update(&mut node);
    pivot.left = Some(node);
    update(&mut pivot);
    pivot
}

fn rebalance(mut node: Box<Node>) -> Box<Node> {
    update(&mut node);
    let factor = balance(&node);
    if factor > 1 {
        if balance_of(&node.left) < 0 {
            if let Some(left) = node.left.take() {
                node.left = Some(rotate_left(left));
            }
        }
        rotate_right(node)
    } else if factor < -1 {
        if balance_of(&node.right) > 0 {
            if let Some(right) = node.right.take() {
                node.right = Some(rotate_right(right));
            }
        }
        rotate_left(node)
    } else {
        node
    }
}

fn insert_link(link: Link, key: FieldValue, seq: u64, handle: RecordHandle) -> Box<Node> {
    match link {
        None => Node::leaf(key, seq, handle),
        Some(mut node) => {
            let ord = key.cmp(&node.key).then(seq.cmp(&node.seq));
            if ord == Ordering::Less {
                node.left = Some(insert_link(node.left.take(), key, seq, handle));
            } else {
                node.right = Some(insert_link(node.right.take(), key, seq, handle));
            }
            rebalance(node)
        }
    }
}

fn remove_link(link: Link, key: &FieldValue, seq: u64) -> (Link, Option<RecordHandle>) {
    let Some(mut node) = link else {
        return (None, None);
    };
    match key.cmp(&node.key).then(seq.cmp(&node.seq)) {
        Ordering::Less => {
            let (child, removed) = remove_link(node.left.take(), key, seq);
            node.left = child;
            if removed.is_some() {
                (Some(rebalance(node)), removed)
            } else {
                (Some(node), None)
            }
        }
        Ordering::Greater => {
            let (child, removed) = remove_link(node.right.take(), key, seq);
            node.right = child;
            if removed.is_some() {
                (Some(rebalance(node)), removed)
            } else {
                (Some(node), None)
            }
        }
        Ordering::Equal => {
            let handle = node.handle;
            (delete_root(node), Some(handle))
        }
    }
}

/// Standard deletion with in-order successor replacement
fn delete_root(mut node: Box<Node>) -> Link {
    match (node.left.take(), node.right.take()) {
        (None, None) => None,
        (Some(child), None) | (None, Some(child)) => Some(child),
        (Some(left), Some(right)) => {
            let (rest, mut successor) = take_min(right);
            successor.left = Some(left);
            successor.right = rest;
            Some(rebalance(successor))
        }
    }
}

fn take_min(mut node: Box<Node>) -> (Link, Box<Node>) {
    match node.left.take() {
        None => (node.right.take(), node),
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

/// Balanced ordered index without rank support.
#[derive(Debug, Default)]
pub struct OrderedIndex {
    root: Link,
    len: usize,
    probes: ProbeCounter,
}

impl OrderedIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Total entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert an entry; (key, seq) must be fresh
    pub fn insert(&mut self, key: FieldValue, seq: u64, handle: RecordHandle) {
        self.root = Some(insert_link(self.root.take(), key, seq, handle));
        self.len += 1;
    }

    /// Remove the entry with exactly this (key, seq)
    pub fn remove(&mut self, key: &FieldValue, seq: u64) -> Option<RecordHandle> {
        let (root, removed) = remove_link(self.root.take(), key, seq);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Oldest entry with this key
    pub fn first_with_key(&self, key: &FieldValue) -> Option<RecordHandle> {
        let mut current = self.root.as_deref();
        let mut found = None;
        while let Some(node) = current {
            self.probes.bump();
            if node.key < *key {
                current = node.right.as_deref();
            } else {
                if node.key == *key {
                    found = Some(node.handle);
                }
                current = node.left.as_deref();
            }
        }
        found
    }

    /// Entries with this key, by scanning the equivalence run.
    ///
    /// O(log n + m): the boundary descent is logarithmic, the run scan is
    /// linear in the match count.
    pub fn count(&self, key: &FieldValue) -> usize {
        self.range(key).count()
    }

    /// Lazy iterator over the equivalence run for `key`
    pub fn range(&self, key: &FieldValue) -> RangeIter<'_> {
        RangeIter {
            stack: lower_bound_stack(self.root.as_deref(), key, &self.probes),
            key: key.clone(),
            probes: &self.probes,
        }
    }

    /// Lazy in-order iterator over all entries
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter {
            stack: Vec::new(),
            probes: &self.probes,
        };
        iter.push_left_spine(self.root.as_deref());
        iter
    }

    /// Nodes visited since the last reset
    pub fn probes(&self) -> u64 {
        self.probes.get()
    }

    /// Reset the probe counter
    pub fn reset_probes(&self) {
        self.probes.reset();
    }

    #[cfg(test)]
    fn root(&self) -> &Link {
        &self.root
    }
}

impl KeyedIndex for OrderedIndex {
    fn insert(&mut self, key: FieldValue, seq: u64, handle: RecordHandle) {
        OrderedIndex::insert(self, key, seq, handle);
    }

    fn remove(&mut self, key: &FieldValue, seq: u64) -> Option<RecordHandle> {
        OrderedIndex::remove(self, key, seq)
    }

    fn first_with_key(&self, key: &FieldValue) -> Option<RecordHandle> {
        OrderedIndex::first_with_key(self, key)
    }

    fn count(&self, key: &FieldValue) -> usize {
        OrderedIndex::count(self, key)
    }

    fn rank(&self, _key: &FieldValue) -> Option<usize> {
        None
    }

    fn len(&self) -> usize {
        OrderedIndex::len(self)
    }

    fn range<'a>(&'a self, key: &FieldValue) -> Box<dyn Iterator<Item = RecordHandle> + 'a> {
        Box::new(OrderedIndex::range(self, key))
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = RecordHandle> + 'a> {
        Box::new(OrderedIndex::iter(self))
    }

    fn probes(&self) -> u64 {
        OrderedIndex::probes(self)
    }

    fn reset_probes(&self) {
        OrderedIndex::reset_probes(self);
    }
}

/// Descend to the lower bound of `key`, stacking every node whose key is
/// >= `key`; the stack top is the first entry of the equivalence run.
fn lower_bound_stack<'a>(
    root: Option<&'a Node>,
    key: &FieldValue,
    probes: &ProbeCounter,
) -> Vec<&'a Node> {
    let mut stack = Vec::new();
    let mut current = root;
    while let Some(node) = current {
        probes.bump();
        if node.key < *key {
            current = node.right.as_deref();
        } else {
            stack.push(node);
            current = node.left.as_deref();
        }
    }
    stack
}

/// In-order iterator over a whole index
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
    probes: &'a ProbeCounter,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut link: Option<&'a Node>) {
        while let Some(node) = link {
            self.probes.bump();
            self.stack.push(node);
            link = node.left.as_deref();
        }
    }
}

impl Iterator for Iter<'_> {
    type Item = RecordHandle;

    fn next(&mut self) -> Option<RecordHandle> {
        let node = self.stack.pop()?;
        let right = node.right.as_deref();
        self.push_left_spine(right);
        Some(node.handle)
    }
}

/// In-order iterator over one equivalence run
pub struct RangeIter<'a> {
    stack: Vec<&'a Node>,
    key: FieldValue,
    probes: &'a ProbeCounter,
}

impl Iterator for RangeIter<'_> {
    type Item = RecordHandle;

    fn next(&mut self) -> Option<RecordHandle> {
        let node = self.stack.pop()?;
        if node.key != self.key {
            // Past the run; nothing further can match
            self.stack.clear();
            return None;
        }
        let mut link = node.right.as_deref();
        while let Some(next) = link {
            self.probes.bump();
            self.stack.push(next);
            link = next.left.as_deref();
        }
        Some(node.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Record, RecordStore};

    fn handle(store: &mut RecordStore, age: i64) -> (RecordHandle, u64) {
        store.insert(Record::builder().field("age", age).build())
    }

    fn int(v: i64) -> FieldValue {
        FieldValue::from_int(v)
    }

    /// Walks the whole tree asserting AVL balance and (key, seq) order;
    /// returns the node count.
    fn assert_invariants(index: &OrderedIndex) -> usize {
        fn walk(link: &Link, entries: &mut Vec<(FieldValue, u64)>) -> u8 {
            let Some(node) = link.as_ref() else {
                return 0;
            };
            let left = walk(&node.left, entries);
            entries.push((node.key.clone(), node.seq));
            let right = walk(&node.right, entries);

            assert_eq!(node.height, 1 + left.max(right), "stale height");
            assert!(
                (left as i8 - right as i8).abs() <= 1,
                "balance factor out of range"
            );
            node.height
        }

        let mut entries = Vec::new();
        walk(index.root(), &mut entries);
        for pair in entries.windows(2) {
            assert!(pair[0] < pair[1], "in-order traversal not sorted");
        }
        entries.len()
    }

    #[test]
    fn test_insert_sorted_iteration() {
        let mut store = RecordStore::new();
        let mut index = OrderedIndex::new();

        for age in [5i64, 1, 9, 3, 7, 2, 8, 4, 6, 0] {
            let (h, seq) = handle(&mut store, age);
            index.insert(int(age), seq, h);
        }

        assert_eq!(index.len(), 10);
        assert_eq!(assert_invariants(&index), 10);
        assert_eq!(index.iter().count(), 10);
    }

    #[test]
    fn test_duplicates_fifo_within_key() {
        let mut store = RecordStore::new();
        let mut index = OrderedIndex::new();

        let mut inserted = Vec::new();
        for _ in 0..5 {
            let (h, seq) = handle(&mut store, 42);
            index.insert(int(42), seq, h);
            inserted.push(h);
        }
        // An unrelated key on each side of the run
        let (lo, lo_seq) = handle(&mut store, 41);
        index.insert(int(41), lo_seq, lo);
        let (hi, hi_seq) = handle(&mut store, 43);
        index.insert(int(43), hi_seq, hi);

        let run: Vec<RecordHandle> = index.range(&int(42)).collect();
        assert_eq!(run, inserted, "equivalence run must be FIFO");
        assert_eq!(index.first_with_key(&int(42)), Some(inserted[0]));
    }

    #[test]
    fn test_count_scans_the_run() {
        let mut store = RecordStore::new();
        let mut index = OrderedIndex::new();

        for i in 1..=10i64 {
            for _ in 0..2 * i {
                let (h, seq) = handle(&mut store, 40 + i);
                index.insert(int(40 + i), seq, h);
            }
        }

        for i in 0..=10i64 {
            assert_eq!(index.count(&int(40 + i)), (2 * i) as usize);
        }
        assert_eq!(index.count(&int(0)), 0);
        assert_eq!(index.count(&int(60)), 0);
        assert_invariants(&index);
    }

    #[test]
    fn test_remove_keeps_balance() {
        let mut store = RecordStore::new();
        let mut index = OrderedIndex::new();

        let mut entries = Vec::new();
        for age in 0..100i64 {
            let (h, seq) = handle(&mut store, age);
            index.insert(int(age), seq, h);
            entries.push((age, seq, h));
        }

        for (age, seq, h) in entries.iter().filter(|(age, _, _)| age % 2 == 0) {
            assert_eq!(index.remove(&int(*age), *seq), Some(*h));
        }

        assert_eq!(index.len(), 50);
        assert_eq!(assert_invariants(&index), 50);
        for age in 0..100i64 {
            let expected = if age % 2 == 0 { 0 } else { 1 };
            assert_eq!(index.count(&int(age)), expected);
        }
    }

    #[test]
    fn test_remove_absent_is_none() {
        let mut store = RecordStore::new();
        let mut index = OrderedIndex::new();

        let (h, seq) = handle(&mut store, 1);
        index.insert(int(1), seq, h);

        assert_eq!(index.remove(&int(2), seq), None);
        assert_eq!(index.remove(&int(1), seq + 1), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_ascending_and_descending_insertions_stay_balanced() {
        let mut store = RecordStore::new();

        let mut ascending = OrderedIndex::new();
        for age in 0..64i64 {
            let (h, seq) = handle(&mut store, age);
            ascending.insert(int(age), seq, h);
        }
        assert_invariants(&ascending);

        let mut descending = OrderedIndex::new();
        for age in (0..64i64).rev() {
            let (h, seq) = handle(&mut store, age);
            descending.insert(int(age), seq, h);
        }
        assert_invariants(&descending);
    }

    #[test]
    fn test_range_restartable() {
        let mut store = RecordStore::new();
        let mut index = OrderedIndex::new();

        for _ in 0..3 {
            let (h, seq) = handle(&mut store, 7);
            index.insert(int(7), seq, h);
        }

        let first: Vec<RecordHandle> = index.range(&int(7)).collect();
        let second: Vec<RecordHandle> = index.range(&int(7)).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_no_rank_capability() {
        let index = OrderedIndex::new();
        assert_eq!(KeyedIndex::rank(&index, &int(1)), None);
    }
}
