//! Ranked index: subtree-size augmented ordered index
//!
//! The same AVL discipline and (key, seq) ordering as the baseline
//! ordered index, with every node carrying the size of its subtree.
//! Sizes let a single root-to-leaf descent answer "how many entries sit
//! strictly below this key", which turns both `rank` and `count` into
//! O(log n) operations no matter how many entries share a key.
//!
//! Size maintenance is woven into the same primitives that maintain
//! height: `update` recomputes both from the children, and each rotation
//! recomputes exactly the two nodes it relinks, so rebalancing stays
//! O(1) per step and O(log n) per operation.

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
    /// 1 + size(left) + size(right)
    size: usize,
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
            size: 1,
            left: None,
            right: None,
        })
    }
}

fn height(link: &Link) -> u8 {
    link.as_ref().map_or(0, |node| node.height)
}

fn size(link: &Link) -> usize {
    link.as_ref().map_or(0, |node| node.size)
}

/// Recompute height and size from the children. Every structural change
/// to a node's child set is followed by exactly one `update`.
fn update(node: &mut Node) {
    node.height = 1 + height(&node.left).max(height(&node.right));
    node.size = 1 + size(&node.left) + size(&node.right);
}

fn balance(node: &Node) -> i8 {
    height(&node.left) as i8 - height(&node.right) as i8
}

fn balance_of(link: &Link) -> i8 {
    link.as_ref().map_or(0, |node| balance(node))
}

/// Relink `node` with its left child, recomputing height and size for
/// exactly the two nodes whose child sets changed. The subtrees hanging
/// off them are untouched, so the extra work per rotation is constant.
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

/// Balanced ordered index with O(log n) rank and count.
#[derive(Debug, Default)]
pub struct RankedIndex {
    root: Link,
    len: usize,
    probes: ProbeCounter,
}

impl RankedIndex {
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

    /// Number of entries with key strictly less than `key`.
    ///
    /// One descent: going right past a smaller-keyed node banks that node
    /// plus its entire left subtree. O(log n); an absent key is not an
    /// error, the result is simply how many entries sit below it.
    pub fn rank(&self, key: &FieldValue) -> usize {
        let mut current = self.root.as_deref();
        let mut below = 0;
        while let Some(node) = current {
            self.probes.bump();
            if node.key < *key {
                below += 1 + size(&node.left);
                current = node.right.as_deref();
            } else {
                current = node.left.as_deref();
            }
        }
        below
    }

    /// Number of entries with key less than or equal to `key`
    fn rank_upper(&self, key: &FieldValue) -> usize {
        let mut current = self.root.as_deref();
        let mut below = 0;
        while let Some(node) = current {
            self.probes.bump();
            if node.key <= *key {
                below += 1 + size(&node.left);
                current = node.right.as_deref();
            } else {
                current = node.left.as_deref();
            }
        }
        below
    }

    /// Entries with this key: the difference of the two boundary ranks.
    ///
    /// Two O(log n) descents, independent of how many entries share the
    /// key. This is the payoff the size augmentation exists to deliver.
    pub fn count(&self, key: &FieldValue) -> usize {
        self.rank_upper(key) - self.rank(key)
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

impl KeyedIndex for RankedIndex {
    fn insert(&mut self, key: FieldValue, seq: u64, handle: RecordHandle) {
        RankedIndex::insert(self, key, seq, handle);
    }

    fn remove(&mut self, key: &FieldValue, seq: u64) -> Option<RecordHandle> {
        RankedIndex::remove(self, key, seq)
    }

    fn first_with_key(&self, key: &FieldValue) -> Option<RecordHandle> {
        RankedIndex::first_with_key(self, key)
    }

    fn count(&self, key: &FieldValue) -> usize {
        RankedIndex::count(self, key)
    }

    fn rank(&self, key: &FieldValue) -> Option<usize> {
        Some(RankedIndex::rank(self, key))
    }

    fn len(&self) -> usize {
        RankedIndex::len(self)
    }

    fn range<'a>(&'a self, key: &FieldValue) -> Box<dyn Iterator<Item = RecordHandle> + 'a> {
        Box::new(RankedIndex::range(self, key))
    }

    fn iter<'a>(&'a self) -> Box<dyn Iterator<Item = RecordHandle> + 'a> {
        Box::new(RankedIndex::iter(self))
    }

    fn probes(&self) -> u64 {
        RankedIndex::probes(self)
    }

    fn reset_probes(&self) {
        RankedIndex::reset_probes(self);
    }
}

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
