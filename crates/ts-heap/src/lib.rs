//! `ts-heap` — a mergeable Fibonacci min-heap with decrease-key.
//!
//! Backs the shortest-path planner in `ts-net`, which needs amortised-O(1)
//! `decrease_key` on a large open set.
//!
//! # Arena representation
//!
//! The classic Fibonacci heap is a forest of circular doubly linked lists
//! with parent back-references — ownership cycles a pointer rendition cannot
//! express safely.  Here every node is a slot in a `Vec`, and `prev`/`next`/
//! `child`/`parent` are `u32` indices with a [`NONE`] sentinel.  Clients
//! hold opaque [`HeapHandle`]s (slot indices).
//!
//! Slots are tombstoned on extraction rather than reused, so:
//!
//! - a handle stays valid until its item is extracted or removed;
//! - [`FibHeap::merge`] can absorb another heap by appending its arena and
//!   rebasing every index by a single offset, which it returns so callers
//!   holding handles into the absorbed heap can rebase them too.
//!
//! A planner run inserts each graph node exactly once, so the arena never
//! grows beyond the node count.
//!
//! # Complexity
//!
//! | Operation      | Amortised cost |
//! |----------------|----------------|
//! | `insert`       | O(1)           |
//! | `minimum`      | O(1)           |
//! | `extract_min`  | O(log n)       |
//! | `decrease_key` | O(1)           |
//! | `merge`        | O(len(other))  |
//! | `remove`       | O(log n)       |
//!
//! (`merge` is O(1) in the pointer rendition; the arena copy trades that for
//! handle stability and no unsafe code.)

use thiserror::Error;


/// Index sentinel meaning "no node".
const NONE: u32 = u32::MAX;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors produced by heap operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeapError {
    #[error("operation on an empty heap")]
    EmptyHeap,

    #[error("decrease_key called with a key greater than the current key")]
    KeyNotDecreasing,

    #[error("remove sentinel must be strictly less than every current key")]
    SentinelNotBelowMin,

    #[error("handle refers to an extracted or removed item")]
    StaleHandle,
}

/// Shorthand result type for heap operations.
pub type HeapResult<T> = Result<T, HeapError>;

// ── Handle ────────────────────────────────────────────────────────────────────

/// Opaque reference to an item in a [`FibHeap`].
///
/// Valid until the item is extracted or removed.  After
/// [`FibHeap::merge`], handles into the absorbed heap must be rebased with
/// [`HeapHandle::rebased`] using the offset `merge` returned.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct HeapHandle(u32);

impl HeapHandle {
    /// The handle this one becomes after its heap was absorbed by a `merge`
    /// that returned `offset`.
    #[inline]
    pub fn rebased(self, offset: usize) -> HeapHandle {
        HeapHandle(self.0 + offset as u32)
    }
}

// ── Slot ──────────────────────────────────────────────────────────────────────

struct Slot<T, K> {
    key:    K,
    /// `None` marks a tombstone: the item was extracted or removed.
    item:   Option<T>,
    degree: u32,
    mark:   bool,
    parent: u32,
    child:  u32,
    prev:   u32,
    next:   u32,
}

// ── FibHeap ───────────────────────────────────────────────────────────────────

/// A Fibonacci min-heap over payloads `T` keyed by `K`.
///
/// `K` only needs `PartialOrd + Copy`; with floating-point keys the caller
/// is responsible for never inserting NaN.
pub struct FibHeap<T, K> {
    slots: Vec<Slot<T, K>>,
    /// Root holding the minimum key, or `NONE` when empty.
    min:   u32,
    len:   usize,
}

impl<T, K: PartialOrd + Copy> Default for FibHeap<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K: PartialOrd + Copy> FibHeap<T, K> {
    pub fn new() -> Self {
        Self { slots: Vec::new(), min: NONE, len: 0 }
    }

    /// Pre-allocate the arena for `n` inserts.
    pub fn with_capacity(n: usize) -> Self {
        Self { slots: Vec::with_capacity(n), min: NONE, len: 0 }
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // ── Core operations ───────────────────────────────────────────────────

    /// Insert `item` with `key`.  Amortised O(1).
    pub fn insert(&mut self, item: T, key: K) -> HeapHandle {
        let idx = self.slots.len() as u32;
        self.slots.push(Slot {
            key,
            item: Some(item),
            degree: 0,
            mark: false,
            parent: NONE,
            child: NONE,
            prev: idx,
            next: idx,
        });
        self.add_root(idx);
        self.len += 1;
        HeapHandle(idx)
    }

    /// The current minimum as `(payload, key)` without removing it.  O(1).
    pub fn minimum(&self) -> HeapResult<(&T, K)> {
        if self.min == NONE {
            return Err(HeapError::EmptyHeap);
        }
        let slot = &self.slots[self.min as usize];
        match slot.item.as_ref() {
            Some(item) => Ok((item, slot.key)),
            None => unreachable!("min points at a tombstone"),
        }
    }

    /// The key currently associated with `handle`.
    pub fn key(&self, handle: HeapHandle) -> HeapResult<K> {
        let slot = self.slots.get(handle.0 as usize).ok_or(HeapError::StaleHandle)?;
        if slot.item.is_none() {
            return Err(HeapError::StaleHandle);
        }
        Ok(slot.key)
    }

    /// Remove and return the minimum `(payload, key)`.  Amortised O(log n).
    pub fn extract_min(&mut self) -> HeapResult<(T, K)> {
        if self.min == NONE {
            return Err(HeapError::EmptyHeap);
        }
        let m = self.min;
        self.len -= 1;

        // Promote the children of the minimum to roots.
        let child = self.slots[m as usize].child;
        if child != NONE {
            let mut c = child;
            loop {
                self.slots[c as usize].parent = NONE;
                c = self.slots[c as usize].next;
                if c == child {
                    break;
                }
            }
            self.slots[m as usize].child = NONE;
            self.ring_merge(m, child);
        }

        // Detach the minimum from the root ring.
        let successor = self.slots[m as usize].next;
        self.ring_remove(m);

        let key = self.slots[m as usize].key;
        let item = match self.slots[m as usize].item.take() {
            Some(item) => item,
            None => unreachable!("min points at a tombstone"),
        };

        if successor == m {
            // The minimum was the only root and had no children.
            self.min = NONE;
        } else {
            self.consolidate(successor);
        }

        Ok((item, key))
    }

    /// Lower the key of `handle` to `new_key`.  Amortised O(1).
    ///
    /// Fails with [`HeapError::KeyNotDecreasing`] when `new_key` is greater
    /// than the current key (equal is allowed).
    pub fn decrease_key(&mut self, handle: HeapHandle, new_key: K) -> HeapResult<()> {
        let idx = handle.0;
        let slot = self.slots.get(idx as usize).ok_or(HeapError::StaleHandle)?;
        if slot.item.is_none() {
            return Err(HeapError::StaleHandle);
        }
        if new_key > slot.key {
            return Err(HeapError::KeyNotDecreasing);
        }

        self.slots[idx as usize].key = new_key;
        let parent = self.slots[idx as usize].parent;

        if parent != NONE && new_key < self.slots[parent as usize].key {
            self.cut(idx);
            self.cascading_cut(parent);
        }
        if new_key < self.slots[self.min as usize].key {
            self.min = idx;
        }
        Ok(())
    }

    /// Absorb `other`, consuming it.  Returns the offset by which handles
    /// into `other` must be [rebased](HeapHandle::rebased).
    pub fn merge(&mut self, other: FibHeap<T, K>) -> usize {
        let offset = self.slots.len();
        let shift = |idx: u32| if idx == NONE { NONE } else { idx + offset as u32 };

        for slot in other.slots {
            self.slots.push(Slot {
                key:    slot.key,
                item:   slot.item,
                degree: slot.degree,
                mark:   slot.mark,
                parent: shift(slot.parent),
                child:  shift(slot.child),
                prev:   shift(slot.prev),
                next:   shift(slot.next),
            });
        }

        if other.min != NONE {
            let other_min = shift(other.min);
            if self.min == NONE {
                self.min = other_min;
            } else {
                self.ring_merge(self.min, other_min);
                if self.slots[other_min as usize].key < self.slots[self.min as usize].key {
                    self.min = other_min;
                }
            }
        }
        self.len += other.len;
        offset
    }

    /// Remove an arbitrary item.  O(log n).
    ///
    /// `sentinel_below_min` must be strictly less than every key currently
    /// in the heap; the item is first decreased to the sentinel and then
    /// extracted.
    pub fn remove(&mut self, handle: HeapHandle, sentinel_below_min: K) -> HeapResult<T> {
        let (_, min_key) = self.minimum()?;
        if sentinel_below_min >= min_key {
            return Err(HeapError::SentinelNotBelowMin);
        }
        self.decrease_key(handle, sentinel_below_min)?;
        let (item, _) = self.extract_min()?;
        Ok(item)
    }

    // ── Ring plumbing ─────────────────────────────────────────────────────

    /// Splice the ring containing `b` into the ring containing `a`, after `a`.
    fn ring_merge(&mut self, a: u32, b: u32) {
        let a_next = self.slots[a as usize].next;
        let b_prev = self.slots[b as usize].prev;
        self.slots[a as usize].next = b;
        self.slots[b as usize].prev = a;
        self.slots[b_prev as usize].next = a_next;
        self.slots[a_next as usize].prev = b_prev;
    }

    /// Detach `node` from its ring, leaving it as a singleton ring.
    fn ring_remove(&mut self, node: u32) {
        let prev = self.slots[node as usize].prev;
        let next = self.slots[node as usize].next;
        self.slots[prev as usize].next = next;
        self.slots[next as usize].prev = prev;
        self.slots[node as usize].prev = node;
        self.slots[node as usize].next = node;
    }

    /// Add a detached node to the root ring, updating the minimum.
    fn add_root(&mut self, node: u32) {
        self.slots[node as usize].parent = NONE;
        if self.min == NONE {
            self.min = node;
        } else {
            self.ring_merge(self.min, node);
            if self.slots[node as usize].key < self.slots[self.min as usize].key {
                self.min = node;
            }
        }
    }

    // ── Consolidation ─────────────────────────────────────────────────────

    /// Merge roots of equal degree until every root degree is unique, then
    /// recompute the minimum.  `start` is any node of the root ring.
    fn consolidate(&mut self, start: u32) {
        // Collect the roots first; the ring is rebuilt from scratch below.
        let mut roots = Vec::new();
        let mut r = start;
        loop {
            roots.push(r);
            r = self.slots[r as usize].next;
            if r == start {
                break;
            }
        }
        for &root in &roots {
            let slot = &mut self.slots[root as usize];
            slot.prev = root;
            slot.next = root;
            slot.parent = NONE;
        }

        // degree_roots[d] = root with degree d seen so far.
        let mut degree_roots: Vec<u32> = Vec::new();
        for root in roots {
            let mut current = root;
            let mut degree = self.slots[current as usize].degree as usize;
            loop {
                if degree >= degree_roots.len() {
                    degree_roots.resize(degree + 1, NONE);
                }
                let other = degree_roots[degree];
                if other == NONE {
                    break;
                }
                degree_roots[degree] = NONE;
                // The smaller key becomes the parent.
                let (parent, child) =
                    if self.slots[other as usize].key < self.slots[current as usize].key {
                        (other, current)
                    } else {
                        (current, other)
                    };
                self.link_child(parent, child);
                current = parent;
                degree = self.slots[current as usize].degree as usize;
            }
            if degree >= degree_roots.len() {
                degree_roots.resize(degree + 1, NONE);
            }
            degree_roots[degree] = current;
        }

        // Rebuild the root ring from the surviving degree table.
        self.min = NONE;
        for root in degree_roots {
            if root != NONE {
                self.add_root(root);
            }
        }
    }

    /// Make `child` a child of `parent` (both are detached singleton roots).
    fn link_child(&mut self, parent: u32, child: u32) {
        self.slots[child as usize].parent = parent;
        self.slots[child as usize].mark = false;
        let first = self.slots[parent as usize].child;
        if first == NONE {
            self.slots[parent as usize].child = child;
        } else {
            self.ring_merge(first, child);
        }
        self.slots[parent as usize].degree += 1;
    }

    // ── Cuts ──────────────────────────────────────────────────────────────

    /// Move `node` from its parent's child ring to the root ring.
    fn cut(&mut self, node: u32) {
        let parent = self.slots[node as usize].parent;
        let next = self.slots[node as usize].next;
        if self.slots[parent as usize].child == node {
            self.slots[parent as usize].child = if next == node { NONE } else { next };
        }
        self.ring_remove(node);
        self.slots[parent as usize].degree -= 1;
        self.slots[node as usize].mark = false;
        self.add_root(node);
    }

    /// Walk up from `node`, cutting marked ancestors.
    fn cascading_cut(&mut self, mut node: u32) {
        loop {
            let parent = self.slots[node as usize].parent;
            if parent == NONE {
                break;
            }
            if !self.slots[node as usize].mark {
                self.slots[node as usize].mark = true;
                break;
            }
            self.cut(node);
            node = parent;
        }
    }
}
