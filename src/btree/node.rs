// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! B+-tree node structures for internal and leaf nodes.
//!
//! `LeafNode` holds the two parallel key/value arrays that are the sole
//! source of truth for the map's contents. `InternalNode` holds only routing
//! information: a child per subtree and, in parallel, the largest key
//! present in that subtree (its "max key"). Both are generic over the
//! comparator so ordering is always delegated to the caller-supplied order,
//! never to a hardcoded `Ord` bound on the node itself.
//!
//! ## Node sharing
//!
//! Nodes are held behind [`Link`], an `Rc<Node<K, V>>`. A node is private to
//! its tree when `Rc::strong_count(&link) == 1`; it becomes shared the
//! moment a second tree (produced by [`crate::OrdMap::clone`]) takes a
//! second reference to the same root. Mutators never inspect the strong
//! count directly — they call `Rc::make_mut`, which clones the pointee in
//! place exactly when it is aliased and returns a plain `&mut` otherwise.
//! That single call *is* the copy-on-write un-sharing step spec'd as "clone,
//! clear the shared bit, relink into the parent": `Rc::make_mut` does all
//! three atomically from the caller's point of view.

use crate::comparator::Comparator;
use std::rc::Rc;

/// Shared handle to a node. Aliased by every tree produced through `clone`
/// until the first write un-shares it via [`Rc::make_mut`].
pub type Link<K, V> = Rc<Node<K, V>>;

/// A single B+-tree node: either a leaf holding data or an internal node
/// holding routing information. All leaves sit at the same depth from the
/// root (spec invariant 3); `Node` itself does not track depth — the tree
/// facade does, since only it knows where the root is.
#[derive(Debug, Clone)]
pub enum Node<K, V> {
    Leaf(LeafNode<K, V>),
    Internal(InternalNode<K, V>),
}

impl<K, V> Node<K, V> {
    /// A fresh, empty leaf — the initial root of every new tree and the
    /// replacement root after [`crate::OrdMap::clear`].
    pub fn empty_leaf() -> Self {
        Node::Leaf(LeafNode::new())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Leaf(leaf) => leaf.keys.len(),
            Node::Internal(internal) => internal.children.len(),
        }
    }

    /// The node's own "max key": the largest key anywhere in its subtree.
    /// `None` only for an empty leaf (an empty tree has no max key at all).
    pub fn max_key(&self) -> Option<&K> {
        match self {
            Node::Leaf(leaf) => leaf.keys.last(),
            Node::Internal(internal) => internal.max_keys.last(),
        }
    }
}

/// Leaf node: two equal-length, ascending-ordered arrays. `keys[i]` pairs
/// with `values[i]`.
///
/// ## Invariants
/// - `keys.len() == values.len()`
/// - `keys` strictly ascending under the tree's comparator
/// - `keys.len() <= max_node_size`, except transiently mid-delete
#[derive(Debug, Clone)]
pub struct LeafNode<K, V> {
    pub keys: Vec<K>,
    pub values: Vec<V>,
}

/// Outcome of inserting into a leaf.
pub enum LeafInsert<K, V> {
    /// The key already existed and was (maybe) overwritten; size unchanged.
    Overwritten,
    /// The key was new and fit without a split; size grew by one.
    Inserted,
    /// The key was new but the leaf was full. It split: `self` retains the
    /// left half (already containing the new entry if it belongs there),
    /// and `sibling` is the new right half the caller must link in.
    Split { sibling: LeafNode<K, V> },
}

/// Outcome of deleting from a leaf.
pub enum LeafDelete {
    /// The key was not present; nothing changed.
    Absent,
    /// The key was removed. `new_len` is the leaf's size afterwards —
    /// callers compare it against `min_keys` to decide whether to
    /// borrow/merge.
    Removed { new_len: usize },
}

impl<K, V> LeafNode<K, V> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            keys: Vec::with_capacity(cap),
            values: Vec::with_capacity(cap),
        }
    }

    /// Binary search for `key`, using the caller's comparator rather than
    /// `K: Ord` — this is the one seam where the "opaque total order"
    /// contract (spec.md §4.1) actually gets exercised.
    fn search(&self, key: &K, cmp: &impl Comparator<K>) -> Result<usize, usize> {
        self.keys.binary_search_by(|probe| cmp.compare(probe, key))
    }

    pub fn get(&self, key: &K, cmp: &impl Comparator<K>) -> Option<&V> {
        self.search(key, cmp).ok().map(|idx| &self.values[idx])
    }

    pub fn contains(&self, key: &K, cmp: &impl Comparator<K>) -> bool {
        self.search(key, cmp).is_ok()
    }

    /// Insert `(key, value)`, splitting at `max_node_size` if necessary.
    ///
    /// `overwrite` controls the behaviour on an exact match: when `true`
    /// both the stored key and value are replaced (spec.md §4.1 — "replacing
    /// the key matters only when equal-but-distinguishable objects carry
    /// payload outside the ordering"); when `false` the existing entry is
    /// left untouched.
    pub fn insert(
        &mut self,
        key: K,
        value: V,
        overwrite: bool,
        max_node_size: usize,
        cmp: &impl Comparator<K>,
    ) -> LeafInsert<K, V> {
        match self.search(&key, cmp) {
            Ok(idx) => {
                if overwrite {
                    self.keys[idx] = key;
                    self.values[idx] = value;
                }
                LeafInsert::Overwritten
            }
            Err(idx) => {
                if self.keys.len() < max_node_size {
                    self.keys.insert(idx, key);
                    self.values.insert(idx, value);
                    LeafInsert::Inserted
                } else {
                    let sibling = self.split_and_insert(idx, key, value);
                    LeafInsert::Split { sibling }
                }
            }
        }
    }

    /// Split this full leaf into a left half (kept in `self`) and a right
    /// half (returned), then insert `(key, value)` into whichever half
    /// covers its position. Left keeps `ceil(M/2)` entries, matching
    /// spec.md §4.2 exactly.
    fn split_and_insert(&mut self, insert_at: usize, key: K, value: V) -> LeafNode<K, V> {
        let left_len = self.keys.len().div_ceil(2);

        let mut right_keys = self.keys.split_off(left_len);
        let mut right_values = self.values.split_off(left_len);

        if insert_at <= left_len {
            self.keys.insert(insert_at, key);
            self.values.insert(insert_at, value);
        } else {
            right_keys.insert(insert_at - left_len, key);
            right_values.insert(insert_at - left_len, value);
        }

        LeafNode {
            keys: right_keys,
            values: right_values,
        }
    }

    pub fn delete(&mut self, key: &K, cmp: &impl Comparator<K>) -> LeafDelete {
        match self.search(key, cmp) {
            Err(_) => LeafDelete::Absent,
            Ok(idx) => {
                self.keys.remove(idx);
                self.values.remove(idx);
                LeafDelete::Removed {
                    new_len: self.keys.len(),
                }
            }
        }
    }

    /// Move the last `count` entries out of `self` into a new leaf, for use
    /// when borrowing from a left sibling (the left sibling gives up its
    /// tail, which becomes the new head of the underflowed right sibling).
    pub fn pop_tail(&mut self, count: usize) -> (Vec<K>, Vec<V>) {
        let split_at = self.keys.len() - count;
        (self.keys.split_off(split_at), self.values.split_off(split_at))
    }

    /// Move the first `count` entries out of `self`, for borrowing from a
    /// right sibling.
    pub fn pop_head(&mut self, count: usize) -> (Vec<K>, Vec<V>) {
        let tail_keys = self.keys.split_off(count);
        let tail_values = self.values.split_off(count);
        let head_keys = std::mem::replace(&mut self.keys, tail_keys);
        let head_values = std::mem::replace(&mut self.values, tail_values);
        (head_keys, head_values)
    }

    pub fn prepend(&mut self, mut keys: Vec<K>, mut values: Vec<V>) {
        keys.extend(std::mem::take(&mut self.keys));
        values.extend(std::mem::take(&mut self.values));
        self.keys = keys;
        self.values = values;
    }

    pub fn append(&mut self, mut keys: Vec<K>, mut values: Vec<V>) {
        self.keys.append(&mut keys);
        self.values.append(&mut values);
    }

    pub fn merge_from(&mut self, mut other: LeafNode<K, V>) {
        self.keys.append(&mut other.keys);
        self.values.append(&mut other.values);
    }
}

impl<K, V> Default for LeafNode<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal node: a sequence of children and, in parallel, the largest key
/// in each child's subtree.
///
/// ## Invariants
/// - `children.len() == max_keys.len()`
/// - `max_keys` ascending under the tree's comparator
/// - `max_keys[i]` equals the max key of `children[i]`'s subtree
#[derive(Debug, Clone)]
pub struct InternalNode<K, V> {
    pub children: Vec<Link<K, V>>,
    pub max_keys: Vec<K>,
}

/// Outcome of inserting a new child (from a split below) into an internal
/// node.
pub enum InternalInsert<K, V> {
    Inserted,
    Split { sibling: InternalNode<K, V> },
}

impl<K, V> InternalNode<K, V> {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            max_keys: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Index of the child whose subtree should contain `key`: the smallest
    /// index whose max-key is `>= key`, or the last child if `key` exceeds
    /// every max-key (insertion mode — the rightmost child absorbs new
    /// maximums). Lookup mode (spec.md §4.3) is identical; "not found" is
    /// left to the caller, since an internal node alone cannot tell absence
    /// of the key from "falls past the last max-key but exists below".
    pub fn child_index(&self, key: &K, cmp: &impl Comparator<K>) -> usize {
        match self
            .max_keys
            .binary_search_by(|probe| cmp.compare(probe, key))
        {
            Ok(idx) => idx,
            Err(idx) => {
                if idx == self.max_keys.len() {
                    idx - 1
                } else {
                    idx
                }
            }
        }
    }

    /// `maxKey()` is `O(1)`: the last max-key is, by invariant, the max key
    /// of the whole subtree (spec.md §4.3).
    pub fn max_key(&self) -> Option<&K> {
        self.max_keys.last()
    }

    pub fn set_child_max_key(&mut self, idx: usize, new_max_key: K) {
        self.max_keys[idx] = new_max_key;
    }

    /// Insert a new `(max_key, child)` pair produced by a split below
    /// `at_index`, splitting this node in turn if it overflows.
    pub fn insert_child(
        &mut self,
        at_index: usize,
        max_key: K,
        child: Link<K, V>,
        max_node_size: usize,
    ) -> InternalInsert<K, V> {
        self.max_keys.insert(at_index, max_key);
        self.children.insert(at_index, child);

        if self.children.len() <= max_node_size {
            InternalInsert::Inserted
        } else {
            let sibling = self.split();
            InternalInsert::Split { sibling }
        }
    }

    /// Split into a left half (kept) and right half (returned). Left keeps
    /// `ceil(M/2)` children, symmetric with leaf split (spec.md §4.3).
    fn split(&mut self) -> InternalNode<K, V> {
        let left_len = self.children.len().div_ceil(2);
        let right_children = self.children.split_off(left_len);
        let right_max_keys = self.max_keys.split_off(left_len);
        InternalNode {
            children: right_children,
            max_keys: right_max_keys,
        }
    }

    pub fn remove_child(&mut self, idx: usize) -> Link<K, V> {
        self.max_keys.remove(idx);
        self.children.remove(idx)
    }

    pub fn is_underflow(&self, max_node_size: usize) -> bool {
        self.children.len() < min_children(max_node_size)
    }

    /// Move the last `count` `(max_key, child)` pairs out, for lending to an
    /// underflowed right sibling during borrow.
    pub fn pop_tail_children(&mut self, count: usize) -> (Vec<K>, Vec<Link<K, V>>) {
        let split_at = self.children.len() - count;
        (
            self.max_keys.split_off(split_at),
            self.children.split_off(split_at),
        )
    }

    /// Move the first `count` pairs out, for lending to an underflowed left
    /// sibling during borrow.
    pub fn pop_head_children(&mut self, count: usize) -> (Vec<K>, Vec<Link<K, V>>) {
        let tail_keys = self.max_keys.split_off(count);
        let tail_children = self.children.split_off(count);
        let head_keys = std::mem::replace(&mut self.max_keys, tail_keys);
        let head_children = std::mem::replace(&mut self.children, tail_children);
        (head_keys, head_children)
    }

    pub fn prepend_children(&mut self, mut max_keys: Vec<K>, mut children: Vec<Link<K, V>>) {
        max_keys.extend(std::mem::take(&mut self.max_keys));
        children.extend(std::mem::take(&mut self.children));
        self.max_keys = max_keys;
        self.children = children;
    }

    pub fn append_children(&mut self, mut max_keys: Vec<K>, mut children: Vec<Link<K, V>>) {
        self.max_keys.append(&mut max_keys);
        self.children.append(&mut children);
    }

    pub fn merge_from(&mut self, mut other: InternalNode<K, V>) {
        self.max_keys.append(&mut other.max_keys);
        self.children.append(&mut other.children);
    }
}

impl<K, V> Default for InternalNode<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Minimum non-root node size: `ceil(M/2)`, spec.md §3 invariant 6.
pub fn min_children(max_node_size: usize) -> usize {
    max_node_size.div_ceil(2)
}
