// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `OrdMap`: the B+-tree facade — root pointer, size, configuration, and the
//! public entry points described in spec.md §4.4.
//!
//! Recursive insert/delete live here rather than on the node types
//! themselves because un-sharing is a whole-path concern: every node from
//! root to the mutated leaf must be privately owned before the mutation is
//! applied, and only the facade's recursion walks that whole path in one
//! call.

use crate::btree::node::{
    min_children, InternalInsert, InternalNode, LeafInsert, Link, Node,
};
use crate::comparator::{Comparator, DefaultComparator};
use crate::error::{OrdError, OrdResult};
use std::fmt;
use std::rc::Rc;

/// Default branching factor when none is supplied, matching spec.md §3's
/// "default around 32-64".
pub const DEFAULT_MAX_NODE_SIZE: u16 = 64;

/// Lower clamp on `max_node_size` (spec.md §3).
pub const MIN_MAX_NODE_SIZE: u16 = 4;

/// Upper clamp on `max_node_size` (spec.md §3).
pub const MAX_MAX_NODE_SIZE: u16 = 256;

fn clamp_max_node_size(requested: u16) -> usize {
    requested.clamp(MIN_MAX_NODE_SIZE, MAX_MAX_NODE_SIZE) as usize
}

/// An ordered in-memory key-value container backed by a copy-on-write
/// B+-tree.
///
/// ## Type parameters
/// - `K`: key type; compared via `C`, cloned whenever a copy must be
///   promoted to an ancestor's max-key array.
/// - `V`: value type; cloned on materialisation (`to_vec`, `values_vec`, ...)
///   and on borrow/merge during delete.
/// - `C`: the comparator, defaulting to [`DefaultComparator`] (`K`'s own
///   `Ord`).
///
/// ## Cloning
/// [`OrdMap::clone`] is the O(1) logical clone of spec.md §4.4: it takes a
/// second [`Rc`] reference to the same root. Both trees remain independently
/// mutable afterwards — the first write on either side privately clones
/// whatever nodes it touches via [`Rc::make_mut`], leaving the other tree's
/// view untouched.
pub struct OrdMap<K, V, C = DefaultComparator> {
    pub(crate) root: Link<K, V>,
    pub(crate) len: usize,
    pub(crate) height: usize,
    pub(crate) max_node_size: usize,
    pub(crate) comparator: C,
    pub(crate) frozen: bool,
}

impl<K, V> OrdMap<K, V, DefaultComparator>
where
    K: Ord + Clone,
    V: Clone,
{
    /// A new, empty tree using the default (`K: Ord`) comparator and the
    /// default branching factor.
    pub fn new() -> Self {
        Self::with_max_node_size(DEFAULT_MAX_NODE_SIZE)
    }

    /// A new, empty tree with a caller-chosen branching factor, clamped to
    /// `[4, 256]`.
    pub fn with_max_node_size(max_node_size: u16) -> Self {
        Self::with_comparator_and_size(DefaultComparator, max_node_size)
    }

    /// Build a tree from an initial pair list. Later duplicates win (spec.md
    /// §8 property 5), matching [`OrdMap::set`] with `overwrite = true`.
    pub fn from_pairs<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        let mut tree = Self::new();
        tree.set_range(pairs);
        tree
    }
}

impl<K, V, C> OrdMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    /// A new, empty tree using a caller-supplied comparator and the default
    /// branching factor.
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_comparator_and_size(comparator, DEFAULT_MAX_NODE_SIZE)
    }

    /// A new, empty tree using a caller-supplied comparator and branching
    /// factor.
    pub fn with_comparator_and_size(comparator: C, max_node_size: u16) -> Self {
        Self {
            root: Rc::new(Node::empty_leaf()),
            len: 0,
            height: 1,
            max_node_size: clamp_max_node_size(max_node_size),
            comparator,
            frozen: false,
        }
    }

    // ---- read ----------------------------------------------------------

    pub fn get(&self, key: &K) -> Option<&V> {
        let mut link = &self.root;
        loop {
            match &**link {
                Node::Leaf(leaf) => return leaf.get(key, &self.comparator),
                Node::Internal(internal) => {
                    let idx = internal.child_index(key, &self.comparator);
                    link = &internal.children[idx];
                }
            }
        }
    }

    /// `get(k, default)`: the convenience default-value shape from spec.md
    /// §6.
    pub fn get_or<'a>(&'a self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    pub fn has(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.has(key)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn min_key(&self) -> Option<&K> {
        let mut link = &self.root;
        loop {
            match &**link {
                Node::Leaf(leaf) => return leaf.keys.first(),
                Node::Internal(internal) => link = &internal.children[0],
            }
        }
    }

    /// `O(1)`: the root's own max-key bookkeeping (spec.md §4.3).
    pub fn max_key(&self) -> Option<&K> {
        self.root.max_key()
    }

    /// Number of levels from root to leaf, inclusive, tracked incrementally
    /// on root splits/collapses rather than recomputed by walking (see
    /// SPEC_FULL.md §9).
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn max_node_size(&self) -> usize {
        self.max_node_size
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    // ---- lifecycle -------------------------------------------------------

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    pub fn clear(&mut self) -> OrdResult<()> {
        self.ensure_mutable("clear")?;
        self.root = Rc::new(Node::empty_leaf());
        self.len = 0;
        self.height = 1;
        Ok(())
    }

    pub(crate) fn ensure_mutable(&self, operation: &'static str) -> OrdResult<()> {
        if self.frozen {
            Err(OrdError::FrozenMutation { operation })
        } else {
            Ok(())
        }
    }

    // ---- write ------------------------------------------------------------

    /// `set(k, v, overwrite)`. Returns `true` iff a new entry was added (not
    /// merely overwritten).
    pub fn set(&mut self, key: K, value: V, overwrite: bool) -> OrdResult<bool> {
        self.ensure_mutable("set")?;
        let added = match insert_rec(
            &mut self.root,
            key,
            value,
            overwrite,
            self.max_node_size,
            &self.comparator,
        ) {
            InsertOutcome::Done { added } => added,
            InsertOutcome::Split { sibling, added } => {
                let left_max = self
                    .root
                    .max_key()
                    .cloned()
                    .expect("tree root is never empty after an insert");
                let right_max = sibling
                    .max_key()
                    .cloned()
                    .expect("a freshly split sibling is never empty");
                let mut new_root = InternalNode::new();
                new_root.children.push(Rc::clone(&self.root));
                new_root.max_keys.push(left_max);
                new_root.children.push(sibling);
                new_root.max_keys.push(right_max);
                self.root = Rc::new(Node::Internal(new_root));
                self.height += 1;
                added
            }
        };
        if added {
            self.len += 1;
        }
        Ok(added)
    }

    /// `setIfNotPresent`: sugar for `set(k, v, overwrite = false)`.
    pub fn set_if_not_present(&mut self, key: K, value: V) -> OrdResult<bool> {
        self.set(key, value, false)
    }

    /// `changeIfPresent`: apply `f` to the existing value in place, doing
    /// nothing if the key is absent.
    pub fn change_if_present(&mut self, key: &K, f: impl FnOnce(&V) -> V) -> OrdResult<bool> {
        self.ensure_mutable("changeIfPresent")?;
        match self.get(key) {
            None => Ok(false),
            Some(existing) => {
                let new_value = f(existing);
                self.set(key.clone(), new_value, true)?;
                Ok(true)
            }
        }
    }

    /// `setRange`: bulk-apply `set`, later duplicates winning.
    pub fn set_range<I: IntoIterator<Item = (K, V)>>(&mut self, pairs: I) {
        for (k, v) in pairs {
            // Construction-time bulk loads are infallible (never frozen);
            // `set` on a non-frozen tree cannot return `Err`.
            self.set(k, v, true).expect("tree is not frozen during set_range");
        }
    }

    /// `delete(k)`. Returns `true` iff an entry was removed.
    pub fn delete(&mut self, key: &K) -> OrdResult<bool> {
        self.ensure_mutable("delete")?;
        let outcome = delete_rec(&mut self.root, key, self.max_node_size, &self.comparator);
        if !outcome.removed {
            return Ok(false);
        }
        self.len -= 1;
        // Root collapse: an internal root with exactly one child adopts
        // that child as the new root (spec.md §4.4).
        loop {
            let collapse = matches!(&*self.root, Node::Internal(internal) if internal.len() == 1);
            if !collapse {
                break;
            }
            let only_child = match &*self.root {
                Node::Internal(internal) => Rc::clone(&internal.children[0]),
                Node::Leaf(_) => unreachable!(),
            };
            self.root = only_child;
            self.height -= 1;
        }
        Ok(true)
    }

    pub fn remove(&mut self, key: &K) -> OrdResult<bool> {
        self.delete(key)
    }

    /// `deleteRange(lo, hi, includeHigh)`: see [`crate::btree::range`].
    pub fn delete_range(&mut self, lo: &K, hi: &K, include_high: bool) -> OrdResult<usize> {
        self.ensure_mutable("deleteRange")?;
        let removed = crate::btree::range::delete_range(
            &mut self.root,
            lo,
            hi,
            include_high,
            &self.comparator,
        );
        self.len -= removed;
        Ok(removed)
    }

    /// `editRange(lo, hi, includeHigh, onFound, c0)`: see
    /// [`crate::btree::range`].
    pub fn edit_range<R>(
        &mut self,
        lo: &K,
        hi: &K,
        include_high: bool,
        c0: usize,
        mut on_found: impl FnMut(&K, &V, usize) -> crate::btree::range::EditOutcome<V, R>,
    ) -> OrdResult<crate::btree::range::EditRangeResult<R>> {
        self.ensure_mutable("editRange")?;
        let result = crate::btree::range::edit_range(
            &mut self.root,
            lo,
            hi,
            include_high,
            c0,
            &self.comparator,
            &mut on_found,
        );
        self.len -= result.deleted;
        Ok(result)
    }

    /// `forRange(lo, hi, includeHigh, onFound, c0)`: read-only scan, never
    /// un-shares.
    pub fn for_range<R>(
        &self,
        lo: &K,
        hi: &K,
        include_high: bool,
        c0: usize,
        mut on_found: impl FnMut(&K, &V, usize) -> Option<R>,
    ) -> ForRangeResult<R> {
        crate::btree::range::for_range(
            &self.root,
            lo,
            hi,
            include_high,
            c0,
            &self.comparator,
            &mut on_found,
        )
    }

    /// `forEachPair(cb(k, v, counter), c0)`.
    pub fn for_each_pair(&self, c0: usize, mut cb: impl FnMut(&K, &V, usize)) {
        let mut counter = c0;
        for (k, v) in self.entries() {
            cb(&k, &v, counter);
            counter += 1;
        }
    }

    /// `forEach(cb(v, k, tree))`.
    pub fn for_each(&self, mut cb: impl FnMut(&V, &K)) {
        for (k, v) in self.entries() {
            cb(&v, &k);
        }
    }

    // ---- iterate ------------------------------------------------------

    /// `entries(lowestKey?)`: ascending cursor starting at the smallest key
    /// `>= lowest_key`, or at `min_key` when `None`.
    pub fn entries(&self) -> crate::btree::cursor::Cursor<K, V> {
        crate::btree::cursor::Cursor::forward(&self.root, None, &self.comparator)
    }

    pub fn entries_from(&self, lowest_key: &K) -> crate::btree::cursor::Cursor<K, V> {
        crate::btree::cursor::Cursor::forward(&self.root, Some(lowest_key), &self.comparator)
    }

    /// `entriesReversed(highestKey?, skipHighest?)`.
    pub fn entries_reversed(&self) -> crate::btree::cursor::Cursor<K, V> {
        crate::btree::cursor::Cursor::reverse(&self.root, None, false, &self.comparator)
    }

    pub fn entries_reversed_from(
        &self,
        highest_key: &K,
        skip_highest: bool,
    ) -> crate::btree::cursor::Cursor<K, V> {
        crate::btree::cursor::Cursor::reverse(
            &self.root,
            Some(highest_key),
            skip_highest,
            &self.comparator,
        )
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.entries().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.entries().map(|(_, v)| v)
    }

    // ---- materialise --------------------------------------------------

    /// `toArray(max?)`.
    pub fn to_vec(&self, max: Option<usize>) -> Vec<(K, V)> {
        match max {
            Some(max) => self.entries().take(max).collect(),
            None => self.entries().collect(),
        }
    }

    pub fn keys_vec(&self) -> Vec<K> {
        self.keys().collect()
    }

    pub fn values_vec(&self) -> Vec<V> {
        self.values().collect()
    }

    /// `getRange(lo, hi, includeHigh, maxLen)`.
    pub fn get_range(
        &self,
        lo: &K,
        hi: &K,
        include_high: bool,
        max_len: Option<usize>,
    ) -> Vec<(K, V)> {
        let mut out = Vec::new();
        self.for_range(lo, hi, include_high, 0, |k, v, _| {
            out.push((k.clone(), v.clone()));
            if let Some(max_len) = max_len {
                if out.len() >= max_len {
                    return Some(());
                }
            }
            None
        });
        out
    }

    // ---- structural audit -----------------------------------------------

    /// `checkValid()`: audits invariants 1-4 of spec.md §3 (sorted leaves,
    /// ascending per-child max-keys, uniform leaf depth, size bookkeeping).
    /// Invariant 6 (minimum fill) is advisory only (spec.md §9, "Under-fill
    /// policy on delete") and is not asserted here.
    pub fn check_valid(&self) -> OrdResult<()> {
        let mut counted = 0usize;
        let leaf_depth = audit_node(&self.root, &self.comparator, 0, &mut counted)?;
        let _ = leaf_depth;
        if counted != self.len {
            return Err(OrdError::InvariantViolation {
                reason: format!(
                    "size mismatch: tree reports {} but in-order count is {}",
                    self.len, counted
                ),
            });
        }
        Ok(())
    }
}

impl<K, V, C> Clone for OrdMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
{
    /// The O(1) logical clone of spec.md §4.4: a second reference to the
    /// same root, sharing the comparator and `max_node_size`. Both trees are
    /// independently mutable afterwards; the shared subtrees are duplicated
    /// lazily by [`Rc::make_mut`] on first write on either side.
    fn clone(&self) -> Self {
        Self {
            root: Rc::clone(&self.root),
            len: self.len,
            height: self.height,
            max_node_size: self.max_node_size,
            comparator: self.comparator.clone(),
            frozen: self.frozen,
        }
    }
}

impl<K, V, C> fmt::Debug for OrdMap<K, V, C>
where
    K: fmt::Debug + Clone,
    V: fmt::Debug + Clone,
    C: Comparator<K>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW_LEN: usize = 8;
        let preview = self.to_vec(Some(PREVIEW_LEN));
        let mut dbg = f.debug_struct("OrdMap");
        dbg.field("len", &self.len)
            .field("height", &self.height)
            .field("max_node_size", &self.max_node_size)
            .field("frozen", &self.frozen)
            .field(
                "entries",
                &format_args!(
                    "{:?}{}",
                    preview,
                    if self.len > PREVIEW_LEN { ", .." } else { "" }
                ),
            );
        dbg.finish()
    }
}

impl<K, V, C> fmt::Display for OrdMap<K, V, C>
where
    K: fmt::Debug + Clone,
    V: fmt::Debug + Clone,
    C: Comparator<K>,
{
    /// `toString()`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrdMap(")?;
        for (i, (k, v)) in self.entries().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}: {:?}", k, v)?;
        }
        write!(f, ")")
    }
}

impl<K, V, C> PartialEq for OrdMap<K, V, C>
where
    K: Clone + PartialEq,
    V: Clone + PartialEq,
    C: Comparator<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.entries().eq(other.entries())
    }
}

impl<K, V> Default for OrdMap<K, V, DefaultComparator>
where
    K: Ord + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for OrdMap<K, V, DefaultComparator>
where
    K: Ord + Clone,
    V: Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl<'a, K, V, C> IntoIterator for &'a OrdMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    type Item = (K, V);
    type IntoIter = crate::btree::cursor::Cursor<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl<K, V, C> IntoIterator for OrdMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    type Item = (K, V);
    type IntoIter = crate::btree::cursor::Cursor<K, V>;

    /// By-value iteration. `Cursor` already owns its path as `Rc` clones
    /// rather than borrowing into `self`, so consuming the map buys nothing
    /// over `&map`'s cursor beyond letting `for (k, v) in map` compile
    /// without a leading `&`.
    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

/// `ForRangeResult` bubbles a caller's `{break: R}` payload or the total
/// visited count, matching spec.md §4.6's "otherwise it returns the total
/// count".
pub enum ForRangeResult<R> {
    Completed { count: usize },
    Broke(R),
}

// ======================================================================
// Recursive insert
// ======================================================================

enum InsertOutcome<K, V> {
    Done { added: bool },
    Split { sibling: Link<K, V>, added: bool },
}

fn insert_rec<K, V, C>(
    link: &mut Link<K, V>,
    key: K,
    value: V,
    overwrite: bool,
    max_node_size: usize,
    cmp: &C,
) -> InsertOutcome<K, V>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    let node = Rc::make_mut(link);
    match node {
        Node::Leaf(leaf) => match leaf.insert(key, value, overwrite, max_node_size, cmp) {
            LeafInsert::Overwritten => InsertOutcome::Done { added: false },
            LeafInsert::Inserted => InsertOutcome::Done { added: true },
            LeafInsert::Split { sibling } => InsertOutcome::Split {
                sibling: Rc::new(Node::Leaf(sibling)),
                added: true,
            },
        },
        Node::Internal(internal) => {
            let idx = internal.child_index(&key, cmp);
            match insert_rec(
                &mut internal.children[idx],
                key,
                value,
                overwrite,
                max_node_size,
                cmp,
            ) {
                InsertOutcome::Done { added } => {
                    let new_child_max = internal.children[idx]
                        .max_key()
                        .cloned()
                        .expect("a child touched by insert is never empty");
                    internal.set_child_max_key(idx, new_child_max);
                    InsertOutcome::Done { added }
                }
                InsertOutcome::Split { sibling, added } => {
                    let new_child_max = internal.children[idx]
                        .max_key()
                        .cloned()
                        .expect("the left half of a split child is never empty");
                    internal.set_child_max_key(idx, new_child_max);
                    let sibling_max = sibling
                        .max_key()
                        .cloned()
                        .expect("the right half of a split child is never empty");
                    match internal.insert_child(idx + 1, sibling_max, sibling, max_node_size) {
                        InternalInsert::Inserted => InsertOutcome::Done { added },
                        InternalInsert::Split { sibling } => InsertOutcome::Split {
                            sibling: Rc::new(Node::Internal(sibling)),
                            added,
                        },
                    }
                }
            }
        }
    }
}

// ======================================================================
// Recursive delete, with borrow/merge rebalancing
// ======================================================================

struct DeleteOutcome {
    removed: bool,
}

fn delete_rec<K, V, C>(link: &mut Link<K, V>, key: &K, max_node_size: usize, cmp: &C) -> DeleteOutcome
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    let node = Rc::make_mut(link);
    match node {
        Node::Leaf(leaf) => {
            use crate::btree::node::LeafDelete;
            match leaf.delete(key, cmp) {
                LeafDelete::Absent => DeleteOutcome { removed: false },
                LeafDelete::Removed { .. } => DeleteOutcome { removed: true },
            }
        }
        Node::Internal(internal) => {
            let idx = internal.child_index(key, cmp);
            let child_outcome = delete_rec(&mut internal.children[idx], key, max_node_size, cmp);
            if !child_outcome.removed {
                return DeleteOutcome { removed: false };
            }
            if let Some(new_max) = internal.children[idx].max_key().cloned() {
                internal.set_child_max_key(idx, new_max);
            }
            if child_is_underflowed(&internal.children[idx], max_node_size) {
                rebalance_child(internal, idx, max_node_size);
            }
            DeleteOutcome { removed: true }
        }
    }
}

fn child_is_underflowed<K, V>(child: &Link<K, V>, max_node_size: usize) -> bool {
    let min = min_children(max_node_size);
    match &**child {
        Node::Leaf(leaf) => leaf.keys.len() < min,
        Node::Internal(internal) => internal.is_underflow(max_node_size),
    }
}

/// Borrow from a richer sibling if one exists, otherwise merge with a
/// sibling. Non-root nodes only — the tree facade handles root collapse
/// separately after `delete_rec` returns (spec.md §4.4).
fn rebalance_child<K, V>(internal: &mut InternalNode<K, V>, idx: usize, max_node_size: usize)
where
    K: Clone,
    V: Clone,
{
    let min = min_children(max_node_size);
    let has_left = idx > 0;
    let has_right = idx + 1 < internal.children.len();

    let left_len = if has_left {
        internal.children[idx - 1].len()
    } else {
        0
    };
    let right_len = if has_right {
        internal.children[idx + 1].len()
    } else {
        0
    };

    if has_left && left_len > min {
        borrow_from_left(internal, idx);
    } else if has_right && right_len > min {
        borrow_from_right(internal, idx);
    } else if has_left {
        merge_with_left(internal, idx);
    } else if has_right {
        merge_with_right(internal, idx);
    }
    // A lone child (no siblings at all) has nothing to rebalance against;
    // only the root may legitimately have a single child, and the facade
    // collapses that case after the top-level call returns.
}

fn borrow_from_left<K, V>(internal: &mut InternalNode<K, V>, idx: usize)
where
    K: Clone,
    V: Clone,
{
    let (left_slice, right_slice) = internal.children.split_at_mut(idx);
    let left_link = &mut left_slice[idx - 1];
    let right_link = &mut right_slice[0];
    match (Rc::make_mut(left_link), Rc::make_mut(right_link)) {
        (Node::Leaf(left), Node::Leaf(right)) => {
            let (k, v) = left.pop_tail(1);
            right.prepend(k, v);
        }
        (Node::Internal(left), Node::Internal(right)) => {
            let (mk, ch) = left.pop_tail_children(1);
            right.prepend_children(mk, ch);
        }
        _ => unreachable!("siblings at the same depth share a node kind"),
    }
    let new_left_max = internal.children[idx - 1]
        .max_key()
        .cloned()
        .expect("a sibling that just lent an entry still has entries left (it had > min)");
    internal.set_child_max_key(idx - 1, new_left_max);
}

fn borrow_from_right<K, V>(internal: &mut InternalNode<K, V>, idx: usize)
where
    K: Clone,
    V: Clone,
{
    let (left_slice, right_slice) = internal.children.split_at_mut(idx + 1);
    let left_link = &mut left_slice[idx];
    let right_link = &mut right_slice[0];
    match (Rc::make_mut(left_link), Rc::make_mut(right_link)) {
        (Node::Leaf(left), Node::Leaf(right)) => {
            let (k, v) = right.pop_head(1);
            left.append(k, v);
        }
        (Node::Internal(left), Node::Internal(right)) => {
            let (mk, ch) = right.pop_head_children(1);
            left.append_children(mk, ch);
        }
        _ => unreachable!("siblings at the same depth share a node kind"),
    }
    let new_left_max = internal.children[idx]
        .max_key()
        .cloned()
        .expect("a node that just gained an entry is non-empty");
    internal.set_child_max_key(idx, new_left_max);
}

fn merge_with_left<K, V>(internal: &mut InternalNode<K, V>, idx: usize)
where
    K: Clone,
    V: Clone,
{
    let right = internal.remove_child(idx);
    let right = Rc::try_unwrap(right).unwrap_or_else(|rc| (*rc).clone());
    match (Rc::make_mut(&mut internal.children[idx - 1]), right) {
        (Node::Leaf(left), Node::Leaf(right)) => left.merge_from(right),
        (Node::Internal(left), Node::Internal(right)) => left.merge_from(right),
        _ => unreachable!("siblings at the same depth share a node kind"),
    }
    let new_max = internal.children[idx - 1]
        .max_key()
        .cloned()
        .expect("a node absorbing a sibling's entries is non-empty");
    internal.set_child_max_key(idx - 1, new_max);
}

fn merge_with_right<K, V>(internal: &mut InternalNode<K, V>, idx: usize)
where
    K: Clone,
    V: Clone,
{
    let right = internal.remove_child(idx + 1);
    let right = Rc::try_unwrap(right).unwrap_or_else(|rc| (*rc).clone());
    match (Rc::make_mut(&mut internal.children[idx]), right) {
        (Node::Leaf(left), Node::Leaf(right)) => left.merge_from(right),
        (Node::Internal(left), Node::Internal(right)) => left.merge_from(right),
        _ => unreachable!("siblings at the same depth share a node kind"),
    }
    let new_max = internal.children[idx]
        .max_key()
        .cloned()
        .expect("a node absorbing a sibling's entries is non-empty");
    internal.set_child_max_key(idx, new_max);
}

// ======================================================================
// checkValid
// ======================================================================

/// Recursively audits invariants 1-4, returning this subtree's leaf depth
/// (measured in edges to a leaf) so the caller can confirm every leaf sits
/// at the same depth.
fn audit_node<K, V, C>(
    link: &Link<K, V>,
    cmp: &C,
    depth: usize,
    counted: &mut usize,
) -> OrdResult<usize>
where
    C: Comparator<K>,
{
    match &**link {
        Node::Leaf(leaf) => {
            if leaf.keys.len() != leaf.values.len() {
                return Err(OrdError::InvariantViolation {
                    reason: "leaf keys/values length mismatch".to_string(),
                });
            }
            for w in leaf.keys.windows(2) {
                if cmp.compare(&w[0], &w[1]) != std::cmp::Ordering::Less {
                    return Err(OrdError::InvariantViolation {
                        reason: "leaf keys are not strictly ascending".to_string(),
                    });
                }
            }
            *counted += leaf.keys.len();
            Ok(depth)
        }
        Node::Internal(internal) => {
            if internal.children.len() != internal.max_keys.len() {
                return Err(OrdError::InvariantViolation {
                    reason: "internal node children/max-key length mismatch".to_string(),
                });
            }
            for w in internal.max_keys.windows(2) {
                if cmp.compare(&w[0], &w[1]) != std::cmp::Ordering::Less {
                    return Err(OrdError::InvariantViolation {
                        reason: "internal node max-keys are not strictly ascending".to_string(),
                    });
                }
            }
            let mut leaf_depth = None;
            for (i, child) in internal.children.iter().enumerate() {
                let child_depth = audit_node(child, cmp, depth + 1, counted)?;
                match leaf_depth {
                    None => leaf_depth = Some(child_depth),
                    Some(expected) if expected != child_depth => {
                        return Err(OrdError::InvariantViolation {
                            reason: "leaves are not all at the same depth".to_string(),
                        });
                    }
                    _ => {}
                }
                if let Some(actual_max) = child.max_key() {
                    if cmp.compare(actual_max, &internal.max_keys[i]) != std::cmp::Ordering::Equal
                    {
                        return Err(OrdError::InvariantViolation {
                            reason: format!("stored max-key at child {} does not match child's actual max", i),
                        });
                    }
                }
            }
            Ok(leaf_depth.unwrap_or(depth))
        }
    }
}
