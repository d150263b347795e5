// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Range scanning and range editing: `forRange`, `editRange`, `deleteRange`.
//!
//! `for_range` never touches a node's shared bit at all — it only ever
//! borrows. `edit_range` and `delete_range` share one traversal
//! (`edit_node`): a node is walked by shared reference (`&Link`, never
//! `&mut`) and is cloned into a fresh, privately-owned replacement only once
//! a directive inside it actually calls for a write — `edit_node` returns
//! `None` for a subtree nothing was written to, and the caller keeps sharing
//! the original `Rc` untouched. A `Some(new_link)` bubbles up exactly one
//! level, where the parent (itself possibly still shared) clones only its
//! own `children`/`max_keys` vectors — a shallow copy of `Rc` pointers, not
//! of the subtrees those pointers lead to — splices in the replacement
//! child, and becomes the `Some` it hands to *its* parent in turn. A scan
//! whose callback never returns `SetValue`/`Delete` for anything in a given
//! subtree — the common case for a read-mostly `editRange` over a freshly
//! cloned tree — leaves every node in that subtree exactly as shared as it
//! was before the call.
//!
//! `delete_range` is `edit_range` with every visited entry unconditionally
//! deleted. A subtree entirely outside `[lo, hi]` is skipped by reading its
//! parent's `max_keys` and is never even dereferenced, let alone cloned.
//!
//! Deletions inside a leaf do not trigger a borrow/merge rebalance against
//! siblings; a leaf may end up underflowed, even empty, after a range
//! delete. The tree stays valid for every other operation (`get`, further
//! inserts, deletes, `check_valid`'s non-strict audit) with an empty leaf in
//! place — rebalancing it is deferred to whatever later single-key `delete`
//! happens to touch that neighbourhood.

use crate::btree::node::{InternalNode, LeafNode, Link, Node};
use crate::btree::tree::ForRangeResult;
use crate::comparator::Comparator;
use std::cmp::Ordering;
use std::rc::Rc;

/// What to do with the entry just visited by `editRange`'s callback.
pub enum EditAction<V> {
    /// Leave the entry as-is.
    Continue,
    /// Replace the value (the key is never replaced by a range edit).
    SetValue(V),
    /// Remove the entry.
    Delete,
}

/// The callback's full verdict: an action, plus an optional early-exit
/// payload. Mirrors spec.md §4.5's `{value, delete, break}` return record,
/// minus the dynamic-language ambiguity of a record supporting all three at
/// once.
pub struct EditOutcome<V, R> {
    pub action: EditAction<V>,
    pub stop: Option<R>,
}

impl<V, R> EditOutcome<V, R> {
    pub fn keep() -> Self {
        Self {
            action: EditAction::Continue,
            stop: None,
        }
    }

    pub fn set(value: V) -> Self {
        Self {
            action: EditAction::SetValue(value),
            stop: None,
        }
    }

    pub fn delete() -> Self {
        Self {
            action: EditAction::Delete,
            stop: None,
        }
    }

    /// Attach an early-exit payload to whichever action was already chosen.
    pub fn stop(mut self, result: R) -> Self {
        self.stop = Some(result);
        self
    }
}

/// Tally returned by `editRange`/`deleteRange`.
pub struct EditRangeResult<R> {
    pub visited: usize,
    pub modified: usize,
    pub deleted: usize,
    pub broke: Option<R>,
}

fn lower_bound<K>(keys: &[K], lo: &K, cmp: &impl Comparator<K>) -> usize {
    match keys.binary_search_by(|probe| cmp.compare(probe, lo)) {
        Ok(idx) | Err(idx) => idx,
    }
}

fn in_range<K>(key: &K, hi: &K, include_high: bool, cmp: &impl Comparator<K>) -> bool {
    match cmp.compare(key, hi) {
        Ordering::Less => true,
        Ordering::Equal => include_high,
        Ordering::Greater => false,
    }
}

/// A child at `idx` can be skipped entirely without descending into it when
/// its own max-key already falls short of `lo`.
fn child_before_lo<K>(max_key: &K, lo: &K, cmp: &impl Comparator<K>) -> bool {
    cmp.compare(max_key, lo) == Ordering::Less
}

/// Once the previous child's max-key is already past `hi`, every following
/// child's keys (being all greater than it) are past `hi` too — the caller
/// can stop iterating siblings.
fn prior_child_past_hi<K>(prior_max_key: &K, hi: &K, include_high: bool, cmp: &impl Comparator<K>) -> bool {
    !in_range(prior_max_key, hi, include_high, cmp)
}

// ======================================================================
// Read-only scan
// ======================================================================

pub fn for_range<K, V, C, R>(
    root: &Link<K, V>,
    lo: &K,
    hi: &K,
    include_high: bool,
    c0: usize,
    cmp: &C,
    on_found: &mut impl FnMut(&K, &V, usize) -> Option<R>,
) -> ForRangeResult<R>
where
    C: Comparator<K>,
{
    let mut counter = c0;
    let mut broke = None;
    for_range_node(root, lo, hi, include_high, &mut counter, cmp, on_found, &mut broke);
    match broke {
        Some(r) => ForRangeResult::Broke(r),
        None => ForRangeResult::Completed {
            count: counter - c0,
        },
    }
}

fn for_range_node<K, V, C, R>(
    link: &Link<K, V>,
    lo: &K,
    hi: &K,
    include_high: bool,
    counter: &mut usize,
    cmp: &C,
    on_found: &mut impl FnMut(&K, &V, usize) -> Option<R>,
    broke: &mut Option<R>,
) where
    C: Comparator<K>,
{
    match &**link {
        Node::Leaf(leaf) => {
            let mut i = lower_bound(&leaf.keys, lo, cmp);
            while i < leaf.keys.len() {
                if !in_range(&leaf.keys[i], hi, include_high, cmp) {
                    break;
                }
                if let Some(r) = on_found(&leaf.keys[i], &leaf.values[i], *counter) {
                    *broke = Some(r);
                    return;
                }
                *counter += 1;
                i += 1;
            }
        }
        Node::Internal(internal) => {
            for idx in 0..internal.children.len() {
                if child_before_lo(&internal.max_keys[idx], lo, cmp) {
                    continue;
                }
                if idx > 0 && prior_child_past_hi(&internal.max_keys[idx - 1], hi, include_high, cmp) {
                    break;
                }
                for_range_node(&internal.children[idx], lo, hi, include_high, counter, cmp, on_found, broke);
                if broke.is_some() {
                    return;
                }
            }
        }
    }
}

// ======================================================================
// Mutating scan: editRange / deleteRange
// ======================================================================

pub fn edit_range<K, V, C, R>(
    root: &mut Link<K, V>,
    lo: &K,
    hi: &K,
    include_high: bool,
    c0: usize,
    cmp: &C,
    on_found: &mut impl FnMut(&K, &V, usize) -> EditOutcome<V, R>,
) -> EditRangeResult<R>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    let mut counter = c0;
    let mut modified = 0;
    let mut deleted = 0;
    let mut broke = None;
    if let Some(new_root) = edit_node(
        root,
        lo,
        hi,
        include_high,
        &mut counter,
        &mut modified,
        &mut deleted,
        cmp,
        on_found,
        &mut broke,
    ) {
        *root = new_root;
    }
    EditRangeResult {
        visited: counter - c0,
        modified,
        deleted,
        broke,
    }
}

/// `deleteRange`: every entry in `[lo, hi]` is removed unconditionally, in
/// one pass, without ever materialising a user callback.
pub fn delete_range<K, V, C>(root: &mut Link<K, V>, lo: &K, hi: &K, include_high: bool, cmp: &C) -> usize
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    let mut counter = 0;
    let mut modified = 0;
    let mut deleted = 0;
    let mut broke: Option<()> = None;
    if let Some(new_root) = edit_node(
        root,
        lo,
        hi,
        include_high,
        &mut counter,
        &mut modified,
        &mut deleted,
        cmp,
        &mut |_k, _v, _c| EditOutcome::<V, ()>::delete(),
        &mut broke,
    ) {
        *root = new_root;
    }
    deleted
}

/// Walk the subtree rooted at `link` by shared reference, applying `on_found`
/// to every in-range entry. Returns `None` when nothing under `link` was
/// written — the caller keeps sharing the original node — or `Some(new_link)`
/// holding a freshly-private replacement the caller must splice in, built by
/// cloning only the data that actually changed (the touched leaf's own
/// key/value vectors, and each ancestor's `children`/`max_keys` vectors —
/// never an untouched sibling subtree).
fn edit_node<K, V, C, R>(
    link: &Link<K, V>,
    lo: &K,
    hi: &K,
    include_high: bool,
    counter: &mut usize,
    modified: &mut usize,
    deleted: &mut usize,
    cmp: &C,
    on_found: &mut impl FnMut(&K, &V, usize) -> EditOutcome<V, R>,
    broke: &mut Option<R>,
) -> Option<Link<K, V>>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    match &**link {
        Node::Leaf(leaf) => {
            let mut i = lower_bound(&leaf.keys, lo, cmp);
            // Cloned into existence only on the first `SetValue`/`Delete`
            // directive inside this leaf — the deferred un-share spec.md
            // §4.6 calls for. Until then every read comes straight out of
            // the still-shared `leaf`.
            let mut private: Option<LeafNode<K, V>> = None;
            loop {
                let exhausted = match &private {
                    Some(p) => i >= p.keys.len(),
                    None => i >= leaf.keys.len(),
                };
                if exhausted {
                    break;
                }
                let (key, value): (&K, &V) = match &private {
                    Some(p) => (&p.keys[i], &p.values[i]),
                    None => (&leaf.keys[i], &leaf.values[i]),
                };
                if !in_range(key, hi, include_high, cmp) {
                    break;
                }
                let outcome = on_found(key, value, *counter);
                *counter += 1;
                match outcome.action {
                    EditAction::Continue => {
                        i += 1;
                    }
                    EditAction::SetValue(new_value) => {
                        let p = private.get_or_insert_with(|| leaf.clone());
                        p.values[i] = new_value;
                        *modified += 1;
                        i += 1;
                    }
                    EditAction::Delete => {
                        let p = private.get_or_insert_with(|| leaf.clone());
                        p.keys.remove(i);
                        p.values.remove(i);
                        *deleted += 1;
                    }
                }
                if let Some(r) = outcome.stop {
                    *broke = Some(r);
                    break;
                }
            }
            private.map(|p| Rc::new(Node::Leaf(p)))
        }
        Node::Internal(internal) => {
            let n = internal.children.len();
            // Cloned into existence only once a child actually comes back
            // with a replacement — a shallow clone of the `Rc` pointer
            // vectors, not of any subtree they reference.
            let mut private: Option<(Vec<Link<K, V>>, Vec<K>)> = None;
            for idx in 0..n {
                if child_before_lo(&internal.max_keys[idx], lo, cmp) {
                    continue;
                }
                if idx > 0 && prior_child_past_hi(&internal.max_keys[idx - 1], hi, include_high, cmp) {
                    break;
                }
                let child_link = match &private {
                    Some((children, _)) => &children[idx],
                    None => &internal.children[idx],
                };
                if let Some(new_child) = edit_node(
                    child_link,
                    lo,
                    hi,
                    include_high,
                    counter,
                    modified,
                    deleted,
                    cmp,
                    on_found,
                    broke,
                ) {
                    let slot = private
                        .get_or_insert_with(|| (internal.children.clone(), internal.max_keys.clone()));
                    if let Some(new_max) = new_child.max_key().cloned() {
                        slot.1[idx] = new_max;
                    }
                    slot.0[idx] = new_child;
                }
                if broke.is_some() {
                    break;
                }
            }
            private.map(|(children, max_keys)| Rc::new(Node::Internal(InternalNode { children, max_keys })))
        }
    }
}
