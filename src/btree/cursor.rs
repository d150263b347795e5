// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `Cursor`: the ascending/descending iterator over a tree's entries.
//!
//! A cursor's path holds its own `Rc` clones of every node from root to its
//! current leaf, not borrows. That sidesteps the usual self-referential
//! struct problem of iterating a tree while holding a reference into it, and
//! happens to be exactly what a copy-on-write tree wants: once built, a
//! cursor walks the exact nodes that existed at the moment it was created,
//! even if the tree it came from is mutated (or dropped) afterwards. Handed
//! an `OrdMap`, cloning it and then mutating the clone is cheap (the whole
//! point of the facade's `O(1)` clone); a cursor built from the original is
//! unaffected either way, since `Rc::make_mut` on the clone's side leaves
//! the cursor's referenced nodes alone.

use crate::btree::node::{Link, Node};
use crate::comparator::Comparator;
use std::rc::Rc;

struct Frame<K, V> {
    node: Link<K, V>,
    /// Forward: next index to emit/descend. Reverse: next index counting
    /// down. `None` means this frame is exhausted and should be popped.
    idx: Option<usize>,
}

/// Ascending or descending iterator over `(K, V)` pairs, cloned out of a
/// snapshot of the tree taken when the cursor was built.
pub struct Cursor<K, V> {
    path: Vec<Frame<K, V>>,
    reverse: bool,
}

impl<K, V> Cursor<K, V>
where
    K: Clone,
    V: Clone,
{
    pub(crate) fn forward<C: Comparator<K>>(root: &Link<K, V>, lowest_key: Option<&K>, cmp: &C) -> Self {
        let mut path = Vec::new();
        let mut link = Rc::clone(root);
        loop {
            match &*link {
                Node::Leaf(leaf) => {
                    let start = match lowest_key {
                        Some(k) => lower_bound(&leaf.keys, k, cmp),
                        None => 0,
                    };
                    let idx = if start < leaf.keys.len() { Some(start) } else { None };
                    path.push(Frame { node: Rc::clone(&link), idx });
                    break;
                }
                Node::Internal(internal) => {
                    let child_idx = match lowest_key {
                        Some(k) => internal.child_index(k, cmp),
                        None => 0,
                    };
                    let resume = if child_idx + 1 < internal.children.len() {
                        Some(child_idx + 1)
                    } else {
                        None
                    };
                    let next_link = Rc::clone(&internal.children[child_idx]);
                    path.push(Frame { node: Rc::clone(&link), idx: resume });
                    link = next_link;
                }
            }
        }
        Cursor { path, reverse: false }
    }

    pub(crate) fn reverse<C: Comparator<K>>(
        root: &Link<K, V>,
        highest_key: Option<&K>,
        skip_highest: bool,
        cmp: &C,
    ) -> Self {
        let include_high = !skip_highest;
        let mut path = Vec::new();
        let mut link = Rc::clone(root);
        loop {
            match &*link {
                Node::Leaf(leaf) => {
                    let count = match highest_key {
                        Some(hi) => count_le(&leaf.keys, hi, include_high, cmp),
                        None => leaf.keys.len(),
                    };
                    let idx = if count > 0 { Some(count - 1) } else { None };
                    path.push(Frame { node: Rc::clone(&link), idx });
                    break;
                }
                Node::Internal(internal) => {
                    let child_idx = match highest_key {
                        Some(hi) => internal.child_index(hi, cmp),
                        None => internal.children.len() - 1,
                    };
                    let resume = if child_idx > 0 { Some(child_idx - 1) } else { None };
                    let next_link = Rc::clone(&internal.children[child_idx]);
                    path.push(Frame { node: Rc::clone(&link), idx: resume });
                    link = next_link;
                }
            }
        }
        Cursor { path, reverse: true }
    }

    /// One step of traversal, decided by an immutable peek at the top frame
    /// so the follow-up mutation (a plain index bump, or a pop/push) never
    /// has to fight the borrow checker over a live reference into `path`.
    fn next_forward(&mut self) -> Option<(K, V)> {
        loop {
            let top = self.path.len().checked_sub(1)?;
            let step = {
                let frame = &self.path[top];
                match (&*frame.node, frame.idx) {
                    (_, None) => Step::Pop,
                    (Node::Leaf(leaf), Some(i)) => {
                        Step::Emit(leaf.keys[i].clone(), leaf.values[i].clone(), i + 1 < leaf.keys.len())
                    }
                    (Node::Internal(internal), Some(i)) => Step::Descend(
                        Rc::clone(&internal.children[i]),
                        i + 1 < internal.children.len(),
                        true,
                    ),
                }
            };
            match step {
                Step::Pop => {
                    self.path.pop();
                }
                Step::Emit(k, v, has_more) => {
                    let i = self.path[top].idx.unwrap();
                    self.path[top].idx = if has_more { Some(i + 1) } else { None };
                    return Some((k, v));
                }
                Step::Descend(child, has_more, forward) => {
                    let i = self.path[top].idx.unwrap();
                    self.path[top].idx = if has_more { Some(i + 1) } else { None };
                    let idx0 = child_entry_index(&child, forward);
                    self.path.push(Frame { node: child, idx: idx0 });
                }
            }
        }
    }

    fn next_reverse(&mut self) -> Option<(K, V)> {
        loop {
            let top = self.path.len().checked_sub(1)?;
            let step = {
                let frame = &self.path[top];
                match (&*frame.node, frame.idx) {
                    (_, None) => Step::Pop,
                    (Node::Leaf(leaf), Some(i)) => Step::Emit(leaf.keys[i].clone(), leaf.values[i].clone(), i > 0),
                    (Node::Internal(internal), Some(i)) => {
                        Step::Descend(Rc::clone(&internal.children[i]), i > 0, false)
                    }
                }
            };
            match step {
                Step::Pop => {
                    self.path.pop();
                }
                Step::Emit(k, v, has_more) => {
                    let i = self.path[top].idx.unwrap();
                    self.path[top].idx = if has_more { Some(i - 1) } else { None };
                    return Some((k, v));
                }
                Step::Descend(child, has_more, forward) => {
                    let i = self.path[top].idx.unwrap();
                    self.path[top].idx = if has_more { Some(i - 1) } else { None };
                    let idx0 = child_entry_index(&child, forward);
                    self.path.push(Frame { node: child, idx: idx0 });
                }
            }
        }
    }
}

enum Step<K, V> {
    Pop,
    Emit(K, V, bool),
    Descend(Link<K, V>, bool, bool),
}

/// The index a freshly-descended-into child should start at: the first
/// entry/child for a forward descent, the last for a reverse one. `None`
/// when the child is an empty leaf (possible after a range delete).
fn child_entry_index<K, V>(child: &Link<K, V>, forward: bool) -> Option<usize> {
    let len = child.len();
    if len == 0 {
        None
    } else if forward {
        Some(0)
    } else {
        Some(len - 1)
    }
}

impl<K, V> Iterator for Cursor<K, V>
where
    K: Clone,
    V: Clone,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.reverse {
            self.next_reverse()
        } else {
            self.next_forward()
        }
    }
}

fn lower_bound<K>(keys: &[K], lo: &K, cmp: &impl Comparator<K>) -> usize {
    match keys.binary_search_by(|probe| cmp.compare(probe, lo)) {
        Ok(idx) | Err(idx) => idx,
    }
}

/// Count of keys satisfying `key <= hi` (or `key < hi` when `!include_high`).
fn count_le<K>(keys: &[K], hi: &K, include_high: bool, cmp: &impl Comparator<K>) -> usize {
    match keys.binary_search_by(|probe| cmp.compare(probe, hi)) {
        Ok(idx) => {
            if include_high {
                idx + 1
            } else {
                idx
            }
        }
        Err(idx) => idx,
    }
}
