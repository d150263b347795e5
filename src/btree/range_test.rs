// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use crate::btree::{EditOutcome, ForRangeResult, OrdMap};
use std::rc::Rc;

#[test]
fn edit_range_set_delete_and_break_directives() {
    // S6
    let mut t = OrdMap::new();
    for k in 1..=10 {
        t.set(k, k, true).unwrap();
    }
    let result = t.edit_range(&1, &10, true, 0, |k, v, _c| {
        if k % 2 == 0 {
            EditOutcome::delete()
        } else {
            EditOutcome::set(-v)
        }
    });
    result.unwrap();
    assert_eq!(t.to_vec(None), vec![(1, -1), (3, -3), (5, -5), (7, -7), (9, -9)]);
}

#[test]
fn edit_range_set_touches_only_the_targeted_key() {
    let mut t = OrdMap::new();
    for k in 1..=20 {
        t.set(k, k, true).unwrap();
    }
    let result = t
        .edit_range(&5, &5, true, 0, |_k, v, _c| EditOutcome::set(v * 100))
        .unwrap();
    assert_eq!(result.modified, 1);
    assert_eq!(result.deleted, 0);
    assert_eq!(t.get(&5), Some(&500));
    for k in (1..=20).filter(|&k| k != 5) {
        assert_eq!(t.get(&k), Some(&k));
    }
}

#[test]
fn edit_range_delete_removes_exactly_the_targeted_key() {
    let mut t = OrdMap::new();
    for k in 1..=20 {
        t.set(k, k, true).unwrap();
    }
    let result = t.edit_range(&7, &7, true, 0, |_k, _v, _c| EditOutcome::delete()).unwrap();
    assert_eq!(result.deleted, 1);
    assert!(!t.has(&7));
    assert_eq!(t.len(), 19);
}

#[test]
fn edit_range_break_stops_after_applying_this_entrys_directive() {
    let mut t = OrdMap::new();
    for k in 1..=20 {
        t.set(k, k, true).unwrap();
    }
    let result = t
        .edit_range(&1, &20, true, 0, |k, v, _c| {
            if *k == 10 {
                EditOutcome::set(-v).stop(*k)
            } else {
                EditOutcome::delete()
            }
        })
        .unwrap();
    assert_eq!(result.broke, Some(10));
    // entries 1..=9 deleted, 10 updated in place, 11..=20 untouched
    assert!(!t.has(&9));
    assert_eq!(t.get(&10), Some(&-10));
    assert!(t.has(&11));
    assert_eq!(t.len(), 11);
}

#[test]
fn edit_range_counter_is_prior_call_count_plus_c0() {
    let mut t = OrdMap::new();
    for k in 1..=20 {
        t.set(k, k, true).unwrap();
    }
    let mut seen = Vec::new();
    t.edit_range(&1, &20, true, 100, |k, _v, c| {
        seen.push((*k, c));
        EditOutcome::<i32, ()>::keep()
    })
    .unwrap();
    for (i, (k, c)) in seen.iter().enumerate() {
        assert_eq!(*k, (i + 1) as i32);
        assert_eq!(*c, 100 + i);
    }
}

#[test]
fn for_range_never_mutates_and_reports_total_count() {
    let mut t = OrdMap::with_max_node_size(4);
    for k in 1..=50 {
        t.set(k, k, true).unwrap();
    }
    let before = t.to_vec(None);
    let result = t.for_range(&10, &20, true, 0, |_k, _v, _c| None::<()>);
    match result {
        ForRangeResult::Completed { count } => assert_eq!(count, 11),
        ForRangeResult::Broke(_) => panic!("did not expect a break"),
    }
    assert_eq!(t.to_vec(None), before);
}

#[test]
fn delete_range_removes_inclusive_bounds_and_returns_count() {
    let mut t = OrdMap::with_max_node_size(4);
    for k in 1..=50 {
        t.set(k, k, true).unwrap();
    }
    let removed = t.delete_range(&10, &20, true).unwrap();
    assert_eq!(removed, 11);
    assert_eq!(t.len(), 39);
    for k in 10..=20 {
        assert!(!t.has(&k));
    }
    assert!(t.has(&9));
    assert!(t.has(&21));
    t.check_valid().unwrap();
}

#[test]
fn delete_range_excludes_high_bound_when_not_included() {
    let mut t = OrdMap::with_max_node_size(4);
    for k in 1..=50 {
        t.set(k, k, true).unwrap();
    }
    let removed = t.delete_range(&10, &20, false).unwrap();
    assert_eq!(removed, 10);
    assert!(!t.has(&19));
    assert!(t.has(&20));
}

#[test]
fn delete_range_can_empty_a_leaf_without_corrupting_later_operations() {
    // Small max_node_size so a whole leaf's worth of keys falls inside the
    // deleted range, leaving it underflowed (spec.md §4.6: rebalancing is
    // deferred past a range delete).
    let mut t = OrdMap::with_max_node_size(4);
    for k in 1..=40 {
        t.set(k, k, true).unwrap();
    }
    t.delete_range(&1, &40, true).unwrap();
    assert_eq!(t.len(), 0);
    assert!(t.to_vec(None).is_empty());
    // the tree keeps working correctly even though leaves may be left
    // underflowed or empty by the range delete
    t.set(5, 5, true).unwrap();
    assert_eq!(t.get(&5), Some(&5));
    t.check_valid().unwrap();
}

#[test]
fn range_edit_does_not_unshare_subtrees_outside_the_bound() {
    let mut base = OrdMap::with_max_node_size(4);
    for k in 1..=100 {
        base.set(k, k, true).unwrap();
    }
    let mut branch = base.clone();
    branch.delete_range(&40, &60, true).unwrap();

    // entries outside [40, 60] are untouched on both sides
    for k in (1..40).chain(61..=100) {
        assert_eq!(base.get(&k), Some(&k));
        assert_eq!(branch.get(&k), Some(&k));
    }
    for k in 40..=60 {
        assert_eq!(base.get(&k), Some(&k));
        assert!(!branch.has(&k));
    }
}

#[test]
fn edit_range_with_only_continue_directives_keeps_every_node_shared_with_a_clone() {
    // A callback that never returns SetValue/Delete must never un-share
    // anything: the whole point of the O(1) clone is that the first *write*
    // is what pays for a private copy, not merely visiting a shared node.
    let mut base = OrdMap::with_max_node_size(4);
    for k in 1..=200 {
        base.set(k, k, true).unwrap();
    }
    let branch = base.clone();
    assert!(Rc::ptr_eq(&base.root, &branch.root));

    let result = base
        .edit_range(&1, &200, true, 0, |_k, _v, _c| EditOutcome::<i32, ()>::keep())
        .unwrap();

    assert_eq!(result.visited, 200);
    assert_eq!(result.modified, 0);
    assert_eq!(result.deleted, 0);
    // Nothing was written, so the root (and therefore every node beneath
    // it) is still the exact node the clone aliases.
    assert!(Rc::ptr_eq(&base.root, &branch.root));
}

#[test]
fn edit_range_un_shares_only_the_leaf_a_directive_actually_touches() {
    let mut base = OrdMap::with_max_node_size(4);
    for k in 1..=200 {
        base.set(k, k, true).unwrap();
    }
    let branch = base.clone();
    assert!(Rc::ptr_eq(&base.root, &branch.root));

    base.edit_range(&100, &100, true, 0, |_k, v, _c| EditOutcome::set(v * 10))
        .unwrap();

    // the write touched exactly one key; the root had to become private to
    // relink the new leaf, so it's no longer the same node as the clone's...
    assert!(!Rc::ptr_eq(&base.root, &branch.root));
    // ...but everything the write didn't reach is untouched on both sides.
    for k in (1..100).chain(101..=200) {
        assert_eq!(base.get(&k), Some(&k));
        assert_eq!(branch.get(&k), Some(&k));
    }
    assert_eq!(base.get(&100), Some(&1000));
    assert_eq!(branch.get(&100), Some(&100));
}

#[test]
fn edit_range_on_empty_bound_visits_nothing() {
    let mut t = OrdMap::new();
    for k in 1..=10 {
        t.set(k, k, true).unwrap();
    }
    let result = t
        .edit_range(&100, &200, true, 0, |_k, _v, _c| EditOutcome::<i32, ()>::delete())
        .unwrap();
    assert_eq!(result.visited, 0);
    assert_eq!(result.deleted, 0);
    assert_eq!(t.len(), 10);
}
