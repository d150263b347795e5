// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use crate::btree::OrdMap;
use crate::comparator::FnComparator;
use crate::error::OrdError;

#[test]
fn construct_set_overwrite_and_bounds() {
    // S1
    let mut t = OrdMap::new();
    t.set(5, "a", true).unwrap();
    t.set(3, "b", true).unwrap();
    t.set(7, "c", true).unwrap();
    t.set(3, "B", true).unwrap();
    assert_eq!(t.len(), 3);
    assert_eq!(t.to_vec(None), vec![(3, "B"), (5, "a"), (7, "c")]);
    assert_eq!(t.min_key(), Some(&3));
    assert_eq!(t.max_key(), Some(&7));
}

#[test]
fn delete_is_idempotent_and_reports_presence() {
    // S2
    let mut t = OrdMap::new();
    for (k, v) in [(5, "a"), (3, "b"), (7, "c")] {
        t.set(k, v, true).unwrap();
    }
    t.set(3, "B", true).unwrap();
    assert!(t.delete(&5).unwrap());
    assert!(!t.delete(&5).unwrap());
    assert_eq!(t.to_vec(None), vec![(3, "B"), (7, "c")]);
}

#[test]
fn splits_grow_height_and_stay_sorted() {
    // S3
    let mut t = OrdMap::with_max_node_size(4);
    for k in 1..=100 {
        t.set(k, k, true).unwrap();
    }
    assert!(t.height() >= 2);
    let expected: Vec<(i32, i32)> = (1..=100).map(|k| (k, k)).collect();
    assert_eq!(t.to_vec(None), expected);
    t.check_valid().unwrap();
}

#[test]
fn clone_is_isolated_both_directions() {
    // S4
    let mut t1 = OrdMap::new();
    for k in 1..=1000 {
        t1.set(k, k, true).unwrap();
    }
    let mut t2 = t1.clone();
    t2.set(500, "x", true).unwrap();
    t2.delete(&501).unwrap();

    assert_eq!(t1.get(&500), Some(&500));
    assert!(t1.has(&501));
    assert_eq!(t2.get(&500), Some(&"x"));
    assert!(!t2.has(&501));
    assert_eq!(t1.len(), 1000);
    assert_eq!(t2.len(), 999);
}

#[test]
fn for_range_break_returns_payload_at_exact_counter() {
    // S5
    let mut t = OrdMap::new();
    for k in 1..=100 {
        t.set(k, k, true).unwrap();
    }
    let result = t.for_range(&10, &20, true, 0, |k, _v, c| if c == 3 { Some(*k) } else { None });
    match result {
        crate::btree::ForRangeResult::Broke(k) => assert_eq!(k, 13),
        crate::btree::ForRangeResult::Completed { .. } => panic!("expected a break"),
    }
}

#[test]
fn clone_isolation_holds_across_many_mutation_patterns() {
    // property 7/8: a handful of clone+mutate patterns, not just one
    for pivot in [1, 17, 50, 99] {
        let mut base = OrdMap::with_max_node_size(8);
        for k in 1..=100 {
            base.set(k, k, true).unwrap();
        }
        let before = base.to_vec(None);
        let mut branch = base.clone();
        branch.set(pivot, -pivot, true).unwrap();
        branch.delete(&(pivot + 1)).unwrap();
        branch.set(1000 + pivot, 1000 + pivot, true).unwrap();
        assert_eq!(base.to_vec(None), before, "base mutated by a clone at pivot {pivot}");
    }
}

#[test]
fn set_if_not_present_is_a_noop_when_key_exists() {
    let mut t = OrdMap::new();
    assert!(t.set_if_not_present(1, "first").unwrap());
    assert!(!t.set_if_not_present(1, "second").unwrap());
    assert_eq!(t.get(&1), Some(&"first"));
}

#[test]
fn change_if_present_applies_function_only_when_key_exists() {
    let mut t = OrdMap::new();
    t.set(1, 10, true).unwrap();
    assert!(t.change_if_present(&1, |v| v + 1).unwrap());
    assert_eq!(t.get(&1), Some(&11));
    assert!(!t.change_if_present(&2, |v| v + 1).unwrap());
}

#[test]
fn set_range_lets_later_duplicates_win() {
    let t = OrdMap::from_pairs([(1, "a"), (2, "b"), (1, "z")]);
    assert_eq!(t.len(), 2);
    assert_eq!(t.get(&1), Some(&"z"));
}

#[test]
fn clear_resets_to_empty_leaf_root() {
    let mut t = OrdMap::with_max_node_size(4);
    for k in 1..=50 {
        t.set(k, k, true).unwrap();
    }
    t.clear().unwrap();
    assert_eq!(t.len(), 0);
    assert_eq!(t.height(), 1);
    assert!(t.is_empty());
    t.check_valid().unwrap();
}

#[test]
fn frozen_tree_rejects_mutators_but_not_reads() {
    let mut t = OrdMap::new();
    t.set(1, "a", true).unwrap();
    t.freeze();
    assert!(t.is_frozen());
    assert_eq!(t.set(2, "b", true), Err(OrdError::FrozenMutation { operation: "set" }));
    assert_eq!(t.delete(&1), Err(OrdError::FrozenMutation { operation: "delete" }));
    assert_eq!(t.get(&1), Some(&"a"));
    t.unfreeze();
    assert!(t.set(2, "b", true).unwrap());
}

#[test]
fn get_range_matches_filtered_to_vec() {
    let mut t = OrdMap::with_max_node_size(4);
    for k in 1..=50 {
        t.set(k, k, true).unwrap();
    }
    let inclusive = t.get_range(&10, &20, true, None);
    let expected: Vec<(i32, i32)> = (10..=20).map(|k| (k, k)).collect();
    assert_eq!(inclusive, expected);

    let exclusive = t.get_range(&10, &20, false, None);
    let expected: Vec<(i32, i32)> = (10..20).map(|k| (k, k)).collect();
    assert_eq!(exclusive, expected);
}

#[test]
fn get_range_respects_max_len() {
    let mut t = OrdMap::with_max_node_size(4);
    for k in 1..=50 {
        t.set(k, k, true).unwrap();
    }
    let capped = t.get_range(&1, &50, true, Some(5));
    assert_eq!(capped.len(), 5);
    assert_eq!(capped, vec![(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]);
}

#[test]
fn delete_through_many_sizes_keeps_tree_valid_and_balanced() {
    for &m in &[4u16, 8, 32, 256] {
        let mut t = OrdMap::with_max_node_size(m);
        let n = 300;
        for k in 0..n {
            t.set(k, k, true).unwrap();
        }
        for k in (0..n).step_by(2) {
            assert!(t.delete(&k).unwrap());
        }
        t.check_valid().unwrap();
        assert_eq!(t.len(), (n / 2) as usize);
        for k in 0..n {
            assert_eq!(t.has(&k), k % 2 == 1);
        }
        // invariant 11: height is bounded by ceil(log_{ceil(M/2)}(n+1))
        let min_fanout = (m as f64 / 2.0).ceil().max(2.0);
        let bound = ((n as f64 + 1.0).ln() / min_fanout.ln()).ceil() as usize + 1;
        assert!(t.height() <= bound, "height {} exceeds bound {} for M={}", t.height(), bound, m);
    }
}

#[test]
fn delete_collapses_root_through_multiple_levels() {
    let mut t = OrdMap::with_max_node_size(4);
    for k in 1..=200 {
        t.set(k, k, true).unwrap();
    }
    let height_before = t.height();
    assert!(height_before >= 2);
    for k in 2..=200 {
        t.delete(&k).unwrap();
    }
    assert_eq!(t.len(), 1);
    assert_eq!(t.height(), 1);
    t.check_valid().unwrap();
}

#[test]
fn custom_comparator_reverses_order() {
    let cmp = FnComparator(|a: &i32, b: &i32| b.cmp(a));
    let mut t = crate::btree::OrdMap::with_comparator(cmp);
    for k in [3, 1, 2] {
        t.set(k, k, true).unwrap();
    }
    assert_eq!(t.to_vec(None), vec![(3, 3), (2, 2), (1, 1)]);
    assert_eq!(t.min_key(), Some(&3));
    assert_eq!(t.max_key(), Some(&1));
}

#[test]
fn entries_reversed_from_respects_skip_highest() {
    let mut t = OrdMap::new();
    for k in 1..=10 {
        t.set(k, k, true).unwrap();
    }
    let with_high: Vec<_> = t.entries_reversed_from(&5, false).collect();
    assert_eq!(with_high[0], (5, 5));
    let skip_high: Vec<_> = t.entries_reversed_from(&5, true).collect();
    assert_eq!(skip_high[0], (4, 4));
}

#[test]
fn entries_from_positions_at_smallest_key_greater_or_equal() {
    let mut t = OrdMap::new();
    for k in [1, 3, 5, 7, 9] {
        t.set(k, k, true).unwrap();
    }
    let from_four: Vec<_> = t.entries_from(&4).collect();
    assert_eq!(from_four, vec![(5, 5), (7, 7), (9, 9)]);
}

#[test]
fn for_each_pair_counter_starts_at_c0() {
    let mut t = OrdMap::new();
    for k in 1..=5 {
        t.set(k, k, true).unwrap();
    }
    let mut seen = Vec::new();
    t.for_each_pair(10, |k, v, c| seen.push((*k, *v, c)));
    assert_eq!(seen, vec![(1, 1, 10), (2, 2, 11), (3, 3, 12), (4, 4, 13), (5, 5, 14)]);
}

#[test]
fn display_and_debug_do_not_panic_and_contain_entries() {
    let mut t = OrdMap::new();
    t.set(1, "a", true).unwrap();
    let s = t.to_string();
    assert!(s.contains('1'));
    let d = format!("{:?}", t);
    assert!(d.contains("len"));
}

#[test]
fn partial_eq_compares_by_entries_not_identity() {
    let mut a = OrdMap::new();
    let mut b = OrdMap::with_max_node_size(4);
    for k in 1..=20 {
        a.set(k, k, true).unwrap();
        b.set(k, k, true).unwrap();
    }
    assert_eq!(a, b);
    b.set(21, 21, true).unwrap();
    assert_ne!(a, b);
}

#[test]
fn check_valid_passes_after_random_like_interleaving() {
    let mut t = OrdMap::with_max_node_size(4);
    let ops: &[(bool, i32)] = &[
        (true, 50), (true, 10), (true, 70), (true, 30), (true, 90),
        (false, 10), (true, 20), (true, 60), (false, 70), (true, 5),
        (true, 95), (false, 50), (true, 40), (true, 80), (false, 90),
    ];
    for &(is_set, k) in ops {
        if is_set {
            t.set(k, k, true).unwrap();
        } else {
            t.delete(&k).unwrap();
        }
        t.check_valid().unwrap();
    }
}
