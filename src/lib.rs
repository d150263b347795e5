// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `ordtree` — an ordered in-memory key-value container backed by a
//! copy-on-write B+-tree.
//!
//! The headline feature is [`OrdMap::clone`]: cloning a tree is `O(1)` — it
//! takes a second reference to the same root node. Both the original and the
//! clone stay independently mutable afterwards; the first write on either
//! side privately duplicates only the handful of nodes on the path to the
//! change, leaving the rest of the structure shared until something else
//! touches it too.
//!
//! ```
//! use ordtree::OrdMap;
//!
//! let mut base = OrdMap::new();
//! base.set(1, "one", true).unwrap();
//! base.set(2, "two", true).unwrap();
//!
//! let mut branch = base.clone(); // O(1)
//! branch.set(3, "three", true).unwrap();
//!
//! assert_eq!(base.len(), 2);
//! assert_eq!(branch.len(), 3);
//! ```
//!
//! ## Modules
//!
//! - [`btree`] — the tree implementation: nodes, the `OrdMap` facade, range
//!   scans/edits, and the ascending/descending cursor.
//! - [`comparator`] — the caller-supplied total order keys are compared
//!   under.
//! - [`error`] — the small error surface (`OrdMap` is infallible except for
//!   writes to a frozen tree and [`OrdMap::check_valid`]'s audit).

pub mod btree;
pub mod comparator;
pub mod error;

pub use btree::{
    Cursor, EditAction, EditOutcome, EditRangeResult, ForRangeResult, OrdMap,
    DEFAULT_MAX_NODE_SIZE, MAX_MAX_NODE_SIZE, MIN_MAX_NODE_SIZE,
};
pub use comparator::{Comparator as KeyComparator, DefaultComparator, FnComparator};
pub use error::{OrdError, OrdResult};
