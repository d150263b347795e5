// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The B+-tree implementation backing [`OrdMap`](crate::OrdMap).

mod cursor;
mod node;
mod range;
#[cfg(test)]
mod range_test;
mod tree;
#[cfg(test)]
mod tree_test;

pub use cursor::Cursor;
pub use range::{EditAction, EditOutcome, EditRangeResult};
pub use tree::{ForRangeResult, OrdMap, DEFAULT_MAX_NODE_SIZE, MAX_MAX_NODE_SIZE, MIN_MAX_NODE_SIZE};
