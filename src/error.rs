// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error types for ordtree operations.
//!
//! Only two situations are errors at all: mutating a frozen tree, and a
//! failed structural audit from [`crate::OrdMap::check_valid`]. Everything
//! else — absence, success/failure of an insert, range counts — is a plain
//! return value, never an `Err`.

use std::fmt;

/// Standard `Result` type for ordtree operations.
pub type OrdResult<T> = Result<T, OrdError>;

/// Error types for ordtree operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrdError {
    /// A mutating call was made on a frozen tree.
    FrozenMutation {
        /// Name of the mutator that was rejected (`"set"`, `"delete"`, ...).
        operation: &'static str,
    },

    /// [`crate::OrdMap::check_valid`] found a structural violation.
    InvariantViolation {
        /// Human-readable description of which invariant failed.
        reason: String,
    },
}

impl fmt::Display for OrdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrdError::FrozenMutation { operation } => {
                write!(f, "cannot call `{}` on a frozen tree", operation)
            }
            OrdError::InvariantViolation { reason } => {
                write!(f, "invariant violation: {}", reason)
            }
        }
    }
}

impl std::error::Error for OrdError {}
