// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by fallible grid constructors.

/// Why a [`RegularGrid`](crate::RegularGrid) could not be created.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// An axis was given zero cells.
    #[error("axis {axis} has zero cells")]
    EmptyAxis {
        /// Offending axis.
        axis: usize,
    },
    /// The minimum corner exceeds the maximum corner on an axis (or is NaN).
    #[error("axis {axis} has min greater than max")]
    InvertedAxis {
        /// Offending axis.
        axis: usize,
    },
}
