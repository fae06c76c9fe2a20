// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cell storage backends.

pub mod hash;
pub mod sorted;
