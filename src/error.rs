// Copyright 2025 The cmpctalloc Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Internal error type for the one fallible operation below the public
//! surface: mapping a fresh arena from the OS.

use std::fmt;

pub type Result<T = ()> = core::result::Result<T, Error>;

/// Failure modes internal to the allocator. The public `allocate`/`free`
/// functions never return this type directly: `allocate` collapses
/// [`Error::InvalidRequest`] to a null pointer and escalates
/// [`Error::OutOfMemory`] to a fatal abort, per the allocator's error model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The caller's request could not be satisfied as given (zero size,
    /// oversized payload, or otherwise outside the allocator's contract).
    InvalidRequest,
    /// The OS anonymous mapping syscall failed.
    OutOfMemory,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidRequest => write!(f, "invalid allocation request"),
            Error::OutOfMemory => write!(f, "out of memory: OS mapping failed"),
        }
    }
}

impl std::error::Error for Error {}
