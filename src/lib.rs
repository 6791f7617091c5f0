// Copyright 2025 The cmpctalloc Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! A general-purpose dynamic memory allocator over anonymous OS mappings.
//!
//! The allocator lays blocks out with a one-word boundary tag at each end
//! (`size | alloc_bit`), threads free blocks through eight segregated
//! free lists by size class, and coalesces adjacent free blocks in O(1)
//! using the boundary tags rather than a scan. See `SPEC_FULL.md` and
//! `DESIGN.md` at the repository root for the full design.
//!
//! # Thread safety
//!
//! This allocator is single-threaded by design: [`allocate`] and [`free`]
//! hold and mutate process-wide state with no locking. Calling either from
//! more than one OS thread concurrently is undefined behavior.
//!
//! # Example
//!
//! ```
//! let p = cmpctalloc::allocate(128);
//! assert!(!p.is_null());
//! cmpctalloc::free(p);
//! ```

mod arena;
mod block;
mod config;
mod diagnostics;
mod error;
mod freelist;
mod global_alloc;
mod heap;
mod size_class;

pub use global_alloc::CmpctAllocator;

use heap::Heap;

/// Obtain a zero-initialized, `ALIGNMENT`-aligned region of at least `n`
/// bytes.
///
/// Returns null if `n` is zero or exceeds the allocator's maximum request
/// size. Terminates the process if the OS mapping syscall fails while
/// growing the heap to satisfy the request.
pub fn allocate(n: usize) -> *mut u8 {
    Heap::global().allocate(n)
}

/// Release a region previously returned by [`allocate`] back to the
/// allocator.
///
/// Terminates the process if `p` is null, if no allocation has ever been
/// made, or if `p` does not currently denote an outstanding allocation.
/// Passing a pointer not previously returned by [`allocate`] is undefined
/// behavior and is not guaranteed to be detected.
pub fn free(p: *mut u8) {
    Heap::global().free(p)
}

/// Serializes tests that exercise the process-wide global heap
/// (`Heap::global()`), since the default test harness otherwise runs them
/// concurrently from several OS threads and the allocator's own contract is
/// single-threaded. `#[cfg(test)]` modules elsewhere in this crate that drive
/// [`allocate`]/[`free`] or [`CmpctAllocator`] (rather than a locally
/// constructed `Heap`) take this lock for the duration of the test.
#[cfg(test)]
pub(crate) static GLOBAL_HEAP_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
