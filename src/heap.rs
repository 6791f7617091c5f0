// Copyright 2025 The cmpctalloc Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! The allocator core: `allocate` and `free`, and the single process-wide
//! [`Heap`] instance they operate on.
//!
//! The allocator holds process-wide mutable state (the free-list table and
//! the set of installed arenas) and performs no synchronization of its own.
//! All operations assume they are called from a single thread at a time;
//! calling `allocate` or `free` concurrently from more than one OS thread is
//! undefined behavior. This mirrors the allocator's declared non-goal of
//! thread safety rather than an oversight.

use crate::arena;
use crate::block;
use crate::config;
use crate::diagnostics;
use crate::freelist::FreeLists;
use crate::size_class::size_class;
use std::cell::UnsafeCell;
use std::ptr;

struct HeapState {
    lists: FreeLists,
    /// Becomes `true` the first time any arena is mapped. `free` on a
    /// pointer before this flips is always invalid.
    initialized: bool,
}

impl HeapState {
    const fn new() -> Self {
        Self {
            lists: FreeLists::new(),
            initialized: false,
        }
    }
}

/// The allocator's process-wide state, in a single static instance.
///
/// # Safety contract
///
/// `Heap` is `Sync` only so it can live in a `static`; it provides none of
/// the synchronization that implies. See the module documentation.
pub struct Heap {
    inner: UnsafeCell<HeapState>,
}

unsafe impl Sync for Heap {}

static GLOBAL_HEAP: Heap = Heap::new();

impl Heap {
    pub const fn new() -> Self {
        Self {
            inner: UnsafeCell::new(HeapState::new()),
        }
    }

    /// The single process-wide allocator instance.
    pub fn global() -> &'static Heap {
        &GLOBAL_HEAP
    }

    /// Implements the `allocate` operation (`SPEC_FULL.md` §4.5).
    pub fn allocate(&self, n: usize) -> *mut u8 {
        if n == 0 || n > config::MAX_ALLOC_PAYLOAD {
            return ptr::null_mut();
        }
        let mut req = config::round_up(n + config::META, config::ALIGNMENT);
        if req < config::MIN_FREE_BLOCK {
            req = config::MIN_FREE_BLOCK;
        }
        let idx = size_class(req);

        // SAFETY: single-threaded contract documented on `Heap`.
        let state = unsafe { &mut *self.inner.get() };

        let block_ptr = loop {
            let found = unsafe { state.lists.find_fit(idx, req) };
            if !found.is_null() {
                break found;
            }
            let granules = arena::granules_for(req);
            match unsafe { arena::new_arena(granules) } {
                Ok(fresh) => {
                    state.initialized = true;
                    unsafe { state.lists.insert_head(idx, fresh) };
                }
                Err(_) => diagnostics::fatal("out of memory: arena mapping failed"),
            }
        };

        unsafe { state.lists.unlink(idx, block_ptr) };
        let block_size = unsafe { block::size_of_block(block_ptr) };

        let result = if block_size >= req + config::MIN_FREE_BLOCK + config::MIN_ALLOC_PAYLOAD {
            // Split: low `req` bytes are returned, the remainder becomes a
            // fresh free block left in the same bucket `idx` it was carved
            // from (per `SPEC_FULL.md` §4.5 steps 7-8 and
            // `original_source/mymalloc.c`'s `my_malloc`), even though its
            // own size may now map to a different bucket; this is the
            // remainder-misbucketing case `SPEC_FULL.md` §9 accepts, and
            // re-bucketing it would starve `idx` of the split-off space the
            // next same-bucket request needs, since `allocate` never
            // searches any bucket but `idx` before growing.
            let remainder = unsafe { block_ptr.add(req) };
            let remainder_size = block_size - req;
            unsafe {
                block::stamp(remainder, remainder_size, false);
                block::set_links(remainder, ptr::null_mut(), ptr::null_mut());
                state.lists.insert_head(idx, remainder);
                block::stamp(block_ptr, req, true);
            }
            block_ptr
        } else {
            unsafe { block::stamp(block_ptr, block_size, true) };
            block_ptr
        };

        // Zero only the interior payload, not the boundary tags: the header
        // was just stamped above and the footer sits at
        // `result + req - META`, inside the `[result, result + req)` span a
        // naive zero-fill of the whole block would clobber.
        let payload = unsafe { result.add(config::META) };
        let block_size = unsafe { block::size_of_block(result) };
        let payload_len = block_size - 2 * config::META;
        unsafe { ptr::write_bytes(payload, 0, payload_len) };
        payload
    }

    /// Implements the `free` operation (`SPEC_FULL.md` §4.6).
    pub fn free(&self, p: *mut u8) {
        if p.is_null() {
            diagnostics::fatal("free() called with a null pointer");
        }

        // SAFETY: single-threaded contract documented on `Heap`.
        let state = unsafe { &mut *self.inner.get() };
        if !state.initialized {
            diagnostics::fatal("free() called before any allocation was ever made");
        }

        let block_ptr = unsafe { p.sub(config::META) };
        let tag = unsafe { block::read_tag(block_ptr) };
        if !block::is_alloc(tag) {
            diagnostics::fatal("free() called with a pointer that is not an outstanding allocation");
        }

        let mut size = block::size_of_tag(tag);
        let mut root = block_ptr;

        let left_footer = unsafe { block::left_neighbor_footer(block_ptr) };
        let left_tag = unsafe { block::read_tag(left_footer) };
        if left_tag != config::FENCE_MAGIC && !block::is_alloc(left_tag) {
            let left_size = block::size_of_tag(left_tag);
            let left_block = unsafe { block_ptr.sub(left_size) };
            unsafe { state.lists.unlink(size_class(left_size), left_block) };
            root = left_block;
            size += left_size;
        }

        let right_header = unsafe { block::right_neighbor_header(block_ptr) };
        let right_tag = unsafe { block::read_tag(right_header) };
        if right_tag != config::FENCE_MAGIC && !block::is_alloc(right_tag) {
            let right_size = block::size_of_tag(right_tag);
            unsafe { state.lists.unlink(size_class(right_size), right_header) };
            size += right_size;
        }

        unsafe {
            block::stamp(root, size, false);
            block::set_links(root, ptr::null_mut(), ptr::null_mut());
            state.lists.insert_head(size_class(size), root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_allocate_and_free_roundtrip() {
        let heap = Heap::new();
        let p = heap.allocate(32);
        assert!(!p.is_null());
        assert_eq!(p as usize % config::ALIGNMENT, 0);
        unsafe {
            for i in 0..32 {
                assert_eq!(*p.add(i), 0);
            }
        }
        heap.free(p);
    }

    #[test]
    fn zero_and_oversized_requests_return_null() {
        let heap = Heap::new();
        assert!(heap.allocate(0).is_null());
        assert!(heap.allocate(config::MAX_ALLOC_PAYLOAD + 1).is_null());
    }

    #[test]
    fn split_then_coalesce_recovers_original_free_bytes() {
        let heap = Heap::new();
        let a = heap.allocate(64);
        let b = heap.allocate(64);
        assert!(!a.is_null() && !b.is_null());
        assert_ne!(a, b);
        heap.free(a);
        heap.free(b);
        // A third allocation of the same size should succeed by reusing
        // coalesced space rather than requiring a fresh arena every time.
        let c = heap.allocate(64);
        assert!(!c.is_null());
        heap.free(c);
    }

    #[test]
    fn distinct_size_classes_do_not_share_blocks() {
        let heap = Heap::new();
        let small = heap.allocate(16);
        let large = heap.allocate(4000);
        assert!(!small.is_null() && !large.is_null());
        assert_ne!(small, large);
        heap.free(small);
        heap.free(large);
    }
}
