// Copyright 2025 The cmpctalloc Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! [`GlobalAlloc`] adapter over the core `allocate`/`free` primitives, so
//! the allocator can be installed with `#[global_allocator]` the way
//! allocator crates in this ecosystem are normally consumed.
//!
//! This is pure plumbing: it adds no allocation policy beyond handling
//! alignment requests above [`config::ALIGNMENT`], which the core protocol
//! does not support directly since every block's alignment is fixed.

use crate::config;
use crate::heap::Heap;
use std::alloc::{GlobalAlloc, Layout};
use std::mem;

/// Installs the allocator as the process's global allocator:
///
/// ```ignore
/// #[global_allocator]
/// static ALLOCATOR: cmpctalloc::CmpctAllocator = cmpctalloc::CmpctAllocator;
/// ```
pub struct CmpctAllocator;

unsafe impl GlobalAlloc for CmpctAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() <= config::ALIGNMENT {
            return Heap::global().allocate(layout.size());
        }

        // Over-allocate and hand-align, stashing the real allocation
        // pointer just before the aligned address so `dealloc` can recover
        // it (the same back-pointer technique `posix_memalign` uses over a
        // fixed-alignment allocator).
        let raw_size = layout.size() + layout.align() + mem::size_of::<usize>();
        let raw = Heap::global().allocate(raw_size);
        if raw.is_null() {
            return std::ptr::null_mut();
        }
        let align = layout.align();
        let aligned = (raw as usize + mem::size_of::<usize>() + align - 1) & !(align - 1);
        let aligned = aligned as *mut u8;
        *(aligned.sub(mem::size_of::<usize>()) as *mut usize) = raw as usize;
        aligned
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if layout.align() <= config::ALIGNMENT {
            Heap::global().free(ptr);
            return;
        }
        let raw = *(ptr.sub(mem::size_of::<usize>()) as *mut usize) as *mut u8;
        Heap::global().free(raw);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GLOBAL_HEAP_TEST_LOCK;

    #[test]
    fn over_aligned_request_is_actually_aligned() {
        let _guard = GLOBAL_HEAP_TEST_LOCK.lock().unwrap();
        let alloc = CmpctAllocator;
        let layout = Layout::from_size_align(64, 64).unwrap();
        unsafe {
            let p = alloc.alloc(layout);
            assert!(!p.is_null());
            assert_eq!(p as usize % 64, 0);
            alloc.dealloc(p, layout);
        }
    }

    #[test]
    fn default_alignment_request_roundtrips() {
        let _guard = GLOBAL_HEAP_TEST_LOCK.lock().unwrap();
        let alloc = CmpctAllocator;
        let layout = Layout::from_size_align(40, 8).unwrap();
        unsafe {
            let p = alloc.alloc(layout);
            assert!(!p.is_null());
            alloc.dealloc(p, layout);
        }
    }
}
