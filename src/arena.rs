// Copyright 2025 The cmpctalloc Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Arena provider: carves fresh arenas out of anonymous OS mappings.
//!
//! Each arena is `m * ARENA_SIZE` bytes, bounded by one-word fence posts
//! holding [`config::FENCE_MAGIC`] and containing a single free block
//! spanning the interior. Arenas are never unmapped; the allocator only
//! ever grows.

use crate::block;
use crate::config::{self, META};
use crate::error::{Error, Result};
use std::ptr;

/// Request `bytes` of fresh, zero-filled, page-aligned memory from the OS.
///
/// Anonymous `mmap` pages arrive zero-filled by kernel contract, which is
/// what lets arena initialization skip an explicit zero-fill of the
/// interior.
unsafe fn map_anonymous(bytes: usize) -> Result<*mut u8> {
    let ptr = libc::mmap(
        ptr::null_mut(),
        bytes,
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
    );
    if ptr == libc::MAP_FAILED {
        Err(Error::OutOfMemory)
    } else {
        Ok(ptr as *mut u8)
    }
}

/// Map `m` arena granules and lay out fence posts and the single interior
/// free block. Returns the header address of that interior block.
pub unsafe fn new_arena(m: usize) -> Result<*mut u8> {
    debug_assert!(m >= 1);
    let bytes = m * config::ARENA_SIZE;
    let base = map_anonymous(bytes)?;

    block::write_tag(base, config::FENCE_MAGIC);
    let right_fence = base.add(bytes).sub(META);
    block::write_tag(right_fence, config::FENCE_MAGIC);

    let interior = base.add(META);
    let interior_size = bytes - 2 * META;
    block::stamp(interior, interior_size, false);
    block::set_links(interior, ptr::null_mut(), ptr::null_mut());

    log::trace!("mapped arena: {m} granule(s), {bytes} bytes, interior {interior_size} bytes");

    Ok(interior)
}

/// Number of `ARENA_SIZE` granules needed to host a block of size `req`
/// plus its two fence posts, with one spare granule so small requests
/// don't pin an arena down to exactly their own size.
pub fn granules_for(req: usize) -> usize {
    (req + 2 * META).div_ceil(config::ARENA_SIZE) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granule_count_covers_request() {
        assert!(granules_for(64) >= 1);
        assert!(granules_for(config::ARENA_SIZE * 3) * config::ARENA_SIZE >= config::ARENA_SIZE * 3);
    }

    #[test]
    fn new_arena_lays_out_fences_and_interior() {
        unsafe {
            let interior = new_arena(1).expect("mmap should succeed in test environment");
            let bytes = config::ARENA_SIZE;
            let base = interior.sub(META);
            assert_eq!(block::read_tag(base), config::FENCE_MAGIC);
            let right_fence = base.add(bytes).sub(META);
            assert_eq!(block::read_tag(right_fence), config::FENCE_MAGIC);
            assert_eq!(block::size_of_block(interior), bytes - 2 * META);
            assert!(!block::is_alloc(block::read_tag(interior)));
        }
    }
}
