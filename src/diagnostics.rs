// Copyright 2025 The cmpctalloc Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Fatal-error reporting. The allocator has exactly two hard-failure paths
//! (invalid `free`, and out-of-memory during arena growth); both log a
//! diagnostic and abort the process rather than unwind, matching the
//! allocator's error model (`SPEC_FULL.md` §7).

/// Log `msg` at error level and abort the process. Never returns.
pub(crate) fn fatal(msg: &str) -> ! {
    log::error!("cmpctalloc: {msg}");
    std::process::abort()
}
