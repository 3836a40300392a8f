//! Heap region: one large virtual reservation whose live prefix grows on demand.
//!
//! The whole range is mapped read/write up front. Anonymous private pages
//! are only backed by RAM once touched, so reserving 1 GiB costs address
//! space, not memory. The region never moves and is never unmapped.

use crate::error::{fatal, Fatal};
use core::ptr::NonNull;

pub const PAGE_SIZE: usize = 4096;

/// Source of virtual address space.
pub trait AddressSpace {
    /// Reserve `len` bytes of private read/write memory, or `None` if the
    /// address space cannot hold a range that large.
    fn reserve(&mut self, len: usize) -> Option<NonNull<u8>>;
}

/// Anonymous `mmap` reservations.
pub struct Mmap;

impl AddressSpace for Mmap {
    fn reserve(&mut self, len: usize) -> Option<NonNull<u8>> {
        let addr = unsafe {
            libc::mmap(
                core::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANON,
                -1,
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return None;
        }
        NonNull::new(addr as *mut u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapRegion {
    start: usize,
    active_size: usize,
    max_size: usize,
}

impl HeapRegion {
    /// Reserve the region, halving `max_size` after every failed attempt.
    ///
    /// Every attempt is rounded down to whole pages, so both ends of the
    /// live prefix stay page aligned. Fatal once the rounded size drops
    /// below `min_size` or a single page. The live prefix starts at
    /// `initial_size`, clamped into `[PAGE_SIZE, max_size]`.
    pub fn reserve<A: AddressSpace>(
        space: &mut A,
        mut max_size: usize,
        min_size: usize,
        initial_size: usize,
    ) -> HeapRegion {
        loop {
            let size = page_align_down(max_size);
            if size < min_size.max(PAGE_SIZE) {
                fatal(Fatal::HeapUnavailable);
            }

            if let Some(addr) = space.reserve(size) {
                let active_size = page_align_down(initial_size)
                    .max(PAGE_SIZE)
                    .min(size);
                log::debug!(
                    "heap: reserved {} KiB at {:#x}, live {} KiB",
                    size / 1024,
                    addr.as_ptr() as usize,
                    active_size / 1024
                );
                return HeapRegion {
                    start: addr.as_ptr() as usize,
                    active_size,
                    max_size: size,
                };
            }

            // Typical on 32-bit targets where 1 GiB of contiguous space is rare
            max_size = size / 2;
            log::debug!("heap: reservation failed, retrying with {} KiB", max_size / 1024);
        }
    }

    /// Build a region over an existing reservation.
    ///
    /// # Safety
    /// `[start, start + max_size)` must be mapped read/write for the rest of
    /// the process and not handed to anyone else.
    pub unsafe fn from_raw_parts(start: usize, active_size: usize, max_size: usize) -> HeapRegion {
        debug_assert!(active_size <= max_size);
        debug_assert_eq!(max_size % PAGE_SIZE, 0);
        debug_assert_eq!(active_size % PAGE_SIZE, 0);
        HeapRegion {
            start,
            active_size,
            max_size,
        }
    }

    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// End of the live prefix (exclusive).
    #[inline]
    pub fn active_end(&self) -> usize {
        self.start + self.active_size
    }

    #[inline]
    pub fn active_size(&self) -> usize {
        self.active_size
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Live bounds `[start, active_end)`.
    #[inline]
    pub fn bounds(&self) -> (usize, usize) {
        (self.start, self.active_end())
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.active_size == self.max_size
    }

    /// Grow the live prefix by roughly a third.
    ///
    /// Returns `false` and changes nothing once the prefix spans the whole
    /// reservation. Otherwise the new size is page aligned and capped at
    /// `max_size`, and always at least one page larger than before.
    pub fn grow(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        // active + active/3 rather than active*4/3: no overflow on 32-bit
        let target = page_align_down(self.active_size + self.active_size / 3)
            .max(self.active_size + PAGE_SIZE);
        self.active_size = target.min(self.max_size);
        true
    }
}

#[inline]
pub const fn page_align_down(size: usize) -> usize {
    size & !(PAGE_SIZE - 1)
}
