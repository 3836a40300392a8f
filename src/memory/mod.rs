//! Heap region management.
//!
//! The process heap is a [`RegionAllocator`] over the region reserved by
//! [`init`]. Growing the region through [`grow`] extends the allocator's
//! free list in the same step, so the allocator always covers exactly the
//! live prefix. [`ProcessHeap`] exposes it as a `#[global_allocator]`.

pub mod allocator;
pub mod heap;

pub use allocator::RegionAllocator;
pub use heap::{AddressSpace, HeapRegion, Mmap, PAGE_SIZE};

use crate::config::Config;
use crate::error::Error;
use core::alloc::{GlobalAlloc, Layout};
use std::alloc::System;

static HEAP: RegionAllocator = RegionAllocator::new();

/// Reserve a region as described by `config` without installing it.
pub fn reserve(config: &Config) -> HeapRegion {
    HeapRegion::reserve(
        &mut Mmap,
        config.heap_max_size,
        config.heap_min_size,
        config.heap_initial_size,
    )
}

/// Reserve the process heap region and hand it to the process allocator.
pub fn init(config: &Config) -> Result<(usize, usize), Error> {
    if HEAP.is_initialized() {
        return Err(Error::AlreadyInitialized("heap region"));
    }
    let region = reserve(config);
    if !HEAP.init(region) {
        return Err(Error::AlreadyInitialized("heap region"));
    }
    log::info!(
        "heap: {:#x}..{:#x} live, {} MiB reserved",
        region.start(),
        region.active_end(),
        region.max_size() / (1024 * 1024)
    );
    Ok(region.bounds())
}

/// The allocator managing the process heap region.
pub fn allocator() -> &'static RegionAllocator {
    &HEAP
}

/// Grow the process heap region and extend the allocator to the new end.
/// `false` means the heap is exhausted (or was never initialized) and the
/// caller must cope with that.
pub fn grow() -> bool {
    if !HEAP.is_initialized() {
        log::warn!("heap: grow() before init()");
        return false;
    }
    HEAP.grow()
}

/// Live bounds `[start, active_end)` of the process heap region.
pub fn bounds() -> Option<(usize, usize)> {
    HEAP.bounds()
}

/// Global allocator handle for the process heap.
///
/// Allocations made before [`init`] (the Rust runtime allocates before
/// `main`) go to the system allocator; frees are routed back by address.
/// Once the region is exhausted allocation fails instead of falling back.
/// The installed logger must not allocate, since growth logs with the heap
/// lock held.
///
/// ```rust,ignore
/// #[global_allocator]
/// static GLOBAL: posix_rt::memory::ProcessHeap = posix_rt::memory::ProcessHeap;
/// ```
pub struct ProcessHeap;

unsafe impl GlobalAlloc for ProcessHeap {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if HEAP.is_initialized() {
            HEAP.alloc(layout)
        } else {
            System.alloc(layout)
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if HEAP.owns(ptr) {
            HEAP.dealloc(ptr, layout)
        } else {
            System.dealloc(ptr, layout)
        }
    }
}
