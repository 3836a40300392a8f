use super::heap::HeapRegion;
use core::alloc::{GlobalAlloc, Layout};
use core::ptr::{self, NonNull};
use linked_list_allocator::Heap;
use spin::Mutex;

struct Inner {
    region: Option<HeapRegion>,
    heap: Heap,
}

/// First-fit allocator over the live prefix of a [`HeapRegion`].
///
/// When the live prefix cannot satisfy a request the region is grown and the
/// free list extended by the same amount, then the request is retried. Null
/// is returned only once the region is exhausted.
///
/// The process heap set up by `posix_rt::init` is one of these; see
/// [`super::ProcessHeap`] for using it as the global allocator. A private
/// instance over its own reservation also works:
///
/// ```rust,ignore
/// let allocator = RegionAllocator::new();
/// allocator.init(posix_rt::memory::reserve(&config));
/// ```
///
/// Must not be used from a signal handler: the lock below is not reentrant.
pub struct RegionAllocator {
    inner: Mutex<Inner>,
}

impl RegionAllocator {
    pub const fn new() -> Self {
        RegionAllocator {
            inner: Mutex::new(Inner {
                region: None,
                heap: Heap::empty(),
            }),
        }
    }

    /// Hand the allocator its region. Only the first call takes effect.
    pub fn init(&self, region: HeapRegion) -> bool {
        let mut inner = self.inner.lock();
        if inner.region.is_some() {
            log::warn!("allocator: region already installed, ignoring second init");
            return false;
        }
        unsafe {
            inner.heap.init(region.start() as *mut u8, region.active_size());
        }
        inner.region = Some(region);
        true
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock().region.is_some()
    }

    /// Whether `ptr` lies anywhere in the reservation, live or not.
    pub fn owns(&self, ptr: *const u8) -> bool {
        match self.inner.lock().region {
            Some(region) => {
                let addr = ptr as usize;
                addr >= region.start() && addr < region.start() + region.max_size()
            }
            None => false,
        }
    }

    /// Bytes under management by the free list. Tracks the live prefix.
    pub fn size(&self) -> usize {
        self.inner.lock().heap.size()
    }

    /// Current live bounds, if initialized.
    pub fn bounds(&self) -> Option<(usize, usize)> {
        self.inner.lock().region.map(|r| r.bounds())
    }

    /// Bytes currently handed out.
    pub fn used(&self) -> usize {
        self.inner.lock().heap.used()
    }

    /// Grow the region one step and move the allocator's end to match.
    pub fn grow(&self) -> bool {
        let mut inner = self.inner.lock();
        grow_locked(&mut inner)
    }
}

fn grow_locked(inner: &mut Inner) -> bool {
    let region = match inner.region.as_mut() {
        Some(region) => region,
        None => return false,
    };
    let old_end = region.active_end();
    if !region.grow() {
        log::warn!("allocator: heap region exhausted at {} KiB", region.max_size() / 1024);
        return false;
    }
    let new_end = region.active_end();
    // SAFETY: [old_end, new_end) lies inside the reservation and directly
    // follows the heap's current top.
    unsafe {
        inner.heap.extend(new_end - old_end);
    }
    log::trace!("allocator: heap end {:#x} -> {:#x}", old_end, new_end);
    true
}

impl Default for RegionAllocator {
    fn default() -> Self {
        Self::new()
    }
}

unsafe impl GlobalAlloc for RegionAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let mut inner = self.inner.lock();
        loop {
            if let Ok(ptr) = inner.heap.allocate_first_fit(layout) {
                return ptr.as_ptr();
            }
            if !grow_locked(&mut inner) {
                return ptr::null_mut();
            }
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if let Some(ptr) = NonNull::new(ptr) {
            self.inner.lock().heap.deallocate(ptr, layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::heap::{Mmap, PAGE_SIZE};

    fn small_allocator(initial: usize, max: usize) -> RegionAllocator {
        let allocator = RegionAllocator::new();
        let region = HeapRegion::reserve(&mut Mmap, max, PAGE_SIZE, initial);
        assert!(allocator.init(region));
        allocator
    }

    #[test]
    fn test_alloc_within_initial_prefix() {
        let allocator = small_allocator(16 * 1024, 64 * 1024);
        let (start, end) = allocator.bounds().unwrap();
        let layout = Layout::from_size_align(256, 16).unwrap();
        unsafe {
            let ptr = allocator.alloc(layout);
            assert!(!ptr.is_null());
            assert!((ptr as usize) >= start && (ptr as usize) + 256 <= end);
            allocator.dealloc(ptr, layout);
        }
        assert_eq!(allocator.bounds().unwrap(), (start, end));
    }

    #[test]
    fn test_alloc_grows_region_on_demand() {
        let allocator = small_allocator(16 * 1024, 256 * 1024);
        let (start, end_before) = allocator.bounds().unwrap();
        let layout = Layout::from_size_align(24 * 1024, 8).unwrap();
        unsafe {
            let ptr = allocator.alloc(layout);
            assert!(!ptr.is_null());
            ptr.write_bytes(0x5a, layout.size());
        }
        let (start_after, end_after) = allocator.bounds().unwrap();
        assert_eq!(start_after, start);
        assert!(end_after > end_before);
    }

    #[test]
    fn test_alloc_fails_once_exhausted() {
        let allocator = small_allocator(8 * 1024, 32 * 1024);
        let layout = Layout::from_size_align(64 * 1024, 8).unwrap();
        unsafe {
            assert!(allocator.alloc(layout).is_null());
        }
        let (start, end) = allocator.bounds().unwrap();
        assert_eq!(end - start, 32 * 1024);
        assert!(!allocator.grow());
    }

    #[test]
    fn test_grow_extends_free_list_to_new_end() {
        let allocator = small_allocator(16 * 1024, 256 * 1024);
        assert_eq!(allocator.size(), 16 * 1024);
        while allocator.grow() {
            let (start, end) = allocator.bounds().unwrap();
            assert_eq!(allocator.size(), end - start);
        }
        assert_eq!(allocator.size(), 256 * 1024);
    }

    #[test]
    fn test_owns_covers_whole_reservation() {
        let allocator = small_allocator(8 * 1024, 32 * 1024);
        let (start, end) = allocator.bounds().unwrap();
        assert!(allocator.owns(start as *const u8));
        // Reserved but not yet live still belongs to the region
        assert!(allocator.owns(end as *const u8));
        assert!(!allocator.owns((start + 32 * 1024) as *const u8));
        assert!(!RegionAllocator::new().owns(start as *const u8));
    }

    #[test]
    fn test_second_init_is_ignored() {
        let allocator = small_allocator(8 * 1024, 32 * 1024);
        let bounds = allocator.bounds();
        let other = HeapRegion::reserve(&mut Mmap, 32 * 1024, PAGE_SIZE, 8 * 1024);
        assert!(!allocator.init(other));
        assert_eq!(allocator.bounds(), bounds);
    }

    #[test]
    fn test_uninitialized_allocator_returns_null() {
        let allocator = RegionAllocator::new();
        assert!(allocator.bounds().is_none());
        unsafe {
            assert!(allocator.alloc(Layout::from_size_align(8, 8).unwrap()).is_null());
        }
    }
}
