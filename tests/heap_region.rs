mod shared_runtime;
use shared_runtime::{init_runtime, serial};

use posix_rt::config::Config;
use posix_rt::memory::{self, ProcessHeap, RegionAllocator, PAGE_SIZE};
use posix_rt::Error;
use std::alloc::{GlobalAlloc, Layout};

#[test]
fn test_second_init_is_rejected() {
    init_runtime();
    assert!(posix_rt::is_initialized());
    assert!(matches!(
        posix_rt::init(&Config::default()),
        Err(Error::AlreadyInitialized(_))
    ));
    assert!(matches!(
        memory::init(&Config::default()),
        Err(Error::AlreadyInitialized(_))
    ));
}

/// Grow the process region to exhaustion, checking every step reaches the
/// process allocator too
#[test]
fn test_process_region_grows_to_max_then_stops() {
    init_runtime();
    let _guard = serial();

    let (start, mut end) = memory::bounds().expect("heap initialized");
    let max = 16 * 1024 * 1024;
    while memory::grow() {
        let (s, e) = memory::bounds().unwrap();
        assert_eq!(s, start);
        assert!(e > end, "grow must make progress");
        assert_eq!((e - s) % PAGE_SIZE, 0);
        assert!(e - s <= max);
        assert_eq!(memory::allocator().size(), e - s);
        end = e;
    }
    assert_eq!(end - start, max);

    // Exhausted: state stays put
    assert!(!memory::grow());
    assert_eq!(memory::bounds(), Some((start, end)));
    assert_eq!(memory::allocator().size(), max);
}

/// Blocks from the process heap come from the live prefix of the process
/// region, and are handed back by address
#[test]
fn test_process_heap_allocates_inside_region() {
    init_runtime();
    let _guard = serial();

    let layout = Layout::from_size_align(4096, 64).unwrap();
    let used_before = memory::allocator().used();
    unsafe {
        let ptr = ProcessHeap.alloc(layout);
        assert!(!ptr.is_null());
        let (start, end) = memory::bounds().unwrap();
        assert!(ptr as usize >= start && ptr as usize + layout.size() <= end);
        assert!(memory::allocator().owns(ptr));
        ptr.write_bytes(0x3c, layout.size());
        ProcessHeap.dealloc(ptr, layout);
    }
    assert_eq!(memory::allocator().used(), used_before);
}

/// A configured maximum that is not a page multiple still yields a region
/// whose every size is whole pages
#[test]
fn test_unaligned_configured_max_stays_page_aligned() {
    let config = Config::from_lookup(|key| match key {
        "POSIX_RT_HEAP_MAX" => Some("200000".to_string()),
        "POSIX_RT_HEAP_INITIAL" => Some("10000".to_string()),
        _ => None,
    });
    let mut region = memory::reserve(&config);
    assert_eq!(region.max_size(), 196_608);
    assert_eq!(region.active_size() % PAGE_SIZE, 0);
    while region.grow() {
        assert_eq!(region.active_size() % PAGE_SIZE, 0);
        assert_eq!(region.active_end() % PAGE_SIZE, 0);
    }
    assert_eq!(region.active_size(), 196_608);
}

/// The allocator grows its own region on demand and the new pages are usable
#[test]
fn test_region_allocator_grows_and_exhausts() {
    let config = Config {
        heap_max_size: 1024 * 1024,
        heap_initial_size: 64 * 1024,
        ..Config::default()
    };
    let allocator = RegionAllocator::new();
    assert!(allocator.init(memory::reserve(&config)));
    let (start, initial_end) = allocator.bounds().unwrap();
    assert_eq!(initial_end - start, 64 * 1024);

    let layout = Layout::from_size_align(128 * 1024, 16).unwrap();
    let mut blocks = Vec::new();
    loop {
        let ptr = unsafe { allocator.alloc(layout) };
        if ptr.is_null() {
            break;
        }
        // Touch both ends so an unmapped page would fault
        unsafe {
            ptr.write(0xa5);
            ptr.add(layout.size() - 1).write(0x5a);
        }
        blocks.push(ptr);
    }

    let (_, final_end) = allocator.bounds().unwrap();
    assert_eq!(final_end - start, 1024 * 1024);
    assert!(!blocks.is_empty());
    assert!(!allocator.grow());

    for ptr in blocks {
        unsafe { allocator.dealloc(ptr, layout) };
    }
    assert_eq!(allocator.used(), 0);
}
