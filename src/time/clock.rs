//! Portable `clock_gettime`.
//!
//! 32-bit targets get the time64 entry point so readings stay valid past
//! 2038. 64-bit targets already have a 64-bit `time_t`.

/// Seconds and nanoseconds as returned by the kernel, always 64-bit wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timespec {
    pub tv_sec: i64,
    pub tv_nsec: i64,
}

impl Timespec {
    pub const fn new() -> Self {
        Timespec { tv_sec: 0, tv_nsec: 0 }
    }

    /// Total nanoseconds. Negative seconds (pre-1970 wall clock) wrap, same as
    /// the unsigned conversion the scheduler has always used.
    #[inline]
    pub const fn as_nanos(&self) -> u64 {
        (self.tv_sec as u64)
            .wrapping_mul(1_000_000_000)
            .wrapping_add(self.tv_nsec as u64)
    }
}

/// Monotonic clock id. Raw where available: it is not slewed by NTP.
#[cfg(any(target_os = "linux", target_os = "android", target_vendor = "apple"))]
pub const CLOCK_MONOTONIC: libc::clockid_t = libc::CLOCK_MONOTONIC_RAW;
#[cfg(not(any(target_os = "linux", target_os = "android", target_vendor = "apple")))]
pub const CLOCK_MONOTONIC: libc::clockid_t = libc::CLOCK_MONOTONIC;

pub const CLOCK_REALTIME: libc::clockid_t = libc::CLOCK_REALTIME;

/// Read `clock_id`. A failing clock read is not an expected condition and is
/// neither checked nor retried; the zeroed reading is returned as-is.
#[cfg(not(all(target_os = "linux", target_pointer_width = "32")))]
pub fn clock_gettime(clock_id: libc::clockid_t) -> Timespec {
    let mut ts: libc::timespec = unsafe { core::mem::zeroed() };
    unsafe {
        libc::clock_gettime(clock_id, &mut ts);
    }
    Timespec {
        tv_sec: ts.tv_sec as i64,
        tv_nsec: ts.tv_nsec as i64,
    }
}

#[cfg(all(target_os = "linux", target_pointer_width = "32"))]
#[repr(C)]
struct Timespec64 {
    tv_sec: i64,
    tv_nsec: i64,
}

#[cfg(all(target_os = "linux", target_pointer_width = "32"))]
extern "C" {
    // Exported by both glibc (2.34+) and musl (1.2+) on 32-bit targets.
    #[link_name = "__clock_gettime64"]
    fn clock_gettime64(clock_id: libc::clockid_t, ts: *mut Timespec64) -> libc::c_int;
}

#[cfg(all(target_os = "linux", target_pointer_width = "32"))]
pub fn clock_gettime(clock_id: libc::clockid_t) -> Timespec {
    let mut ts = Timespec64 { tv_sec: 0, tv_nsec: 0 };
    unsafe {
        clock_gettime64(clock_id, &mut ts);
    }
    // glibc's __timespec64 keeps a 32-bit tv_nsec followed by padding; on
    // little-endian the low half is the real value whatever the padding holds.
    Timespec {
        tv_sec: ts.tv_sec,
        tv_nsec: ts.tv_nsec as u32 as i64,
    }
}
