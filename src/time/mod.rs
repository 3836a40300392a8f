//! Public façade for time-related facilities.
//!
//! The OS clock already works in nanoseconds, so scheduler ticks and
//! nanoseconds are the same unit and the conversions are identities.

pub mod clock;

pub use clock::Timespec;

/// Scheduler tick. One tick is one nanosecond.
pub type TimeUnit = i64;

#[inline]
pub fn ticks_to_nanoseconds(ticks: TimeUnit) -> i64 {
    ticks
}

#[inline]
pub fn nanoseconds_to_ticks(ns: i64) -> TimeUnit {
    ns
}

/// Monotonic time in nanoseconds.
///
/// Only comparable with other monotonic readings.
#[inline]
pub fn now_monotonic() -> u64 {
    clock::clock_gettime(clock::CLOCK_MONOTONIC).as_nanos()
}

/// Current scheduler tick.
#[inline]
pub fn ticks() -> TimeUnit {
    now_monotonic() as TimeUnit
}

/// Wall-clock reading plus a monotonic reading taken right after it.
///
/// Returns `(seconds, nanoseconds, monotonic_nanoseconds)`, the shape a
/// language-level `time.now()` wants.
pub fn now_wallclock() -> (i64, i32, i64) {
    let ts = clock::clock_gettime(clock::CLOCK_REALTIME);
    (ts.tv_sec, ts.tv_nsec as i32, now_monotonic() as i64)
}
