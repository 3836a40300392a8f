//! Shared runtime setup for the integration tests.
//!
//! Signal dispositions, the delivery queue and the heap region are
//! process-wide, so every test binary initializes the runtime once and
//! serializes the tests that touch the delivery queue.

#![allow(dead_code)]

use posix_rt::config::Config;
use std::sync::{Mutex, MutexGuard, Once};
use std::thread::{self, JoinHandle};
use std::time::Duration;

static INIT: Once = Once::new();
static SERIAL: Mutex<()> = Mutex::new(());

/// Initialize the runtime with a small heap and no crash reporter.
pub fn init_runtime() {
    INIT.call_once(|| {
        let config = Config {
            heap_max_size: 16 * 1024 * 1024,
            log_level: log::LevelFilter::Debug,
            fatal_signals: false,
            ..Config::default()
        };
        posix_rt::init(&config).expect("runtime init");
    });
}

/// Hold for the duration of a test that sends or receives signals.
///
/// A test that panicked while holding the lock leaves it poisoned; the
/// next test carries on regardless.
pub fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// Empty the delivery queue left behind by an earlier test.
pub fn flush_delivery() {
    posix_rt::signal::drain();
    while posix_rt::signal::try_recv().is_some() {}
}

/// The calling thread, as a signal target.
pub fn current_thread() -> libc::pthread_t {
    unsafe { libc::pthread_self() }
}

/// Send `sig` to `target` after `delay`, from a helper thread.
///
/// The test harness runs several threads, so signals are aimed at the
/// waiting thread rather than the process.
pub fn signal_thread_after(target: libc::pthread_t, sig: u32, delay: Duration) -> JoinHandle<()> {
    // pthread_t is an integer on Linux but a pointer on Apple targets
    let target = target as usize;
    thread::spawn(move || {
        thread::sleep(delay);
        let ret = unsafe { libc::pthread_kill(target as libc::pthread_t, sig as libc::c_int) };
        assert_eq!(ret, 0, "pthread_kill failed");
    })
}
