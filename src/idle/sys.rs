//! Blocking kernel calls used by the idle path.

use crate::error::{Errno, Error};
use crate::signal::SignalSet;
use core::time::Duration;
use libc::c_int;

/// Largest argument POSIX guarantees `usleep` accepts.
const MAX_USLEEP_MICROS: u128 = 999_999;

/// Sleep for `duration`, truncated to whole microseconds.
///
/// Returns early with `EINTR` if a signal handler runs during the sleep.
pub fn usleep(duration: Duration) -> Result<(), Errno> {
    let mut remaining = duration.as_micros();
    while remaining > 0 {
        let chunk = remaining.min(MAX_USLEEP_MICROS);
        if unsafe { libc::usleep(chunk as libc::useconds_t) } != 0 {
            return Err(Errno::last());
        }
        remaining -= chunk;
    }
    Ok(())
}

/// Blocks a signal set for the calling thread until dropped, then restores
/// the previous mask.
///
/// The process is single-threaded, so this is the process mask in practice.
pub struct MaskGuard {
    previous: libc::sigset_t,
}

impl MaskGuard {
    pub fn block(set: SignalSet) -> Result<MaskGuard, Error> {
        let blocked = set.to_sigset();
        let mut previous: libc::sigset_t = unsafe { core::mem::zeroed() };
        // pthread_sigmask reports failure through its return value, not errno
        let ret = unsafe { libc::pthread_sigmask(libc::SIG_BLOCK, &blocked, &mut previous) };
        if ret != 0 {
            return Err(Error::Os(Errno::from_raw(ret)));
        }
        Ok(MaskGuard { previous })
    }
}

impl Drop for MaskGuard {
    fn drop(&mut self) {
        unsafe {
            libc::pthread_sigmask(libc::SIG_SETMASK, &self.previous, core::ptr::null_mut());
        }
    }
}

/// Wait up to `timeout` for one of `set` to become pending and consume it.
///
/// `set` must be blocked by the caller. Returns `None` on timeout or when
/// an unrelated handler interrupted the wait.
#[cfg(not(target_vendor = "apple"))]
pub fn timed_wait(set: SignalSet, timeout: Duration) -> Option<u32> {
    let sigset = set.to_sigset();
    let mut ts: libc::timespec = unsafe { core::mem::zeroed() };
    ts.tv_sec = timeout.as_secs().min(libc::time_t::MAX as u64) as libc::time_t;
    ts.tv_nsec = timeout.subsec_nanos() as _;
    let sig = unsafe { libc::sigtimedwait(&sigset, core::ptr::null_mut(), &ts) };
    if sig < 0 {
        None
    } else {
        Some(sig as u32)
    }
}

/// Wait without a bound for one of `set` to become pending and consume it.
///
/// `set` must be blocked by the caller.
pub fn wait(set: SignalSet) -> Option<u32> {
    let sigset = set.to_sigset();
    let mut sig: c_int = 0;
    let ret = unsafe { libc::sigwait(&sigset, &mut sig) };
    if ret == 0 {
        Some(sig as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_usleep_waits_at_least_duration() {
        let start = Instant::now();
        usleep(Duration::from_millis(20)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_usleep_zero_returns_immediately() {
        usleep(Duration::from_nanos(500)).unwrap();
    }

    #[cfg(not(target_vendor = "apple"))]
    #[test]
    fn test_timed_wait_times_out() {
        let set = SignalSet::EMPTY.with(libc::SIGUSR2 as u32);
        let _guard = MaskGuard::block(set).unwrap();
        let start = Instant::now();
        assert_eq!(timed_wait(set, Duration::from_millis(30)), None);
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[cfg(not(target_vendor = "apple"))]
    #[test]
    fn test_timed_wait_consumes_blocked_signal() {
        let set = SignalSet::EMPTY.with(libc::SIGUSR2 as u32);
        let _guard = MaskGuard::block(set).unwrap();
        // Blocked, so this stays pending on the thread instead of running a handler
        unsafe {
            libc::raise(libc::SIGUSR2);
        }
        assert_eq!(
            timed_wait(set, Duration::from_secs(1)),
            Some(libc::SIGUSR2 as u32)
        );
    }

    #[test]
    fn test_mask_guard_restores_previous_mask() {
        let set = SignalSet::EMPTY.with(libc::SIGUSR2 as u32);
        let is_blocked = || unsafe {
            let mut current: libc::sigset_t = core::mem::zeroed();
            libc::pthread_sigmask(libc::SIG_BLOCK, core::ptr::null(), &mut current);
            libc::sigismember(&current, libc::SIGUSR2) == 1
        };
        assert!(!is_blocked());
        {
            let _guard = MaskGuard::block(set).unwrap();
            assert!(is_blocked());
        }
        assert!(!is_blocked());
    }
}
