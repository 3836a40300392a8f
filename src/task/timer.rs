//! Monotonic deadlines for tasks.
//!
//! A pending [`Sleep`] parks its waker in a process-wide deadline map. The
//! executor fires whatever has expired each time it runs out of ready
//! tasks, and otherwise uses the earliest deadline to bound its idle sleep.

use crate::time;
use core::{
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicU64, Ordering},
    task::{Context, Poll, Waker},
    time::Duration,
};
use spin::Mutex;
use std::collections::BTreeMap;

/// `(deadline_ns, timer id)` to the waker of the task sleeping on it.
static TIMERS: Mutex<BTreeMap<(u64, u64), Waker>> = Mutex::new(BTreeMap::new());

/// Suspend the calling task for at least `duration`.
pub fn sleep(duration: Duration) -> Sleep {
    let delta = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
    sleep_until(time::now_monotonic().saturating_add(delta))
}

/// Suspend the calling task until the monotonic clock reaches `deadline`
/// nanoseconds.
pub fn sleep_until(deadline: u64) -> Sleep {
    static NEXT_ID: AtomicU64 = AtomicU64::new(0);
    Sleep {
        deadline,
        id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        registered: false,
    }
}

pub struct Sleep {
    deadline: u64,
    id: u64,
    registered: bool,
}

impl Sleep {
    pub fn deadline(&self) -> u64 {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let key = (self.deadline, self.id);
        if time::now_monotonic() >= self.deadline {
            if self.registered {
                TIMERS.lock().remove(&key);
                self.registered = false;
            }
            return Poll::Ready(());
        }
        // Re-polls replace the previous waker under the same key
        TIMERS.lock().insert(key, cx.waker().clone());
        self.registered = true;
        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        if self.registered {
            TIMERS.lock().remove(&(self.deadline, self.id));
        }
    }
}

/// Earliest registered deadline, if any.
pub fn next_deadline() -> Option<u64> {
    TIMERS.lock().keys().next().map(|&(deadline, _)| deadline)
}

/// Wake every timer whose deadline is at or before `now`. Returns how many
/// fired.
pub fn fire_expired(now: u64) -> usize {
    let expired: Vec<Waker> = {
        let mut timers = TIMERS.lock();
        let later = timers.split_off(&(now.saturating_add(1), 0));
        core::mem::replace(&mut *timers, later).into_values().collect()
    };
    // Wake outside the lock; a woken waker may re-enter the timer map
    let fired = expired.len();
    for waker in expired {
        waker.wake();
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::task::noop_waker_ref;

    #[test]
    fn test_past_deadline_is_ready_immediately() {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut fut = sleep(Duration::ZERO);
        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn test_pending_sleep_registers_and_drop_unregisters() {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut fut = sleep(Duration::from_secs(3600));
        let key = (fut.deadline(), fut.id);
        assert_eq!(Pin::new(&mut fut).poll(&mut cx), Poll::Pending);
        assert!(TIMERS.lock().contains_key(&key));
        drop(fut);
        assert!(!TIMERS.lock().contains_key(&key));
    }

    #[test]
    fn test_fire_expired_keeps_later_timers() {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut soon = sleep(Duration::from_secs(5));
        let mut late = sleep(Duration::from_secs(3600));
        assert_eq!(Pin::new(&mut soon).poll(&mut cx), Poll::Pending);
        assert_eq!(Pin::new(&mut late).poll(&mut cx), Poll::Pending);

        fire_expired(soon.deadline());
        let timers = TIMERS.lock();
        assert!(!timers.contains_key(&(soon.deadline(), soon.id)));
        assert!(timers.contains_key(&(late.deadline(), late.id)));
    }
}
