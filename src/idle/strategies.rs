//! The two ways of putting the process to sleep while staying responsive
//! to signals.
//!
//! Both are stateless: the signal state they act on is passed in, so they
//! can be exercised against a private `Delivery` as well as the global one.

use super::sys::{self, MaskGuard};
use crate::error::{fatal, Fatal};
use crate::signal::{Delivery, SignalSet};
use core::time::Duration;

/// Sleep/wait contract for the scheduler's idle path.
///
/// Never called from handler context.
pub trait IdleStrategy {
    /// Sleep for at most `duration`, returning early once a signal in
    /// `active` has been delivered.
    fn sleep(delivery: &Delivery, active: SignalSet, duration: Duration);

    /// Block until a signal in `active` has been delivered.
    ///
    /// Fatal if nothing is pending and `active` is empty: no event could
    /// ever end the wait.
    fn wait(delivery: &Delivery, active: SignalSet) {
        let _mask = match MaskGuard::block(active) {
            Ok(guard) => guard,
            Err(e) => {
                log::error!("idle: cannot mask {:?}: {}", active, e);
                return;
            }
        };

        if delivery.drain() {
            return;
        }
        if active.is_empty() {
            fatal(Fatal::Deadlock);
        }

        if let Some(sig) = sys::wait(active) {
            // sigwait consumed it, so the handler never ran
            delivery.notify(sig);
        }
        delivery.drain();
    }
}

/// Check, sleep, check again.
///
/// A signal that lands after the first check but before the sleep starts
/// is only noticed once the sleep returns, which may be the full
/// `duration` later. Nothing is lost, only observed late.
pub struct PollingSleep;

impl IdleStrategy for PollingSleep {
    fn sleep(delivery: &Delivery, _active: SignalSet, duration: Duration) {
        if delivery.drain() {
            return;
        }
        // EINTR just means a handler ran; the drain below picks it up
        let _ = sys::usleep(duration);
        delivery.drain();
    }
}

/// Mask the interest set, check, then wait for the timeout or a masked
/// signal in a single call. A signal arriving at any point after the mask
/// is taken ends the wait.
#[cfg(not(target_vendor = "apple"))]
pub struct MaskedWait;

#[cfg(not(target_vendor = "apple"))]
impl IdleStrategy for MaskedWait {
    fn sleep(delivery: &Delivery, active: SignalSet, duration: Duration) {
        let _mask = match MaskGuard::block(active) {
            Ok(guard) => guard,
            Err(e) => {
                log::warn!("idle: cannot mask {:?} ({}), sleeping unmasked", active, e);
                return PollingSleep::sleep(delivery, active, duration);
            }
        };

        if delivery.drain() {
            return;
        }
        if let Some(sig) = sys::timed_wait(active, duration) {
            delivery.notify(sig);
        }
        delivery.drain();
    }
}
