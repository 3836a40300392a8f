//! Where the scheduler goes when it has nothing to run.
//!
//! `sleep_for` and `wait_forever` suspend the whole process until a timer
//! deadline passes or a captured signal arrives. The strategy is fixed at
//! build time:
//!
//! - Apple targets have no `sigtimedwait`, so they use [`PollingSleep`] and
//!   accept a small window where a signal is noticed late.
//! - Everything else uses [`MaskedWait`], which cannot miss a signal.

pub mod strategies;
pub mod sys;

pub use strategies::{IdleStrategy, PollingSleep};

#[cfg(not(target_vendor = "apple"))]
pub use strategies::MaskedWait;

#[cfg(target_vendor = "apple")]
pub type Platform = PollingSleep;
#[cfg(not(target_vendor = "apple"))]
pub type Platform = MaskedWait;

use crate::error::{fatal, Fatal};
use crate::signal;
use core::time::Duration;

/// Sleep for up to `duration`.
///
/// Without any signal interest this is a plain `usleep`. Otherwise the
/// platform strategy runs and the sleep may end early with a signal
/// delivered.
pub fn sleep_for(duration: Duration) {
    if !signal::has_signals() {
        let _ = sys::usleep(duration);
        return;
    }
    Platform::sleep(signal::delivery(), signal::active(), duration);
}

/// Block until a captured signal has been delivered.
///
/// Fatal when no signal was ever enabled, since nothing could wake us.
pub fn wait_forever() {
    if !signal::has_signals() {
        fatal(Fatal::Deadlock);
    }
    Platform::wait(signal::delivery(), signal::active());
}
