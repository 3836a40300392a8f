//! Signal capture and delivery.
//!
//! This module turns asynchronous signal arrivals into something a
//! cooperative scheduler can consume:
//! - `enable`/`ignore`/`disable` maintain the interest set and the kernel
//!   disposition of each signal number
//! - the handler (`handler::on_signal`) records arrivals in a lock-free
//!   pending bitmask
//! - `drain` moves pending numbers into a bounded delivery queue
//! - `recv`/`stream` let a task wait on that queue
//!
//! Only numbers below 32 are supported. Per-thread masks and queued
//! real-time signals are out of scope; the process is assumed to have a
//! single thread running the scheduler.

pub mod constants;
pub mod delivery;
pub mod fatal;
pub mod handler;
pub mod set;

pub use constants::*;
pub use delivery::{Delivery, Recv, SignalStream};
pub use handler::Disposition;
pub use set::{AtomicSignalSet, SignalSet};

use crate::config::DEFAULT_DELIVERY_CAPACITY;
use crate::error::{fatal, Error, Fatal};
use conquer_once::spin::OnceCell;
use core::sync::atomic::{AtomicBool, Ordering};

static DELIVERY: OnceCell<Delivery> = OnceCell::uninit();

/// Signals currently routed to `handler::on_signal`.
static ACTIVE: AtomicSignalSet = AtomicSignalSet::new();

/// Set once any signal has been enabled. Never cleared: from then on the
/// idle path has to race-proof its sleeps.
static HAS_SIGNALS: AtomicBool = AtomicBool::new(false);

/// Create the delivery queue with room for `capacity` signal numbers.
///
/// Must run in ordinary context before the first `enable`; the queue is
/// allocated here so the handler never has to.
pub fn init(capacity: usize) -> Result<(), Error> {
    DELIVERY
        .try_init_once(|| Delivery::new(capacity))
        .map_err(|_| Error::AlreadyInitialized("signal delivery queue"))?;
    log::debug!("signal: delivery queue ready ({} slots)", capacity.max(1));
    Ok(())
}

/// The process-wide delivery pipeline, created with the default capacity
/// if `init` has not run yet.
pub fn delivery() -> &'static Delivery {
    DELIVERY.get_or_init(|| Delivery::new(DEFAULT_DELIVERY_CAPACITY))
}

fn check_range(sig: u32) {
    if sig >= MAX_SIGNALS {
        // Widening the bitmasks to an array would lift this
        fatal(Fatal::UnsupportedSignal(sig));
    }
}

/// Start capturing `sig`.
///
/// Fatal if `sig >= 32`. Kernel refusals (e.g. `SIGKILL`) are returned and
/// leave the interest set untouched.
pub fn enable(sig: u32) -> Result<(), Error> {
    check_range(sig);
    // Queue must exist before the handler can fire
    delivery();

    let before = ACTIVE.insert(sig);
    if let Err(e) = handler::set_disposition(sig, Disposition::Capture) {
        if !before.contains(sig) {
            ACTIVE.remove(sig);
        }
        log::warn!("signal: cannot capture {} ({}): {}", signal_name(sig), sig, e);
        return Err(e);
    }
    HAS_SIGNALS.store(true, Ordering::Release);
    log::debug!("signal: capturing {} ({})", signal_name(sig), sig);
    Ok(())
}

/// Stop capturing `sig` and have the kernel discard it.
pub fn ignore(sig: u32) -> Result<(), Error> {
    check_range(sig);
    ACTIVE.remove(sig);
    handler::set_disposition(sig, Disposition::Ignore)
}

/// Stop capturing `sig` and restore the platform default action.
pub fn disable(sig: u32) -> Result<(), Error> {
    check_range(sig);
    ACTIVE.remove(sig);
    handler::set_disposition(sig, Disposition::Default)
}

/// Snapshot of the interest set.
pub fn active() -> SignalSet {
    ACTIVE.load()
}

/// Whether any signal was ever enabled.
pub fn has_signals() -> bool {
    HAS_SIGNALS.load(Ordering::Acquire)
}

/// Move pending signals into the delivery queue. See [`Delivery::drain`].
pub fn drain() -> bool {
    delivery().drain()
}

/// Pop a delivered signal without waiting.
pub fn try_recv() -> Option<u32> {
    delivery().try_recv()
}

/// Wait for the next delivered signal.
///
/// Suspends only the calling task. One receiving task at a time.
pub fn recv() -> Recv<'static> {
    delivery().recv()
}

/// Delivered signals as a `Stream`.
pub fn stream() -> SignalStream<'static> {
    SignalStream::new(delivery())
}

/// Signals seen by the handler and not yet queued.
pub fn pending() -> SignalSet {
    delivery().pending()
}

/// Yield to other tasks until every pending signal has been queued and
/// every queued signal received.
///
/// For orderly shutdown; not meant for steady-state use.
pub async fn wait_until_idle() {
    let delivery = delivery();
    while !delivery.pending().is_empty() {
        delivery.drain();
        crate::task::yield_now().await;
    }
    while delivery.queued() != 0 {
        crate::task::yield_now().await;
    }
}

/// Send `sig` to the calling thread.
pub fn raise(sig: u32) -> Result<(), Error> {
    handler::raise(sig)
}
