//! Kernel-facing half of signal capture: disposition changes and the
//! handler entry point itself.

use crate::error::Error;
use libc::c_int;

/// Where the kernel should send a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Run [`on_signal`]
    Capture,
    /// Discard occurrences (`SIG_IGN`)
    Ignore,
    /// Platform default action (`SIG_DFL`)
    Default,
}

/// Signal handler entry point.
///
/// Runs in handler context: it may interrupt any instruction of ordinary
/// code, so it touches nothing but the pending bitmask. `try_get` on the
/// delivery cell is a single atomic load and never spins.
pub extern "C" fn on_signal(sig: c_int) {
    if let Ok(delivery) = super::DELIVERY.try_get() {
        delivery.notify(sig as u32);
    }
}

/// Install `disposition` for `sig`.
///
/// No `SA_RESTART`: a blocking call interrupted by a captured signal must
/// return early so the idle path can look at the pending bitmask.
pub fn set_disposition(sig: u32, disposition: Disposition) -> Result<(), Error> {
    let handler = match disposition {
        Disposition::Capture => on_signal as extern "C" fn(c_int) as libc::sighandler_t,
        Disposition::Ignore => libc::SIG_IGN,
        Disposition::Default => libc::SIG_DFL,
    };

    unsafe {
        let mut action: libc::sigaction = core::mem::zeroed();
        action.sa_sigaction = handler;
        action.sa_flags = 0;
        libc::sigemptyset(&mut action.sa_mask);
        Error::from_ret(libc::sigaction(sig as c_int, &action, core::ptr::null_mut()))?;
    }
    Ok(())
}

/// Send `sig` to the calling thread.
pub fn raise(sig: u32) -> Result<(), Error> {
    Error::from_ret(unsafe { libc::raise(sig as c_int) }).map(|_| ())
}
