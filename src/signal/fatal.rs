//! Last-words reporting for crashes.
//!
//! SIGSEGV, SIGBUS and SIGILL get a one-shot handler that prints where the
//! fault happened in a fixed format, then re-raises the signal. Because the
//! handler is installed with `SA_RESETHAND`, the re-raised signal takes the
//! default action (exit, possibly with a core dump).
//!
//! Output format: `panic: runtime error at 0x<pc>: caught signal SIGSEGV`,
//! with the ` at 0x<pc>` part omitted when the faulting instruction is not
//! known for the target.

use super::constants::{signal_name, SIGBUS, SIGILL, SIGSEGV};
use super::handler::raise;
use crate::console;
use crate::error::Error;
use libc::{c_int, c_void, siginfo_t};

pub const FATAL_SIGNALS: [u32; 3] = [SIGBUS, SIGILL, SIGSEGV];

pub fn register_fatal_signals() -> Result<(), Error> {
    for sig in FATAL_SIGNALS {
        unsafe {
            let mut action: libc::sigaction = core::mem::zeroed();
            action.sa_sigaction =
                on_fatal_signal as extern "C" fn(c_int, *mut siginfo_t, *mut c_void) as libc::sighandler_t;
            action.sa_flags = libc::SA_SIGINFO | libc::SA_RESETHAND;
            libc::sigemptyset(&mut action.sa_mask);
            Error::from_ret(libc::sigaction(sig as c_int, &action, core::ptr::null_mut()))?;
        }
    }
    log::debug!("fatal signal reporting installed for SIGBUS, SIGILL, SIGSEGV");
    Ok(())
}

extern "C" fn on_fatal_signal(sig: c_int, _info: *mut siginfo_t, context: *mut c_void) {
    report(sig as u32, fault_pc(context));

    // Do not abort: the handler has reset itself, so this lands in the
    // default disposition once we return.
    let _ = raise(sig as u32);
}

/// Print the crash line. Async-signal-safe.
pub(crate) fn report(sig: u32, pc: usize) {
    if pc != 0 {
        console::print_str("panic: runtime error at ");
        console::print_hex(pc);
    } else {
        console::print_str("panic: runtime error");
    }
    console::print_str(": caught signal ");
    match sig {
        SIGBUS | SIGILL | SIGSEGV => console::print_str(signal_name(sig)),
        _ => console::print_dec(sig as i64),
    }
    console::putchar(b'\n');
}

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
fn fault_pc(context: *mut c_void) -> usize {
    if context.is_null() {
        return 0;
    }
    let ucontext = context as *const libc::ucontext_t;
    unsafe { (*ucontext).uc_mcontext.gregs[libc::REG_RIP as usize] as usize }
}

#[cfg(all(target_os = "linux", target_arch = "aarch64"))]
fn fault_pc(context: *mut c_void) -> usize {
    if context.is_null() {
        return 0;
    }
    let ucontext = context as *const libc::ucontext_t;
    unsafe { (*ucontext).uc_mcontext.pc as usize }
}

#[cfg(not(all(
    target_os = "linux",
    any(target_arch = "x86_64", target_arch = "aarch64")
)))]
fn fault_pc(_context: *mut c_void) -> usize {
    0
}
