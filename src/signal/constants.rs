//! Signal numbers and limits
//!
//! Numbers come from `libc` because they differ between platforms
//! (e.g. SIGUSR1 is 10 on Linux, 30 on macOS).

/// Signal numbers at or above this cannot be captured: the pending and
/// interest bitmasks are a single `u32`.
pub const MAX_SIGNALS: u32 = 32;

pub const SIGHUP: u32 = libc::SIGHUP as u32;
pub const SIGINT: u32 = libc::SIGINT as u32;
pub const SIGQUIT: u32 = libc::SIGQUIT as u32;
pub const SIGILL: u32 = libc::SIGILL as u32;
pub const SIGTRAP: u32 = libc::SIGTRAP as u32;
pub const SIGABRT: u32 = libc::SIGABRT as u32;
pub const SIGBUS: u32 = libc::SIGBUS as u32;
pub const SIGFPE: u32 = libc::SIGFPE as u32;
pub const SIGKILL: u32 = libc::SIGKILL as u32; // Cannot be caught or ignored
pub const SIGUSR1: u32 = libc::SIGUSR1 as u32;
pub const SIGSEGV: u32 = libc::SIGSEGV as u32;
pub const SIGUSR2: u32 = libc::SIGUSR2 as u32;
pub const SIGPIPE: u32 = libc::SIGPIPE as u32;
pub const SIGALRM: u32 = libc::SIGALRM as u32;
pub const SIGTERM: u32 = libc::SIGTERM as u32;
pub const SIGCHLD: u32 = libc::SIGCHLD as u32;
pub const SIGCONT: u32 = libc::SIGCONT as u32;
pub const SIGSTOP: u32 = libc::SIGSTOP as u32; // Cannot be caught or ignored
pub const SIGTSTP: u32 = libc::SIGTSTP as u32;
pub const SIGWINCH: u32 = libc::SIGWINCH as u32;

/// Convert signal number to its bit in a 32-bit mask.
///
/// Returns 0 for numbers that do not fit.
#[inline]
pub const fn sig_bit(sig: u32) -> u32 {
    if sig >= MAX_SIGNALS {
        0
    } else {
        1 << sig
    }
}

/// Conventional name of a signal, for diagnostics. Never allocates.
pub fn signal_name(sig: u32) -> &'static str {
    match sig {
        SIGHUP => "SIGHUP",
        SIGINT => "SIGINT",
        SIGQUIT => "SIGQUIT",
        SIGILL => "SIGILL",
        SIGTRAP => "SIGTRAP",
        SIGABRT => "SIGABRT",
        SIGBUS => "SIGBUS",
        SIGFPE => "SIGFPE",
        SIGKILL => "SIGKILL",
        SIGUSR1 => "SIGUSR1",
        SIGSEGV => "SIGSEGV",
        SIGUSR2 => "SIGUSR2",
        SIGPIPE => "SIGPIPE",
        SIGALRM => "SIGALRM",
        SIGTERM => "SIGTERM",
        SIGCHLD => "SIGCHLD",
        SIGCONT => "SIGCONT",
        SIGSTOP => "SIGSTOP",
        SIGTSTP => "SIGTSTP",
        SIGWINCH => "SIGWINCH",
        _ => "signal",
    }
}

/// Parse `"USR1"`, `"SIGUSR1"` or `"10"`.
pub fn parse_signal(name: &str) -> Option<u32> {
    let name = name.trim();
    if let Ok(num) = name.parse::<u32>() {
        return Some(num);
    }
    let upper = name.to_ascii_uppercase();
    let full = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{}", upper)
    };
    (1..MAX_SIGNALS).find(|&sig| signal_name(sig) == full)
}
