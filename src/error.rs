//! Error types for posix-rt operations.
//!
//! Two tiers:
//! - [`Error`] is returned for conditions the caller can act on (a kernel call
//!   refused, a singleton initialized twice).
//! - [`Fatal`] names the conditions that halt the process. They are raised
//!   through [`fatal`], never returned.

use core::fmt;

/// POSIX errno values this crate inspects.
///
/// Numeric values differ between platforms, so they are resolved through
/// `libc` rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
    /// Operation not permitted
    EPERM,
    /// Interrupted system call
    EINTR,
    /// Resource temporarily unavailable (also the `sigtimedwait` timeout)
    EAGAIN,
    /// Out of memory
    ENOMEM,
    /// Invalid argument
    EINVAL,
    /// Any other errno, kept verbatim
    Other(i32),
}

impl Errno {
    /// Map a raw errno value to an `Errno`.
    pub fn from_raw(raw: i32) -> Errno {
        match raw {
            libc::EPERM => Errno::EPERM,
            libc::EINTR => Errno::EINTR,
            libc::EAGAIN => Errno::EAGAIN,
            libc::ENOMEM => Errno::ENOMEM,
            libc::EINVAL => Errno::EINVAL,
            other => Errno::Other(other),
        }
    }

    /// The errno left behind by the last failed libc call on this thread.
    pub fn last() -> Errno {
        Errno::from_raw(
            std::io::Error::last_os_error()
                .raw_os_error()
                .unwrap_or(libc::EINVAL),
        )
    }

    /// Raw platform value.
    pub fn raw(self) -> i32 {
        match self {
            Errno::EPERM => libc::EPERM,
            Errno::EINTR => libc::EINTR,
            Errno::EAGAIN => libc::EAGAIN,
            Errno::ENOMEM => libc::ENOMEM,
            Errno::EINVAL => libc::EINVAL,
            Errno::Other(raw) => raw,
        }
    }
}

/// Unified error type for recoverable posix-rt failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A libc call failed with this errno.
    Os(Errno),
    /// A process-wide singleton was initialized twice.
    AlreadyInitialized(&'static str),
    /// A bounded queue had no free slot.
    QueueFull,
}

impl Error {
    /// Capture errno after a failed libc call.
    #[inline]
    pub fn last_os_error() -> Error {
        Error::Os(Errno::last())
    }

    /// Convert a libc-style return value (`-1` plus errno on failure).
    #[inline]
    pub fn from_ret(ret: i32) -> Result<i32, Error> {
        if ret < 0 {
            Err(Error::last_os_error())
        } else {
            Ok(ret)
        }
    }
}

impl From<Errno> for Error {
    fn from(e: Errno) -> Self {
        Error::Os(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Os(e) => write!(f, "os error: {:?} ({})", e, e.raw()),
            Error::AlreadyInitialized(what) => write!(f, "{} already initialized", what),
            Error::QueueFull => write!(f, "queue full"),
        }
    }
}

impl std::error::Error for Error {}

/// Unrecoverable runtime conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatal {
    /// Not even the minimum heap reservation could be mapped.
    HeapUnavailable,
    /// A signal number outside `[0, 32)` was passed to enable/ignore/disable.
    UnsupportedSignal(u32),
    /// An indefinite wait was requested with no event source registered.
    Deadlock,
}

impl Fatal {
    /// Short diagnostic printed before the process halts.
    pub fn message(&self) -> &'static str {
        match self {
            Fatal::HeapUnavailable => "cannot allocate heap memory",
            Fatal::UnsupportedSignal(_) => "unsupported signal number",
            Fatal::Deadlock => "deadlocked: no event source",
        }
    }
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fatal::UnsupportedSignal(sig) => write!(f, "{} {}", self.message(), sig),
            _ => f.write_str(self.message()),
        }
    }
}

/// Report a fatal condition and halt.
///
/// The diagnostic goes straight to stderr with `write(2)` so it is visible
/// even if the logger is not installed. The crate builds with
/// `panic = "abort"`, so the panic below terminates the process.
#[cold]
#[track_caller]
pub fn fatal(reason: Fatal) -> ! {
    crate::console::print_str("panic: ");
    crate::console::print_str(reason.message());
    crate::console::putchar(b'\n');
    log::error!("fatal: {}", reason);
    panic!("{}", reason);
}
