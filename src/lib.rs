//! POSIX runtime adaptation layer
//!
//! The pieces a small language runtime needs from a Unix kernel, and
//! nothing more:
//!
//! - **heap**: one large virtual reservation that grows in place
//!   (`memory`)
//! - **time**: monotonic and wall clocks in nanoseconds (`time`)
//! - **signals**: capture into a lock-free bitmask, delivery through a
//!   bounded queue (`signal`)
//! - **idle**: sleeping until a deadline or a signal without losing
//!   either (`idle`), driven by a small cooperative executor (`task`)
//!
//! # Usage
//!
//! ```rust,no_run
//! use posix_rt::{config::Config, signal, task::{Executor, Task}};
//!
//! posix_rt::init(&Config::from_env()).unwrap();
//! signal::enable(signal::SIGUSR1).unwrap();
//!
//! let mut executor = Executor::new();
//! executor
//!     .spawn(Task::new(async {
//!         let sig = signal::recv().await;
//!         log::info!("got {}", signal::signal_name(sig));
//!     }))
//!     .unwrap();
//! executor.run();
//! ```

#[macro_use]
pub mod console;

pub mod config;
pub mod error;
pub mod idle;
pub mod logger;
pub mod memory;
pub mod signal;
pub mod task;
pub mod time;

pub use config::Config;
pub use error::{fatal, Errno, Error, Fatal};

use core::sync::atomic::{AtomicBool, Ordering};

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// One-time runtime setup: logger, heap region, signal delivery queue and,
/// if configured, crash reporting for SIGSEGV/SIGBUS/SIGILL.
///
/// Must run before any task is spawned. A second call returns
/// `Error::AlreadyInitialized` and changes nothing.
pub fn init(config: &Config) -> Result<(), Error> {
    if INITIALIZED.swap(true, Ordering::AcqRel) {
        return Err(Error::AlreadyInitialized("runtime"));
    }

    if !logger::init(config.log_level) {
        log::debug!("logger already installed, keeping it");
    }

    let (start, end) = memory::init(config)?;
    log::debug!("init: heap live {:#x}..{:#x}", start, end);

    signal::init(config.delivery_capacity)?;

    if config.fatal_signals {
        signal::fatal::register_fatal_signals()?;
    }

    log::info!("posix-rt initialized");
    Ok(())
}

/// Whether [`init`] has run.
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}
