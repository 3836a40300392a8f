//! Bitsets over signal numbers `[0, 32)`.

use super::constants::{sig_bit, MAX_SIGNALS};
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

/// A plain snapshot of signal numbers.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct SignalSet(u32);

impl SignalSet {
    pub const EMPTY: SignalSet = SignalSet(0);

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        SignalSet(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn contains(self, sig: u32) -> bool {
        sig < MAX_SIGNALS && self.0 & sig_bit(sig) != 0
    }

    #[inline]
    pub const fn with(self, sig: u32) -> Self {
        SignalSet(self.0 | sig_bit(sig))
    }

    #[inline]
    pub const fn without(self, sig: u32) -> Self {
        SignalSet(self.0 & !sig_bit(sig))
    }

    /// Lowest-numbered member. Drain order is ascending by number.
    #[inline]
    pub const fn lowest(self) -> Option<u32> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros())
        }
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Members in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u32> {
        (0..MAX_SIGNALS).filter(move |&sig| self.contains(sig))
    }

    /// Build the kernel representation. Numbers the kernel rejects
    /// (e.g. 0) are skipped.
    pub fn to_sigset(self) -> libc::sigset_t {
        unsafe {
            let mut set: libc::sigset_t = core::mem::zeroed();
            libc::sigemptyset(&mut set);
            for sig in self.iter() {
                libc::sigaddset(&mut set, sig as libc::c_int);
            }
            set
        }
    }
}

impl fmt::Debug for SignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Signal set shared between handler and ordinary context.
///
/// Every update is a compare-and-swap retry loop on one word: no lock, no
/// allocation, safe to call from a signal handler.
pub struct AtomicSignalSet(AtomicU32);

impl AtomicSignalSet {
    pub const fn new() -> Self {
        AtomicSignalSet(AtomicU32::new(0))
    }

    #[inline]
    pub fn load(&self) -> SignalSet {
        SignalSet(self.0.load(Ordering::Acquire))
    }

    /// Add `sig`. Returns the set as it was before.
    pub fn insert(&self, sig: u32) -> SignalSet {
        let mask = sig_bit(sig);
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            match self.0.compare_exchange_weak(
                current,
                current | mask,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(prev) => return SignalSet(prev),
                Err(actual) => current = actual,
            }
        }
    }

    /// Remove `sig`. Returns the set as it was before.
    pub fn remove(&self, sig: u32) -> SignalSet {
        let mask = sig_bit(sig);
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            match self.0.compare_exchange_weak(
                current,
                current & !mask,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(prev) => return SignalSet(prev),
                Err(actual) => current = actual,
            }
        }
    }
}

impl Default for AtomicSignalSet {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AtomicSignalSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.load().fmt(f)
    }
}
