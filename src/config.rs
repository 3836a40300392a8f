//! Runtime configuration.
//!
//! Defaults match what a freshly started engine wants; every knob can be
//! overridden from the environment before `posix_rt::init` runs.

use crate::logger;
use log::LevelFilter;

/// First reservation attempted for the heap region.
pub const DEFAULT_HEAP_MAX: usize = 1024 * 1024 * 1024; // 1 GiB
/// Below this the reservation loop gives up.
pub const DEFAULT_HEAP_MIN: usize = 4096;
/// Live prefix handed to the allocator before the first grow.
pub const DEFAULT_HEAP_INITIAL: usize = 128 * 1024;
/// Delivery queue depth. One slot: the consumer pulls the next number in.
pub const DEFAULT_DELIVERY_CAPACITY: usize = 1;
pub const DEFAULT_TASK_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub heap_max_size: usize,
    pub heap_min_size: usize,
    pub heap_initial_size: usize,
    pub delivery_capacity: usize,
    pub task_capacity: usize,
    pub log_level: LevelFilter,
    /// Install the SIGSEGV/SIGBUS/SIGILL reporter during init
    pub fatal_signals: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            heap_max_size: DEFAULT_HEAP_MAX,
            heap_min_size: DEFAULT_HEAP_MIN,
            heap_initial_size: DEFAULT_HEAP_INITIAL,
            delivery_capacity: DEFAULT_DELIVERY_CAPACITY,
            task_capacity: DEFAULT_TASK_CAPACITY,
            log_level: LevelFilter::Info,
            fatal_signals: true,
        }
    }
}

impl Config {
    /// Defaults overridden by `POSIX_RT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(v) = size_var(&lookup, "POSIX_RT_HEAP_MAX") {
            config.heap_max_size = v;
        }
        if let Some(v) = size_var(&lookup, "POSIX_RT_HEAP_INITIAL") {
            config.heap_initial_size = v;
        }
        if let Some(v) = size_var(&lookup, "POSIX_RT_SIGNAL_QUEUE") {
            config.delivery_capacity = v;
        }
        if let Some(v) = size_var(&lookup, "POSIX_RT_TASKS") {
            config.task_capacity = v;
        }
        if let Some(raw) = lookup("POSIX_RT_LOG") {
            match logger::parse_level(&raw) {
                Some(level) => config.log_level = level,
                None => log::warn!("POSIX_RT_LOG: unknown level {:?}, keeping {}", raw, config.log_level),
            }
        }
        if let Some(raw) = lookup("POSIX_RT_FATAL_SIGNALS") {
            match raw.trim() {
                "1" | "true" | "on" => config.fatal_signals = true,
                "0" | "false" | "off" => config.fatal_signals = false,
                _ => log::warn!("POSIX_RT_FATAL_SIGNALS: expected 0/1, got {:?}", raw),
            }
        }

        config
    }
}

/// Parse a size with an optional `k`/`m`/`g` suffix (powers of 1024).
/// Zero is rejected: every size knob needs at least one unit.
pub fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    let (digits, shift) = match raw.as_bytes().last()? {
        b'k' | b'K' => (&raw[..raw.len() - 1], 10),
        b'm' | b'M' => (&raw[..raw.len() - 1], 20),
        b'g' | b'G' => (&raw[..raw.len() - 1], 30),
        _ => (raw, 0),
    };
    let value: usize = digits.parse().ok()?;
    if value == 0 {
        return None;
    }
    value.checked_mul(1usize << shift)
}

fn size_var<F>(lookup: &F, key: &str) -> Option<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    let parsed = parse_size(&raw);
    if parsed.is_none() {
        log::warn!("{}: ignoring invalid size {:?}", key, raw);
    }
    parsed
}
