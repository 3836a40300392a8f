use crate::console::{self, LineBuffer};
use core::fmt::Write;
use core::sync::atomic::{AtomicU64, Ordering};
use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

/// Logger that writes `[LEVEL] target: message` lines to stderr.
///
/// Lines are formatted into a fixed buffer and emitted with one `write(2)`,
/// so concurrent writers never interleave inside a line. Not usable from
/// signal handler context: formatting arbitrary `Display` impls may allocate.
pub struct StderrLogger {
    line: Mutex<LineBuffer>,
    /// Records emitted while the line buffer was busy
    contended: AtomicU64,
}

impl StderrLogger {
    const fn new() -> Self {
        StderrLogger {
            line: Mutex::new(LineBuffer::new()),
            contended: AtomicU64::new(0),
        }
    }

    /// Number of records that took the unbuffered fallback path.
    pub fn contended(&self) -> u64 {
        self.contended.load(Ordering::Relaxed)
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // try_lock: a record logged while another is mid-format must not spin
        match self.line.try_lock() {
            Some(mut line) => {
                let _ = writeln!(
                    &mut *line,
                    "[{:>5}] {}: {}",
                    record.level(),
                    record.target(),
                    record.args()
                );
                line.flush_to(console::STDERR);
            }
            None => {
                self.contended.fetch_add(1, Ordering::Relaxed);
                let mut line = LineBuffer::new();
                let _ = writeln!(&mut line, "[{:>5}] {}: {}", record.level(), record.target(), record.args());
                line.flush_to(console::STDERR);
            }
        }
    }

    fn flush(&self) {}
}

pub static STDERR_LOGGER: StderrLogger = StderrLogger::new();

/// Install the stderr logger at `level`.
///
/// Returns `false` if some logger (ours or the embedder's) is already
/// installed; the max level is updated either way.
pub fn init(level: LevelFilter) -> bool {
    let installed = log::set_logger(&STDERR_LOGGER).is_ok();
    log::set_max_level(level);
    installed
}

/// Parse a level name as used in `POSIX_RT_LOG`.
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    match name.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}
