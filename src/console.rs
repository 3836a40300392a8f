//! Raw stderr/stdout output.
//!
//! Everything here bottoms out in a single `write(2)` per chunk and never
//! allocates, so it may be called from signal handler context. The
//! `console_print!` family formats through `core::fmt` into a stack buffer
//! and is meant for ordinary context only.

use core::fmt::{self, Write};

pub const STDOUT: i32 = 1;
pub const STDERR: i32 = 2;

/// Write all of `bytes` to `fd`, retrying on EINTR.
///
/// Errors other than EINTR are dropped: there is nowhere left to report them.
pub fn write_bytes(fd: i32, mut bytes: &[u8]) {
    while !bytes.is_empty() {
        let ret = unsafe { libc::write(fd, bytes.as_ptr() as *const libc::c_void, bytes.len()) };
        if ret < 0 {
            // Reading errno does not allocate, so this stays handler-safe
            if std::io::Error::last_os_error().raw_os_error() == Some(libc::EINTR) {
                continue;
            }
            return;
        }
        bytes = &bytes[ret as usize..];
    }
}

/// Write a single byte to stderr.
pub fn putchar(c: u8) {
    write_bytes(STDERR, &[c]);
}

/// Write a string to stderr.
pub fn print_str(s: &str) {
    write_bytes(STDERR, s.as_bytes());
}

/// Write `value` to stderr as `0x`-prefixed lowercase hex.
pub fn print_hex(value: usize) {
    let mut buf = [0u8; 2 + 2 * core::mem::size_of::<usize>()];
    let len = format_hex(value, &mut buf);
    write_bytes(STDERR, &buf[..len]);
}

/// Write `value` to stderr in decimal.
pub fn print_dec(value: i64) {
    let mut buf = [0u8; 20];
    let len = format_dec(value, &mut buf);
    write_bytes(STDERR, &buf[..len]);
}

fn format_hex(mut value: usize, buf: &mut [u8]) -> usize {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut digits = [0u8; 2 * core::mem::size_of::<usize>()];
    let mut n = 0;
    loop {
        digits[n] = DIGITS[value & 0xf];
        n += 1;
        value >>= 4;
        if value == 0 {
            break;
        }
    }
    buf[0] = b'0';
    buf[1] = b'x';
    for i in 0..n {
        buf[2 + i] = digits[n - 1 - i];
    }
    2 + n
}

fn format_dec(value: i64, buf: &mut [u8; 20]) -> usize {
    // i64::MIN has 19 digits plus the sign
    let mut digits = [0u8; 20];
    let mut n = 0;
    let mut magnitude = value.unsigned_abs();
    loop {
        digits[n] = b'0' + (magnitude % 10) as u8;
        n += 1;
        magnitude /= 10;
        if magnitude == 0 {
            break;
        }
    }
    let mut len = 0;
    if value < 0 {
        buf[0] = b'-';
        len = 1;
    }
    for i in 0..n {
        buf[len + i] = digits[n - 1 - i];
    }
    len + n
}

const LINE_BUFFER: usize = 512;

/// Fixed-size formatter target. Output past the buffer end is truncated.
pub(crate) struct LineBuffer {
    buf: [u8; LINE_BUFFER],
    len: usize,
}

impl LineBuffer {
    pub(crate) const fn new() -> Self {
        LineBuffer {
            buf: [0; LINE_BUFFER],
            len: 0,
        }
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub(crate) fn flush_to(&mut self, fd: i32) {
        write_bytes(fd, self.as_bytes());
        self.len = 0;
    }
}

impl Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let bytes = s.as_bytes();
        let room = LINE_BUFFER - self.len;
        let take = bytes.len().min(room);
        self.buf[self.len..self.len + take].copy_from_slice(&bytes[..take]);
        self.len += take;
        Ok(())
    }
}

#[doc(hidden)]
pub fn _print(fd: i32, args: fmt::Arguments) {
    let mut line = LineBuffer::new();
    let _ = line.write_fmt(args);
    line.flush_to(fd);
}

/// Print to stdout without going through `std::io`.
#[macro_export]
macro_rules! console_print {
    ($($arg:tt)*) => {
        $crate::console::_print($crate::console::STDOUT, format_args!($($arg)*))
    };
}

/// Print to stdout, with a newline.
#[macro_export]
macro_rules! console_println {
    () => ($crate::console_print!("\n"));
    ($fmt:expr) => ($crate::console_print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::console_print!(
        concat!($fmt, "\n"), $($arg)*));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_hex() {
        let mut buf = [0u8; 2 + 2 * core::mem::size_of::<usize>()];
        let len = format_hex(0, &mut buf);
        assert_eq!(&buf[..len], b"0x0");
        let len = format_hex(0xdead_beef, &mut buf);
        assert_eq!(&buf[..len], b"0xdeadbeef");
        let len = format_hex(usize::MAX, &mut buf);
        assert_eq!(len, buf.len());
    }

    #[test]
    fn test_format_dec() {
        let mut buf = [0u8; 20];
        let len = format_dec(0, &mut buf);
        assert_eq!(&buf[..len], b"0");
        let len = format_dec(-42, &mut buf);
        assert_eq!(&buf[..len], b"-42");
        let len = format_dec(i64::MIN, &mut buf);
        assert_eq!(&buf[..len], b"-9223372036854775808");
    }

    #[test]
    fn test_line_buffer_truncates() {
        let mut line = LineBuffer::new();
        for _ in 0..LINE_BUFFER {
            let _ = line.write_str("ab");
        }
        assert_eq!(line.as_bytes().len(), LINE_BUFFER);
    }
}
