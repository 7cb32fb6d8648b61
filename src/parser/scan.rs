//! Logical-line scanning across LF, CRLF, and CR terminators.
//!
//! GEDCOM files in the wild carry all three line-ending styles, including
//! bare CR from old Macintosh exports. [`scan_line`] implements the split
//! contract over a byte window; [`LineScanner`] drives it over a buffered
//! reader with a hard per-line size cap.

use std::io::Read;

use crate::error::ScanError;
use crate::limits::{MAX_LINE_LEN, SCAN_BUF_SIZE};

/// Scans `data` for the next logical line.
///
/// Returns `Some((advance, token))` where `token` excludes the line
/// terminator and `advance` is the number of bytes consumed including it.
/// Returns `None` when more data is needed: a partial line without a
/// terminator, or a trailing CR that could still be the first half of a
/// CRLF pair. With `at_eof` set, remaining bytes are returned as the
/// final line.
pub fn scan_line(data: &[u8], at_eof: bool) -> Option<(usize, &[u8])> {
    if at_eof && data.is_empty() {
        return None;
    }

    for i in 0..data.len() {
        match data[i] {
            b'\n' => return Some((i + 1, &data[..i])),
            b'\r' => {
                if i + 1 < data.len() {
                    if data[i + 1] == b'\n' {
                        return Some((i + 2, &data[..i]));
                    }
                    return Some((i + 1, &data[..i]));
                }
                // CR at the end of the window: only at EOF can we be sure
                // it is not the first byte of a CRLF pair.
                if at_eof {
                    return Some((i + 1, &data[..i]));
                }
                return None;
            }
            _ => {}
        }
    }

    if at_eof {
        return Some((data.len(), data));
    }

    None
}

/// Buffered reader yielding logical lines via [`scan_line`].
///
/// Lines longer than [`MAX_LINE_LEN`] are rejected with
/// [`ScanError::LineTooLong`]; the scanner is unusable afterwards.
pub struct LineScanner<R> {
    inner: R,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    eof: bool,
    failed: bool,
}

impl<R: Read> LineScanner<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: vec![0; SCAN_BUF_SIZE],
            start: 0,
            end: 0,
            eof: false,
            failed: false,
        }
    }

    /// Returns the next logical line, or `None` at end of input.
    pub fn next_line(&mut self) -> Result<Option<Vec<u8>>, ScanError> {
        if self.failed {
            return Ok(None);
        }

        loop {
            let window = &self.buf[self.start..self.end];
            if let Some((advance, token)) = scan_line(window, self.eof) {
                if token.len() > MAX_LINE_LEN {
                    self.failed = true;
                    return Err(ScanError::LineTooLong {
                        len: token.len(),
                        max: MAX_LINE_LEN,
                    });
                }
                let line = token.to_vec();
                self.start += advance;
                return Ok(Some(line));
            }
            if self.eof {
                return Ok(None);
            }
            self.fill()?;
        }
    }

    /// Reads more bytes, compacting or growing the buffer as needed.
    fn fill(&mut self) -> Result<(), ScanError> {
        if self.start > 0 {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }

        // The buffer may hold one full-length line plus a CRLF pair; a
        // window that large with no terminator is over the limit.
        if self.end == self.buf.len() {
            if self.buf.len() >= MAX_LINE_LEN + 2 {
                self.failed = true;
                return Err(ScanError::LineTooLong {
                    len: self.end,
                    max: MAX_LINE_LEN,
                });
            }
            let new_len = (self.buf.len() * 2).min(MAX_LINE_LEN + 2);
            self.buf.resize(new_len, 0);
        }

        match self.inner.read(&mut self.buf[self.end..]) {
            Ok(0) => {
                self.eof = true;
                Ok(())
            }
            Ok(n) => {
                self.end += n;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(()),
            Err(e) => {
                self.failed = true;
                Err(ScanError::Io(e))
            }
        }
    }
}
