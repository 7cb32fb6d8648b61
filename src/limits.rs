//! Security limits for decoding untrusted GEDCOM input.
//!
//! All allocations and recursion-equivalent state in the parser and
//! decoder are bounded by these constants so that adversarial input
//! cannot exhaust memory or stack.

/// Maximum nesting depth (line level) accepted by default.
///
/// The builder's parent stack is indexed by level, so this bounds its
/// size directly.
pub const MAX_NESTING_DEPTH: usize = 100;

/// Maximum tag length allowed by GEDCOM (all dialects).
pub const MAX_TAG_LEN: usize = 31;

/// Maximum logical line length accepted by the scanner (1 MiB).
///
/// Long lines occur in the wild for unwrapped text blocks and URLs.
pub const MAX_LINE_LEN: usize = 1024 * 1024;

/// Initial read-buffer size for the streaming line scanner.
pub const SCAN_BUF_SIZE: usize = 64 * 1024;
