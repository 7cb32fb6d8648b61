//! Character-set detection for raw GEDCOM input.
//!
//! GEDCOM files predate UTF-8 ubiquity: 5.5 files may arrive as UTF-16
//! (either endianness, usually with a BOM) or ANSEL. The decoder sniffs
//! the BOM and re-presents the bytes as UTF-8 before line parsing.
//! ANSEL conversion is out of scope; BOM-less input is treated as UTF-8
//! with invalid sequences replaced, which keeps decoding total over
//! arbitrary bytes.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

/// Name of the encoding the input will be decoded with ("UTF-8",
/// "UTF-16LE", "UTF-16BE").
pub fn detected_name(input: &[u8]) -> &'static str {
    sniff(input).name()
}

/// Re-presents `input` as UTF-8, converting from the BOM-detected
/// encoding and stripping the BOM itself.
pub fn to_utf8(input: &[u8]) -> Cow<'_, str> {
    let (text, _, _) = sniff(input).decode(input);
    text
}

fn sniff(input: &[u8]) -> &'static Encoding {
    Encoding::for_bom(input).map(|(enc, _)| enc).unwrap_or(UTF_8)
}
