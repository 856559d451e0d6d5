//! Wire-level constants of the dialect framing.
//!
//! Majors 6 and 7 are swapped relative to RFC 7049: 6 is the simple/float
//! space, 7 is the tag space. Inline operands extend through 0x1b and the
//! width escapes sit at 0x1c..=0x1f.

pub(crate) const UNSIGNED: u8 = 0;
pub(crate) const NEGATIVE: u8 = 1;
pub(crate) const BYTES: u8 = 2;
pub(crate) const TEXT: u8 = 3;
pub(crate) const ARRAY: u8 = 4;
pub(crate) const MAP: u8 = 5;
pub(crate) const SIMPLE: u8 = 6;
pub(crate) const TAG: u8 = 7;

pub(crate) const AI_INLINE_MAX: u8 = 0x1b;
pub(crate) const AI_U8: u8 = 0x1c;
pub(crate) const AI_U16: u8 = 0x1d;
pub(crate) const AI_U32: u8 = 0x1e;
pub(crate) const AI_U64: u8 = 0x1f;

// Selectors in the simple/float space (major 6).
pub(crate) const SIMPLE_FALSE: u8 = 24;
pub(crate) const SIMPLE_TRUE: u8 = 25;
pub(crate) const SIMPLE_NULL: u8 = 26;
pub(crate) const SIMPLE_UNDEFINED: u8 = 27;
pub(crate) const SIMPLE_BYTE: u8 = 28;
pub(crate) const SIMPLE_HALF: u8 = 29;
pub(crate) const SIMPLE_SINGLE: u8 = 30;
pub(crate) const SIMPLE_DOUBLE: u8 = 31;

// Registered semantic tags.
pub(crate) const TAG_DATE: u64 = 11;
pub(crate) const TAG_URI: u64 = 15;
pub(crate) const TAG_REGEX: u64 = 23;
