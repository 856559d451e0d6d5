use crate::buffer::BufferStream;
use crate::item::Item;
use crate::wire::*;
use bytes::Bytes;
use std::any::{Any, TypeId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Integer out of range")]
    IntegerOutOfRange,

    #[error("Unknown type")]
    UnknownType,
}

/// An encoder for one host-domain type, invoked when [`Packer::pack_any`]
/// meets a value of the type it was registered under.
pub type SemanticEncoder = Box<dyn Fn(&dyn Any, &mut BufferStream) -> Result<(), Error> + Send + Sync>;

/// Serializes [`Item`] trees and registered host-domain values as single
/// top-level data items.
///
/// The built-in variants of [`Item`] dispatch by match; the semantic-type
/// registry is the extension hook for host values handed in as `&dyn Any`.
/// Registrations are consulted linearly in registration order.
pub struct Packer {
    types: Vec<(TypeId, SemanticEncoder)>,
}

impl Default for Packer {
    fn default() -> Self {
        Self::new()
    }
}

impl Packer {
    /// A packer with the default semantic types registered: dates
    /// ([`time::OffsetDateTime`]), byte accumulators ([`BufferStream`]) and
    /// regexes ([`regex::Regex`]).
    pub fn new() -> Self {
        let mut packer = Self { types: Vec::new() };
        packer.add_semantic_type::<time::OffsetDateTime>(Box::new(|value, buf| {
            let Some(timestamp) = value.downcast_ref::<time::OffsetDateTime>() else {
                return Err(Error::UnknownType);
            };
            emit_timestamp(timestamp, buf)
        }));
        packer.add_semantic_type::<BufferStream>(Box::new(|value, buf| {
            let Some(stream) = value.downcast_ref::<BufferStream>() else {
                return Err(Error::UnknownType);
            };
            emit_uint(BYTES, stream.len() as u64, buf)?;
            buf.append(stream.as_slice());
            Ok(())
        }));
        packer.add_semantic_type::<regex::Regex>(Box::new(|value, buf| {
            let Some(regex) = value.downcast_ref::<regex::Regex>() else {
                return Err(Error::UnknownType);
            };
            emit_tagged_text(TAG_REGEX, regex.as_str(), buf)
        }));
        packer
    }

    /// Registers or replaces the encoder for `T`, returning the displaced
    /// encoder if there was one.
    pub fn add_semantic_type<T: Any>(&mut self, encoder: SemanticEncoder) -> Option<SemanticEncoder> {
        let id = TypeId::of::<T>();
        for (registered, slot) in &mut self.types {
            if *registered == id {
                return Some(std::mem::replace(slot, encoder));
            }
        }
        self.types.push((id, encoder));
        None
    }

    pub fn pack(&self, value: &Item) -> Result<Bytes, Error> {
        let mut buf = BufferStream::new();
        self.pack_into(value, &mut buf)?;
        Ok(buf.flatten())
    }

    pub fn pack_into(&self, value: &Item, buf: &mut BufferStream) -> Result<(), Error> {
        match value {
            Item::Unsigned(v) => emit_uint(UNSIGNED, *v, buf),
            Item::Negative(v) => {
                if *v >= 0 {
                    return Err(Error::IntegerOutOfRange);
                }
                // The natural number -1 - v, computed without overflow at i64::MIN
                emit_uint(NEGATIVE, !(*v) as u64, buf)
            }
            Item::Bytes(v) => {
                emit_uint(BYTES, v.len() as u64, buf)?;
                buf.append(v);
                Ok(())
            }
            Item::Text(v) => {
                emit_uint(TEXT, v.len() as u64, buf)?;
                buf.write_str(v);
                Ok(())
            }
            Item::Array(items) => {
                emit_uint(ARRAY, items.len() as u64, buf)?;
                for item in items {
                    self.pack_into(item, buf)?;
                }
                Ok(())
            }
            Item::Map(pairs) => {
                emit_uint(MAP, pairs.len() as u64, buf)?;
                for (key, value) in pairs {
                    self.pack_into(key, buf)?;
                    self.pack_into(value, buf)?;
                }
                Ok(())
            }
            Item::Simple(v) => emit_uint(SIMPLE, v.value() as u64, buf),
            Item::Tagged(tag, inner) => {
                emit_uint(TAG, *tag, buf)?;
                self.pack_into(inner, buf)
            }
            Item::Bool(v) => {
                buf.write_u8((SIMPLE << 5) | if *v { SIMPLE_TRUE } else { SIMPLE_FALSE });
                Ok(())
            }
            Item::Null => {
                buf.write_u8((SIMPLE << 5) | SIMPLE_NULL);
                Ok(())
            }
            Item::Undefined => {
                buf.write_u8((SIMPLE << 5) | SIMPLE_UNDEFINED);
                Ok(())
            }
            Item::Float(v) => emit_number(*v, buf),
            Item::Timestamp(t) => emit_timestamp(t, buf),
            Item::Uri(u) => emit_tagged_text(TAG_URI, u.as_str(), buf),
            Item::Regex(re) => emit_tagged_text(TAG_REGEX, re.as_str(), buf),
        }
    }

    /// Packs a host value through the semantic-type registry. Values no
    /// entry matches and that are not an [`Item`] are declined with
    /// [`Error::UnknownType`] rather than reflected over.
    pub fn pack_any(&self, value: &dyn Any) -> Result<Bytes, Error> {
        let mut buf = BufferStream::new();
        self.pack_any_into(value, &mut buf)?;
        Ok(buf.flatten())
    }

    pub fn pack_any_into(&self, value: &dyn Any, buf: &mut BufferStream) -> Result<(), Error> {
        for (registered, encoder) in &self.types {
            if *registered == value.type_id() {
                return encoder(value, buf);
            }
        }
        if let Some(item) = value.downcast_ref::<Item>() {
            return self.pack_into(item, buf);
        }
        Err(Error::UnknownType)
    }
}

/// Emits an initial byte and operand. Operands through 0x1b are carried
/// inline; wider ones use the 1, 2 or 4 byte big-endian escapes. Operands
/// above `i32::MAX` do not fit the dialect and fail.
fn emit_uint(major: u8, val: u64, buf: &mut BufferStream) -> Result<(), Error> {
    if val <= AI_INLINE_MAX as u64 {
        buf.write_u8((major << 5) | val as u8);
    } else if val <= u8::MAX as u64 {
        buf.write_u8((major << 5) | AI_U8);
        buf.write_u8(val as u8);
    } else if val <= u16::MAX as u64 {
        buf.write_u8((major << 5) | AI_U16);
        buf.write_u16(val as u16);
    } else if val <= i32::MAX as u64 {
        buf.write_u8((major << 5) | AI_U32);
        buf.write_u32(val as u32);
    } else {
        return Err(Error::IntegerOutOfRange);
    }
    Ok(())
}

/// Finite integral numbers take the integer framing, range failure
/// included; everything else is an 8-byte big-endian double.
fn emit_number(value: f64, buf: &mut BufferStream) -> Result<(), Error> {
    if value.is_finite() && value.trunc() == value {
        if value >= 0.0 {
            emit_uint(UNSIGNED, value as u64, buf)
        } else {
            emit_uint(NEGATIVE, (-1.0 - value) as u64, buf)
        }
    } else {
        buf.write_u8((SIMPLE << 5) | SIMPLE_DOUBLE);
        buf.write_f64(value);
        Ok(())
    }
}

fn emit_timestamp(timestamp: &time::OffsetDateTime, buf: &mut BufferStream) -> Result<(), Error> {
    emit_uint(TAG, TAG_DATE, buf)?;
    emit_number(timestamp.unix_timestamp_nanos() as f64 / 1e9, buf)
}

fn emit_tagged_text(tag: u64, text: &str, buf: &mut BufferStream) -> Result<(), Error> {
    emit_uint(TAG, tag, buf)?;
    emit_uint(TEXT, text.len() as u64, buf)?;
    buf.write_str(text);
    Ok(())
}

/// One-shot pack with the default semantic types.
pub fn pack(value: &Item) -> Result<Bytes, Error> {
    Packer::new().pack(value)
}
