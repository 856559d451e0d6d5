use crate::buffer::ByteBuffer;
use crate::item::{Item, SimpleValue};
use crate::wire::*;
use std::future::Future;
use std::pin::pin;
use std::task::{Context, Poll, Waker};
use thiserror::Error;
use tracing::trace;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not enough data for encoded value")]
    NotEnoughData,

    #[error("Tag must not follow a tag")]
    TagAfterTag,

    #[error("Unsupported date type")]
    UnsupportedDateType,

    #[error("Incorrect type, expecting {0}, found {1}")]
    IncorrectType(String, String),

    #[error(transparent)]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    TryFromIntError(#[from] std::num::TryFromIntError),

    #[error(transparent)]
    InvalidDate(#[from] time::error::Parse),

    #[error(transparent)]
    DateOutOfRange(#[from] time::error::ComponentRange),

    #[error(transparent)]
    InvalidUri(#[from] url::ParseError),

    #[error(transparent)]
    InvalidRegex(#[from] regex::Error),
}

/// A decoder for one semantic tag, applied to the item immediately
/// following the tag on the wire.
pub type TagDecoder = Box<dyn Fn(Item) -> Result<Item, Error> + Send + Sync>;

/// Reconstructs one top-level data item per invocation.
///
/// The engine is [`unpack_buffer`](Self::unpack_buffer): it reads
/// field-by-field from a [`ByteBuffer`], suspending whenever the source has
/// not buffered enough bytes, and keeps an explicit work stack for nested
/// composites so adversarially deep input cannot overflow the control
/// stack. The slice entry points drive the same engine over a pre-loaded
/// source.
pub struct Unpacker {
    tags: Vec<(u64, TagDecoder)>,
}

impl Default for Unpacker {
    fn default() -> Self {
        Self::new()
    }
}

enum Frame {
    Array {
        items: Vec<Item>,
        count: usize,
    },
    Map {
        entries: Vec<(Item, Item)>,
        key: Option<Item>,
        count: usize,
    },
    Tag(u64),
}

impl Unpacker {
    /// An unpacker with the default tag decoders registered: 11 (dates),
    /// 15 (URIs) and 23 (regexes).
    pub fn new() -> Self {
        let mut unpacker = Self { tags: Vec::new() };
        unpacker.add_semantic_tag(TAG_DATE, Box::new(decode_date));
        unpacker.add_semantic_tag(TAG_URI, Box::new(decode_uri));
        unpacker.add_semantic_tag(TAG_REGEX, Box::new(decode_regex));
        unpacker
    }

    /// Registers or replaces the decoder for `tag`, returning the displaced
    /// decoder if there was one.
    pub fn add_semantic_tag(&mut self, tag: u64, decoder: TagDecoder) -> Option<TagDecoder> {
        for (registered, slot) in &mut self.tags {
            if *registered == tag {
                return Some(std::mem::replace(slot, decoder));
            }
        }
        self.tags.push((tag, decoder));
        None
    }

    fn tag_decoder(&self, tag: u64) -> Option<&TagDecoder> {
        self.tags
            .iter()
            .find(|(registered, _)| *registered == tag)
            .map(|(_, decoder)| decoder)
    }

    /// Decodes the next top-level item from `source`, suspending at every
    /// read the source cannot yet satisfy.
    ///
    /// The second slot carries the tag number when the top-level item was a
    /// tag no decoder is registered for; the inner item is delivered in its
    /// place. Unknown tags below the top level become [`Item::Tagged`].
    pub async fn unpack_buffer(&self, source: &ByteBuffer) -> Result<(Item, Option<u64>), Error> {
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            let initial = source.wait(1).await.ok_or(Error::NotEnoughData)?[0];
            let major = initial >> 5;
            let ai = initial & 0x1f;

            // Escapes 0x1c..=0x1f carry a 1, 2, 4 or 8 byte big-endian
            // operand; smaller values are the operand itself.
            let num = match ai {
                AI_U8 => {
                    let b = source.wait(1).await.ok_or(Error::NotEnoughData)?;
                    b[0] as u64
                }
                AI_U16 => {
                    let b = source.wait(2).await.ok_or(Error::NotEnoughData)?;
                    u16::from_be_bytes([b[0], b[1]]) as u64
                }
                AI_U32 => {
                    let b = source.wait(4).await.ok_or(Error::NotEnoughData)?;
                    u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64
                }
                AI_U64 => {
                    let b = source.wait(8).await.ok_or(Error::NotEnoughData)?;
                    u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
                }
                ai => ai as u64,
            };

            let mut item = match major {
                UNSIGNED => Item::Unsigned(num),
                NEGATIVE => Item::Negative(-1 - i64::try_from(num)?),
                BYTES => {
                    let data = source
                        .wait(num.try_into()?)
                        .await
                        .ok_or(Error::NotEnoughData)?;
                    Item::Bytes(data.to_vec())
                }
                TEXT => {
                    let data = source
                        .wait(num.try_into()?)
                        .await
                        .ok_or(Error::NotEnoughData)?;
                    Item::Text(String::from_utf8(data.to_vec())?)
                }
                ARRAY => {
                    if num == 0 {
                        Item::Array(Vec::new())
                    } else {
                        stack.push(Frame::Array {
                            items: Vec::new(),
                            count: num.try_into()?,
                        });
                        continue;
                    }
                }
                MAP => {
                    if num == 0 {
                        Item::Map(Vec::new())
                    } else {
                        stack.push(Frame::Map {
                            entries: Vec::new(),
                            key: None,
                            count: num.try_into()?,
                        });
                        continue;
                    }
                }
                SIMPLE => match ai {
                    SIMPLE_FALSE => Item::Bool(false),
                    SIMPLE_TRUE => Item::Bool(true),
                    SIMPLE_NULL => Item::Null,
                    SIMPLE_UNDEFINED => Item::Undefined,
                    SIMPLE_BYTE => Item::Simple(SimpleValue::from(num as u8)),
                    SIMPLE_HALF => Item::Float(half::f16::from_bits(num as u16).into()),
                    SIMPLE_SINGLE => Item::Float(f32::from_bits(num as u32).into()),
                    SIMPLE_DOUBLE => Item::Float(f64::from_bits(num)),
                    ai => Item::Simple(SimpleValue::from(ai)),
                },
                TAG => {
                    // One level deep only: composites below reset the check
                    if matches!(stack.last(), Some(Frame::Tag(_))) {
                        return Err(Error::TagAfterTag);
                    }
                    stack.push(Frame::Tag(num));
                    continue;
                }
                _ => unreachable!(),
            };

            // Feed the completed item back up the frame stack.
            loop {
                match stack.pop() {
                    None => return Ok((item, None)),
                    Some(Frame::Tag(tag)) => {
                        if let Some(decoder) = self.tag_decoder(tag) {
                            item = decoder(item)?;
                        } else if stack.is_empty() {
                            trace!("Unknown semantic tag {tag}");
                            return Ok((item, Some(tag)));
                        } else {
                            trace!("Unknown semantic tag {tag}");
                            item = Item::Tagged(tag, Box::new(item));
                        }
                    }
                    Some(Frame::Array { mut items, count }) => {
                        items.push(item);
                        if items.len() == count {
                            item = Item::Array(items);
                        } else {
                            stack.push(Frame::Array { items, count });
                            break;
                        }
                    }
                    Some(Frame::Map {
                        mut entries,
                        key,
                        count,
                    }) => match key {
                        None => {
                            stack.push(Frame::Map {
                                entries,
                                key: Some(item),
                                count,
                            });
                            break;
                        }
                        Some(key) => {
                            entries.push((key, item));
                            if entries.len() == count {
                                item = Item::Map(entries);
                            } else {
                                stack.push(Frame::Map {
                                    entries,
                                    key: None,
                                    count,
                                });
                                break;
                            }
                        }
                    },
                }
            }
        }
    }

    /// One-shot decode of a single item from the front of `data`.
    pub fn unpack(&self, data: &[u8]) -> Result<(Item, Option<u64>), Error> {
        self.unpack_from(data, 0)
    }

    /// One-shot decode starting at `offset`.
    pub fn unpack_from(&self, data: &[u8], offset: usize) -> Result<(Item, Option<u64>), Error> {
        let data = data.get(offset..).ok_or(Error::NotEnoughData)?;
        let source = ByteBuffer::closed(data);
        match poll_once(self.unpack_buffer(&source)) {
            Poll::Ready(result) => result,
            // A closed source never suspends
            Poll::Pending => unreachable!(),
        }
    }

    /// Incremental probe: `Ok(None)` means `data` does not yet hold a
    /// complete item. On success the third slot is how many bytes the item
    /// consumed from the front of `data`.
    pub fn try_unpack(&self, data: &[u8]) -> Result<Option<(Item, Option<u64>, usize)>, Error> {
        let source = ByteBuffer::from(data);
        match poll_once(self.unpack_buffer(&source)) {
            Poll::Ready(Ok((item, tag))) => Ok(Some((item, tag, data.len() - source.remaining()))),
            Poll::Ready(Err(e)) => Err(e),
            Poll::Pending => Ok(None),
        }
    }
}

/// Polls a future exactly once with a no-op waker. Over a pre-loaded
/// source the decode engine either completes or was starved for bytes.
fn poll_once<F: Future>(future: F) -> Poll<F::Output> {
    pin!(future).poll(&mut Context::from_waker(Waker::noop()))
}

fn decode_date(inner: Item) -> Result<Item, Error> {
    match inner {
        Item::Text(text) => Ok(Item::Timestamp(time::OffsetDateTime::parse(
            &text,
            &time::format_description::well_known::Rfc3339,
        )?)),
        Item::Unsigned(seconds) => timestamp_from_seconds(seconds as f64),
        Item::Negative(seconds) => timestamp_from_seconds(seconds as f64),
        Item::Float(seconds) => timestamp_from_seconds(seconds),
        _ => Err(Error::UnsupportedDateType),
    }
}

fn timestamp_from_seconds(seconds: f64) -> Result<Item, Error> {
    Ok(Item::Timestamp(
        time::OffsetDateTime::from_unix_timestamp_nanos((seconds * 1e9) as i128)?,
    ))
}

fn decode_uri(inner: Item) -> Result<Item, Error> {
    match inner {
        Item::Text(text) => Ok(Item::Uri(url::Url::parse(&text)?)),
        inner => Err(Error::IncorrectType(
            "Text String".to_string(),
            inner.type_name().to_string(),
        )),
    }
}

fn decode_regex(inner: Item) -> Result<Item, Error> {
    match inner {
        Item::Text(text) => Ok(Item::Regex(regex::Regex::new(&text)?)),
        inner => Err(Error::IncorrectType(
            "Text String".to_string(),
            inner.type_name().to_string(),
        )),
    }
}

/// One-shot unpack with the default tag decoders.
pub fn unpack(data: &[u8]) -> Result<(Item, Option<u64>), Error> {
    Unpacker::new().unpack(data)
}
