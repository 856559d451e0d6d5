use crate::buffer::ByteBuffer;
use crate::decode::{self, Unpacker};
use crate::item::Item;
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio_util::{
    bytes::{Buf, BytesMut},
    codec::{Decoder, FramedRead},
};
use tracing::trace;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] decode::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("End of file")]
    EndOfFile,
}

/// A write-sink over the parser: asynchronous byte chunks go in through
/// [`write`](Self::write), decoded top-level items come out one per
/// [`next`](Self::next).
///
/// A decode error is delivered once and the parser stops advancing; a
/// source that closes mid-item delivers [`Error::EndOfFile`].
pub struct StreamParser {
    unpacker: Unpacker,
    source: ByteBuffer,
    errored: AtomicBool,
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamParser {
    pub fn new() -> Self {
        Self::with_unpacker(Unpacker::new())
    }

    pub fn with_unpacker(unpacker: Unpacker) -> Self {
        Self {
            unpacker,
            source: ByteBuffer::new(),
            errored: AtomicBool::new(false),
        }
    }

    pub fn write(&self, chunk: &[u8]) {
        self.source.push(chunk);
    }

    pub fn close(&self) {
        self.source.close();
    }

    /// The next decoded item, `None` on a clean end of stream or after an
    /// error has been delivered.
    pub async fn next(&self) -> Option<Result<Item, Error>> {
        if self.errored.load(Ordering::Acquire) {
            return None;
        }
        if !self.source.readable().await {
            return None;
        }
        match self.unpacker.unpack_buffer(&self.source).await {
            Ok((item, tag)) => Some(Ok(wrap_unknown_tag(item, tag))),
            Err(e) => {
                self.errored.store(true, Ordering::Release);
                trace!("Stream parser stopped: {e}");
                Some(Err(match e {
                    decode::Error::NotEnoughData => Error::EndOfFile,
                    e => e.into(),
                }))
            }
        }
    }
}

// A top-level unknown tag keeps its number by wrapping, since the stream
// surface has no side slot to report it through.
fn wrap_unknown_tag(item: Item, tag: Option<u64>) -> Item {
    match tag {
        Some(tag) => Item::Tagged(tag, Box::new(item)),
        None => item,
    }
}

/// Frames a byte stream into decoded top-level items.
#[derive(Default)]
pub struct ItemCodec {
    unpacker: Unpacker,
}

impl ItemCodec {
    pub fn new(unpacker: Unpacker) -> Self {
        Self { unpacker }
    }

    pub fn new_framed<T: AsyncRead + Sized>(io: T) -> FramedRead<T, Self> {
        FramedRead::new(io, Self::default())
    }
}

impl Decoder for ItemCodec {
    type Item = Item;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.unpacker.try_unpack(src)? {
            Some((item, tag, consumed)) => {
                src.advance(consumed);
                Ok(Some(wrap_unknown_tag(item, tag)))
            }
            None => Ok(None),
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if src.is_empty() => Ok(None),
            None => Err(Error::EndOfFile),
        }
    }
}

/// Decodes the first item of `io` and ignores the rest of the stream.
pub async fn unpack_first<R>(io: R) -> Result<Item, Error>
where
    R: AsyncRead + Unpin,
{
    match ItemCodec::new_framed(io).next().await {
        Some(Ok(item)) => Ok(item),
        Some(Err(e)) => Err(e),
        None => Err(Error::EndOfFile),
    }
}
