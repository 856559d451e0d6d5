use bytes::{BufMut, Bytes, BytesMut};
use std::sync::Mutex;
use tokio::sync::Notify;

/// Append-oriented byte accumulator used by the generator.
///
/// All multi-byte writes are big-endian.
#[derive(Debug, Default)]
pub struct BufferStream {
    data: BytesMut,
}

impl BufferStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.put_u8(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.data.put_u16(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.data.put_u32(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.data.put_f64(value);
    }

    /// Appends the UTF-8 bytes of `value` and returns how many were written.
    /// Any length prefix is the caller's framing to emit.
    pub fn write_str(&mut self, value: &str) -> usize {
        self.data.put(value.as_bytes());
        value.len()
    }

    pub fn append(&mut self, data: &[u8]) {
        self.data.put(data);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Returns the accumulated bytes as a single contiguous sequence.
    pub fn flatten(self) -> Bytes {
        self.data.freeze()
    }
}

#[derive(Debug, Default)]
struct Inner {
    data: BytesMut,
    closed: bool,
}

/// An asynchronous byte source.
///
/// Bytes arrive through [`push`](Self::push), possibly piecewise, and are
/// consumed by exact-length [`wait`](Self::wait) reads that suspend until
/// enough bytes are buffered. Reads are served in the order they are
/// awaited and each consumes exactly the requested count from the front of
/// the buffer.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    inner: Mutex<Inner>,
    notify: Notify,
}

impl ByteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pre-loaded source that will never receive further bytes.
    pub fn closed(data: &[u8]) -> Self {
        let buffer = Self::from(data);
        buffer.close();
        buffer
    }

    pub fn push(&self, chunk: &[u8]) {
        self.inner
            .lock()
            .expect("Failed to lock mutex")
            .data
            .put(chunk);
        self.notify.notify_one();
    }

    /// Signals that no more bytes will arrive. Pending and future waits that
    /// cannot be satisfied from the buffered remainder resolve to `None`.
    pub fn close(&self) {
        self.inner.lock().expect("Failed to lock mutex").closed = true;
        self.notify.notify_one();
    }

    pub fn remaining(&self) -> usize {
        self.inner.lock().expect("Failed to lock mutex").data.len()
    }

    /// Takes the next `count` bytes, suspending until they are available.
    /// Returns `None` if the source is closed with fewer bytes left.
    pub async fn wait(&self, count: usize) -> Option<Bytes> {
        loop {
            {
                let mut inner = self.inner.lock().expect("Failed to lock mutex");
                if inner.data.len() >= count {
                    return Some(inner.data.split_to(count).freeze());
                }
                if inner.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Waits until at least one byte is buffered (`true`) or the source is
    /// closed and drained (`false`).
    pub async fn readable(&self) -> bool {
        loop {
            {
                let inner = self.inner.lock().expect("Failed to lock mutex");
                if !inner.data.is_empty() {
                    return true;
                }
                if inner.closed {
                    return false;
                }
            }
            self.notify.notified().await;
        }
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        let buffer = Self::new();
        buffer.push(data);
        buffer
    }
}
