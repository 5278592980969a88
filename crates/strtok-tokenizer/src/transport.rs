use std::collections::VecDeque;
use std::future::Future;
use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;

use crate::config::TransportConfig;

/// Source of byte chunks for the async driver.
///
/// A transport delivers chunks in order, without duplication, and
/// reports end-of-stream with `Ok(None)`. The driver stops polling once
/// its strategy is done; dropping or reusing the transport afterwards is
/// up to the caller.
pub trait Transport {
    fn next_chunk(&mut self) -> impl Future<Output = io::Result<Option<Bytes>>>;
}

/// Transport over any [`AsyncRead`]: files, sockets, pipes.
///
/// Each read becomes one chunk of at most `read_size` bytes. Consecutive
/// chunks are carved out of one shared block, so a short read does not pin
/// a whole block of its own.
pub struct ReaderTransport<R> {
    reader: R,
    read_size: usize,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> ReaderTransport<R> {
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &TransportConfig::default())
    }

    #[must_use]
    pub fn with_config(reader: R, config: &TransportConfig) -> Self {
        Self {
            reader,
            read_size: config.read_size.max(1),
            buf: BytesMut::new(),
        }
    }

    #[must_use]
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncRead + Unpin> Transport for ReaderTransport<R> {
    async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        // A fresh block only once the previous one is fully handed out
        if self.buf.capacity() == 0 {
            self.buf.reserve(self.read_size);
        }
        let n = self
            .reader
            .read_buf(&mut (&mut self.buf).limit(self.read_size))
            .await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf.split().freeze()))
    }
}

// Channel receivers: the sending side decides the chunk boundaries and
// closing every sender ends the stream.

impl Transport for mpsc::Receiver<Bytes> {
    async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        Ok(self.recv().await)
    }
}

impl Transport for mpsc::UnboundedReceiver<Bytes> {
    async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        Ok(self.recv().await)
    }
}

/// Pre-split chunks, mostly useful in tests.
impl Transport for VecDeque<Bytes> {
    async fn next_chunk(&mut self) -> io::Result<Option<Bytes>> {
        Ok(self.pop_front())
    }
}
