use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

/// Queue of received-but-unconsumed byte chunks.
///
/// Chunks are kept exactly as the transport delivered them. Reads come
/// off the front: `offset` is the read position inside the first chunk
/// and `len` is the number of unread bytes across all chunks.
///
/// ```text
///   chunks:  [ a a a a a ] [ b b ] [ c c c c ]
///                  ^ offset
///   len = 3 + 2 + 4 = 9
/// ```
///
/// Invariants, whenever the queue is non-empty:
///
///   - `offset < chunks[0].len()`
///   - `len == sum(chunk lengths) - offset`
///
/// A `take` that fits inside the first chunk returns a refcounted slice
/// of it without copying. A `take` spanning chunks copies into a fresh
/// buffer. There is no upper bound on how much the queue holds.
#[derive(Debug, Default)]
pub struct ChunkQueue {
    chunks: VecDeque<Bytes>,
    len: usize,
    offset: usize,
}

impl ChunkQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty chunks are dropped.
    pub fn push(&mut self, chunk: impl Into<Bytes>) {
        let chunk = chunk.into();
        if chunk.is_empty() {
            return;
        }
        self.len += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of chunks still holding unread bytes.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Read position inside the first chunk.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Drop every buffered byte.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.len = 0;
        self.offset = 0;
    }

    /// Remove and return exactly `n` bytes from the front.
    ///
    /// # Panics
    ///
    /// Panics if fewer than `n` bytes are buffered. The tokenizer checks
    /// `len()` before every call, so reaching this is a caller bug.
    pub fn take(&mut self, n: usize) -> Bytes {
        assert!(
            n <= self.len,
            "contract violation: take({n}) with only {} bytes buffered",
            self.len
        );
        if n == 0 {
            return Bytes::new();
        }

        let first_len = self.chunks[0].len();
        if self.offset + n <= first_len {
            let out = self.chunks[0].slice(self.offset..self.offset + n);
            self.advance_front(n, first_len);
            return out;
        }

        let mut out = BytesMut::with_capacity(n);
        while out.len() < n {
            let first_len = self.chunks[0].len();
            let want = n - out.len();
            let end = first_len.min(self.offset + want);
            out.extend_from_slice(&self.chunks[0][self.offset..end]);
            self.advance_front(end - self.offset, first_len);
        }
        out.freeze()
    }

    // Consume `n` bytes of the first chunk, evicting it once exhausted.
    fn advance_front(&mut self, n: usize, first_len: usize) {
        self.offset += n;
        self.len -= n;
        if self.offset == first_len {
            self.chunks.pop_front();
            self.offset = 0;
        }
    }
}
