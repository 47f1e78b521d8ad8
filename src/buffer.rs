//! Growable byte buffer with append/consume semantics.
//!
//! `FrameBuffer` holds input that has been handed to a stream but not yet
//! processed: bytes are appended at the back and consumed from the front.
//! Consumed bytes are reclaimed lazily, when the dead prefix outgrows the live
//! data, so repeated small consumes stay cheap.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Vec<u8>,
    start: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            start: 0,
        }
    }

    /// Number of unconsumed bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unconsumed bytes, oldest first.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.start..]
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.compact();
        self.data.extend_from_slice(bytes);
    }

    /// Drop the first `n` unconsumed bytes. Consuming more than `len()` empties
    /// the buffer.
    pub fn consume(&mut self, n: usize) {
        self.start = (self.start + n).min(self.data.len());
        if self.start == self.data.len() {
            self.clear();
        }
    }

    /// Remove and return the first `n` unconsumed bytes.
    pub fn take_front(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.len());
        let out = self.data[self.start..self.start + n].to_vec();
        self.consume(n);
        out
    }

    /// Remove and return every unconsumed byte.
    pub fn take_all(&mut self) -> Vec<u8> {
        let out = if self.start == 0 {
            std::mem::take(&mut self.data)
        } else {
            self.data[self.start..].to_vec()
        };
        self.clear();
        out
    }

    /// Remove and return the last `n` unconsumed bytes (the tail).
    pub fn split_off_tail(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.len());
        let at = self.data.len() - n;
        let tail = self.data.split_off(at);
        if self.is_empty() {
            self.clear();
        }
        tail
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.start = 0;
    }

    fn compact(&mut self) {
        if self.start > 0 && self.start >= self.len() {
            self.data.drain(..self.start);
            self.start = 0;
        }
    }
}

impl From<Vec<u8>> for FrameBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data, start: 0 }
    }
}

impl From<&[u8]> for FrameBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from(bytes.to_vec())
    }
}
