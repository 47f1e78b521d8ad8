//! Streaming decompressor (`_ZlibDecompressor`).
//!
//! Unlike [`DecompressionEngine`], the caller never hands input back: bytes
//! left over at the output cap stay in an internal [`FrameBuffer`] and are
//! prepended to the next chunk. [`needs_input`](Decompressor::needs_input)
//! says whether another call without new data could make progress.

use crate::backend::Backend;
use crate::buffer::FrameBuffer;
use crate::engine::DecompressionEngine;
use crate::error::CompressionError;

#[derive(Debug)]
pub struct Decompressor {
    engine: DecompressionEngine,
    leftover: FrameBuffer,
}

impl Decompressor {
    pub fn new(wbits: i32, zdict: Option<&[u8]>) -> Result<Self, CompressionError> {
        Self::with_backend(Backend::default(), wbits, zdict)
    }

    pub fn with_backend(
        backend: Backend,
        wbits: i32,
        zdict: Option<&[u8]>,
    ) -> Result<Self, CompressionError> {
        Ok(Self {
            engine: DecompressionEngine::with_backend(backend, wbits, zdict)?,
            leftover: FrameBuffer::new(),
        })
    }

    /// Decompress `data` after any buffered leftover, returning at most
    /// `max_length` bytes (`None` means no limit).
    ///
    /// `Some(0)` only buffers `data`.
    pub fn decompress(&mut self, data: &[u8], max_length: Option<usize>) -> Result<Vec<u8>, CompressionError> {
        if self.engine.eof() {
            return Err(CompressionError::end_of_stream());
        }
        self.leftover.append(data);
        let max = match max_length {
            None => 0,
            Some(0) => return Ok(Vec::new()),
            Some(n) => i64::try_from(n).unwrap_or(i64::MAX),
        };
        let input = self.leftover.take_all();
        let out = self.engine.decompress(&input, max)?;
        self.leftover.append(self.engine.unconsumed_tail());
        Ok(out)
    }

    pub fn eof(&self) -> bool {
        self.engine.eof()
    }

    /// `true` when nothing is buffered and the stream has not ended.
    pub fn needs_input(&self) -> bool {
        !self.engine.eof() && self.leftover.is_empty()
    }

    pub fn unused_data(&self) -> &[u8] {
        self.engine.unused_data()
    }

    pub fn backend(&self) -> Backend {
        self.engine.backend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CompressOptions, CompressionEngine};

    fn packed(data: &[u8]) -> Vec<u8> {
        let mut c = CompressionEngine::with_backend(Backend::Managed, &CompressOptions::default().level(0)).unwrap();
        let mut out = c.compress(data).unwrap();
        out.extend(c.finish().unwrap());
        out
    }

    fn managed() -> Decompressor {
        Decompressor::with_backend(Backend::Managed, 15, None).unwrap()
    }

    #[test]
    fn leftover_is_carried_between_calls() {
        let data = b"streaming decompressor ".repeat(40);
        let stream = packed(&data);
        let mut d = managed();
        assert!(d.needs_input());

        let mut out = d.decompress(&stream, Some(64)).unwrap();
        assert_eq!(out.len(), 64);
        assert!(!d.needs_input());
        while !d.eof() {
            out.extend(d.decompress(b"", Some(64)).unwrap());
        }
        assert_eq!(out, data);
        assert!(!d.needs_input());
    }

    #[test]
    fn zero_cap_only_buffers() {
        let stream = packed(b"abc");
        let mut d = managed();
        assert!(d.decompress(&stream, Some(0)).unwrap().is_empty());
        assert!(!d.needs_input());
        assert_eq!(d.decompress(b"", None).unwrap(), b"abc");
        assert!(d.eof());
    }

    #[test]
    fn chunked_input_needs_more() {
        let stream = packed(b"split across calls");
        let mut d = managed();
        let mut out = d.decompress(&stream[..5], None).unwrap();
        assert!(d.needs_input());
        out.extend(d.decompress(&stream[5..], None).unwrap());
        assert_eq!(out, b"split across calls");
    }

    #[test]
    fn unused_data_and_end_of_stream() {
        let mut stream = packed(b"done");
        stream.extend_from_slice(b"junk");
        let mut d = managed();
        assert_eq!(d.decompress(&stream, None).unwrap(), b"done");
        assert_eq!(d.unused_data(), b"junk");
        let err = d.decompress(b"more", None).unwrap_err();
        assert!(err.is_state());
        assert_eq!(err.to_string(), "End of stream already reached");
    }
}
