//! Thread-safe sessions.
//!
//! A [`Session`] owns one engine behind a `std::sync::Mutex`, so calls on
//! the same session never interleave. Callers that need several dependent
//! calls to run back to back (copy right after a feed, say) take the guard
//! with [`Session::lock`] and call the engine directly.
//!
//! A panic while the lock is held poisons the session: operations that
//! change the stream fail with a `State` error from then on, while the
//! read-only accessors keep answering from the last state.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::backend::Backend;
use crate::engine::{CompressOptions, CompressionEngine, DecompressionEngine, Decompressor};
use crate::error::CompressionError;
use crate::types::{Flush, Z_STREAM_ERROR};

fn poisoned() -> CompressionError {
    CompressionError::State {
        code: Z_STREAM_ERROR,
        message: "session lock poisoned by a panicked caller".to_owned(),
    }
}

/// An engine guarded by its own mutex.
#[derive(Debug)]
pub struct Session<E> {
    inner: Mutex<E>,
}

pub type CompressSession = Session<CompressionEngine>;
pub type DecompressSession = Session<DecompressionEngine>;
pub type DecompressorSession = Session<Decompressor>;

impl<E> Session<E> {
    pub fn new(engine: E) -> Self {
        Self {
            inner: Mutex::new(engine),
        }
    }

    /// Exclusive access for a sequence of calls.
    pub fn lock(&self) -> Result<MutexGuard<'_, E>, CompressionError> {
        self.inner.lock().map_err(|_| poisoned())
    }

    pub fn into_inner(self) -> Result<E, CompressionError> {
        self.inner.into_inner().map_err(|_| poisoned())
    }

    fn read<T>(&self, f: impl FnOnce(&E) -> T) -> T {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }
}

impl Session<CompressionEngine> {
    pub fn compressor(options: &CompressOptions) -> Result<Self, CompressionError> {
        CompressionEngine::new(options).map(Self::new)
    }

    pub fn compressor_with_backend(backend: Backend, options: &CompressOptions) -> Result<Self, CompressionError> {
        CompressionEngine::with_backend(backend, options).map(Self::new)
    }

    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        self.lock()?.compress(data)
    }

    pub fn flush(&self, mode: Flush) -> Result<Vec<u8>, CompressionError> {
        self.lock()?.flush(mode)
    }

    pub fn copy(&self) -> Result<Self, CompressionError> {
        self.lock()?.copy().map(Self::new)
    }

    pub fn is_released(&self) -> bool {
        self.read(CompressionEngine::is_released)
    }
}

impl Session<DecompressionEngine> {
    pub fn decompressor(wbits: i32, zdict: Option<&[u8]>) -> Result<Self, CompressionError> {
        DecompressionEngine::new(wbits, zdict).map(Self::new)
    }

    pub fn decompressor_with_backend(
        backend: Backend,
        wbits: i32,
        zdict: Option<&[u8]>,
    ) -> Result<Self, CompressionError> {
        DecompressionEngine::with_backend(backend, wbits, zdict).map(Self::new)
    }

    pub fn decompress(&self, data: &[u8], max_length: i64) -> Result<Vec<u8>, CompressionError> {
        self.lock()?.decompress(data, max_length)
    }

    pub fn flush(&self, length: i64) -> Result<Vec<u8>, CompressionError> {
        self.lock()?.flush(length)
    }

    pub fn copy(&self) -> Result<Self, CompressionError> {
        self.lock()?.copy().map(Self::new)
    }

    pub fn eof(&self) -> bool {
        self.read(DecompressionEngine::eof)
    }

    pub fn unused_data(&self) -> Vec<u8> {
        self.read(|e| e.unused_data().to_vec())
    }

    pub fn unconsumed_tail(&self) -> Vec<u8> {
        self.read(|e| e.unconsumed_tail().to_vec())
    }
}

impl Session<Decompressor> {
    pub fn decompress(&self, data: &[u8], max_length: Option<usize>) -> Result<Vec<u8>, CompressionError> {
        self.lock()?.decompress(data, max_length)
    }

    pub fn eof(&self) -> bool {
        self.read(Decompressor::eof)
    }

    pub fn needs_input(&self) -> bool {
        self.read(Decompressor::needs_input)
    }

    pub fn unused_data(&self) -> Vec<u8> {
        self.read(|d| d.unused_data().to_vec())
    }
}
