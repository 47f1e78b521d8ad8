//! DEFLATE backends and their dispatch.
//!
//! | Backend   | Implementation                             | Copy        |
//! |-----------|--------------------------------------------|-------------|
//! | `Native`  | `flate2` over zlib-rs (feature `native`)   | replay log  |
//! | `Managed` | the in-crate codec in [`crate::deflate`]   | snapshot    |
//!
//! Backends only ever see raw or zlib-wrapped DEFLATE; gzip framing lives in
//! the engines. Each backend implements [`DeflateStream`] / [`InflateStream`]
//! and the [`Deflater`] / [`Inflater`] enums dispatch to them by matching on
//! the variant. Failures come back as [`BackendError`]: a zlib status code
//! plus the library's message, ready for [`ErrorTranslator`].

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

use crate::deflate::InflateProgress;
use crate::error::{CompressionError, ErrorTranslator, StreamCall, Translated};
use crate::types::{Flush, Strategy, Z_DATA_ERROR, Z_STREAM_ERROR};

pub mod managed;
#[cfg(feature = "native")]
pub mod native;

// ─────────────────────────────────────────────────────────────────────────────
// Backend selection
// ─────────────────────────────────────────────────────────────────────────────

/// Which DEFLATE implementation a session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Native,
    Managed,
}

/// How a backend duplicates a live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopySupport {
    /// The codec state is cloned directly.
    Snapshot,
    /// The state cannot be read out; a fresh stream re-runs the recorded
    /// calls. Only possible while the recording is complete.
    Replay,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Native, Backend::Managed];

    pub const fn name(self) -> &'static str {
        match self {
            Backend::Native => "native",
            Backend::Managed => "managed",
        }
    }

    /// Whether this backend was compiled in.
    pub const fn is_available(self) -> bool {
        match self {
            Backend::Native => cfg!(feature = "native"),
            Backend::Managed => true,
        }
    }

    pub const fn copy_support(self) -> CopySupport {
        match self {
            Backend::Native => CopySupport::Replay,
            Backend::Managed => CopySupport::Snapshot,
        }
    }

    /// `self` if compiled in, otherwise an `InvalidArgument` error.
    pub fn require(self) -> Result<Self, CompressionError> {
        if self.is_available() {
            Ok(self)
        } else {
            Err(CompressionError::InvalidArgument(format!(
                "{self} backend is not available in this build"
            )))
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        crate::config::default_backend()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown backend {0:?} (expected \"native\" or \"managed\")")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "zlib" => Ok(Backend::Native),
            "managed" | "rust" => Ok(Backend::Managed),
            _ => Err(UnknownBackend(s.to_owned())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// A failed backend call, in zlib terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub status: i32,
    /// The library's own message (`strm->msg`), if it set one.
    pub message: Option<String>,
}

impl BackendError {
    pub fn new(status: i32, message: Option<&str>) -> Self {
        Self {
            status,
            message: message.map(str::to_owned),
        }
    }

    pub fn stream() -> Self {
        Self::new(Z_STREAM_ERROR, None)
    }

    pub fn data(message: &str) -> Self {
        Self::new(Z_DATA_ERROR, Some(message))
    }

    /// Run the status through [`ErrorTranslator`] for `call`.
    pub fn translate(&self, call: StreamCall, deallocate: bool) -> Translated {
        ErrorTranslator::translate(call, self.status, self.message.as_deref(), deallocate)
            .unwrap_or_else(|| Translated {
                error: CompressionError::inconsistent_state(),
                teardown: deallocate,
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Capability interface
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for a compressing stream. `zlib` selects the RFC 1950 wrapper;
/// otherwise the stream is raw DEFLATE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeflateParams {
    /// 0..=9.
    pub level: u32,
    /// 9..=15.
    pub window_bits: u8,
    /// 1..=9.
    pub mem_level: u32,
    pub strategy: Strategy,
    pub zlib: bool,
}

/// Operations every compressing backend provides.
pub trait DeflateStream: Sized {
    /// Compress all of `input` under `flush`, appending to `out`. Returns
    /// `true` once the stream end has been written.
    fn deflate(&mut self, input: &[u8], flush: Flush, out: &mut Vec<u8>) -> Result<bool, BackendError>;

    fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), BackendError>;

    /// Independent copy of the live state, if the backend can make one.
    fn snapshot(&self) -> Option<Self>;
}

/// Operations every decompressing backend provides.
pub trait InflateStream: Sized {
    /// Decode from `input`, appending at most `limit` bytes to `out`.
    fn inflate(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
        limit: usize,
    ) -> Result<InflateProgress, BackendError>;

    fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), BackendError>;

    fn snapshot(&self) -> Option<Self>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// A compressing stream on one of the backends.
#[derive(Debug)]
pub enum Deflater {
    #[cfg(feature = "native")]
    Native(native::NativeDeflater),
    Managed(managed::ManagedDeflater),
}

impl Deflater {
    pub fn new(backend: Backend, params: DeflateParams) -> Result<Self, BackendError> {
        match backend {
            #[cfg(feature = "native")]
            Backend::Native => Ok(Deflater::Native(native::NativeDeflater::new(params))),
            #[cfg(not(feature = "native"))]
            Backend::Native => Err(BackendError::stream()),
            Backend::Managed => Ok(Deflater::Managed(managed::ManagedDeflater::new(params))),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            #[cfg(feature = "native")]
            Deflater::Native(_) => Backend::Native,
            Deflater::Managed(_) => Backend::Managed,
        }
    }
}

impl DeflateStream for Deflater {
    fn deflate(&mut self, input: &[u8], flush: Flush, out: &mut Vec<u8>) -> Result<bool, BackendError> {
        match self {
            #[cfg(feature = "native")]
            Deflater::Native(d) => d.deflate(input, flush, out),
            Deflater::Managed(d) => d.deflate(input, flush, out),
        }
    }

    fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), BackendError> {
        match self {
            #[cfg(feature = "native")]
            Deflater::Native(d) => d.set_dictionary(dict),
            Deflater::Managed(d) => d.set_dictionary(dict),
        }
    }

    fn snapshot(&self) -> Option<Self> {
        match self {
            #[cfg(feature = "native")]
            Deflater::Native(d) => d.snapshot().map(Deflater::Native),
            Deflater::Managed(d) => d.snapshot().map(Deflater::Managed),
        }
    }
}

/// A decompressing stream on one of the backends.
#[derive(Debug)]
pub enum Inflater {
    #[cfg(feature = "native")]
    Native(native::NativeInflater),
    Managed(managed::ManagedInflater),
}

impl Inflater {
    /// `zlib` selects the RFC 1950 wrapper; `window_bits` is 9..=15.
    pub fn new(backend: Backend, zlib: bool, window_bits: u8) -> Result<Self, BackendError> {
        match backend {
            #[cfg(feature = "native")]
            Backend::Native => Ok(Inflater::Native(native::NativeInflater::new(zlib, window_bits))),
            #[cfg(not(feature = "native"))]
            Backend::Native => Err(BackendError::stream()),
            Backend::Managed => Ok(Inflater::Managed(managed::ManagedInflater::new(zlib, window_bits))),
        }
    }

    pub fn backend(&self) -> Backend {
        match self {
            #[cfg(feature = "native")]
            Inflater::Native(_) => Backend::Native,
            Inflater::Managed(_) => Backend::Managed,
        }
    }
}

impl InflateStream for Inflater {
    fn inflate(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
        limit: usize,
    ) -> Result<InflateProgress, BackendError> {
        match self {
            #[cfg(feature = "native")]
            Inflater::Native(i) => i.inflate(input, out, limit),
            Inflater::Managed(i) => i.inflate(input, out, limit),
        }
    }

    fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), BackendError> {
        match self {
            #[cfg(feature = "native")]
            Inflater::Native(i) => i.set_dictionary(dict),
            Inflater::Managed(i) => i.set_dictionary(dict),
        }
    }

    fn snapshot(&self) -> Option<Self> {
        match self {
            #[cfg(feature = "native")]
            Inflater::Native(i) => i.snapshot().map(Inflater::Native),
            Inflater::Managed(i) => i.snapshot().map(Inflater::Managed),
        }
    }
}
