//! Whole-buffer compress and decompress.
//!
//! Both run a throwaway engine over the full input. They differ from the
//! engine constructors only in how setup failures are worded: one-shot
//! compression reports "Bad compression level", one-shot decompression
//! reports the failure "while preparing to decompress data".

use crate::backend::Backend;
use crate::engine::{CompressOptions, CompressionEngine, DecompressionEngine};
use crate::error::{CompressionError, StreamCall};
use crate::types::Flush;

/// Compress `data` in one call with the given level and `wbits`.
pub fn compress(data: &[u8], level: i32, wbits: i32) -> Result<Vec<u8>, CompressionError> {
    compress_with_backend(Backend::default(), data, level, wbits)
}

pub fn compress_with_backend(
    backend: Backend,
    data: &[u8],
    level: i32,
    wbits: i32,
) -> Result<Vec<u8>, CompressionError> {
    let options = CompressOptions::default().level(level).wbits(wbits);
    let mut engine = CompressionEngine::create(backend, &options, StreamCall::DeflateInit)?;
    let mut out = engine.compress(data)?;
    out.extend(engine.flush(Flush::Finish)?);
    Ok(out)
}

/// Decompress a complete stream. `bufsize` is the initial output buffer size;
/// `0` is treated as `1`.
///
/// # Errors
/// Besides decoder errors, a stream that stops before its end is
/// `Error -5 while decompressing data: incomplete or truncated stream`.
pub fn decompress(data: &[u8], wbits: i32, bufsize: i64) -> Result<Vec<u8>, CompressionError> {
    decompress_with_backend(Backend::default(), data, wbits, bufsize)
}

pub fn decompress_with_backend(
    backend: Backend,
    data: &[u8],
    wbits: i32,
    bufsize: i64,
) -> Result<Vec<u8>, CompressionError> {
    let bufsize = match usize::try_from(bufsize) {
        Ok(0) => 1,
        Ok(n) => n,
        Err(_) => {
            return Err(CompressionError::InvalidArgument(
                "bufsize must be non-negative".to_owned(),
            ))
        }
    };
    DecompressionEngine::create(backend, wbits, None, StreamCall::InflateInit)?.decompress_all(data, bufsize)
}
