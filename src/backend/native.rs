//! Native backend: `flate2` driving zlib-rs through the zlib API.
//!
//! flate2 exposes no `deflateCopy`/`inflateCopy`, so `snapshot` always
//! declines and the engines fall back to replaying their call log. It has no
//! `Z_BLOCK` either; that flush maps to a sync flush. Compression strategy and
//! memLevel are not reachable through flate2 and are ignored here.

use flate2::{
    Compress, CompressError, Compression, Decompress, DecompressError, FlushCompress,
    FlushDecompress, Status,
};

use super::{BackendError, DeflateParams, DeflateStream, InflateStream};
use crate::config::DEF_BUF_SIZE;
use crate::deflate::{InflateProgress, InflateStatus};
use crate::types::{Flush, Strategy, Z_DATA_ERROR, Z_STREAM_ERROR};

fn compress_error(err: &CompressError) -> BackendError {
    BackendError::new(Z_STREAM_ERROR, err.message())
}

fn decompress_error(err: &DecompressError) -> BackendError {
    BackendError::new(Z_DATA_ERROR, err.message())
}

fn delta(after: u64, before: u64) -> usize {
    usize::try_from(after.saturating_sub(before)).unwrap_or(usize::MAX)
}

pub struct NativeDeflater {
    inner: Compress,
}

impl core::fmt::Debug for NativeDeflater {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NativeDeflater")
            .field("total_in", &self.inner.total_in())
            .field("total_out", &self.inner.total_out())
            .finish()
    }
}

impl NativeDeflater {
    pub fn new(params: DeflateParams) -> Self {
        if params.strategy != Strategy::Default {
            tracing::debug!(strategy = ?params.strategy, "native backend ignores strategy");
        }
        Self {
            inner: Compress::new_with_window_bits(
                Compression::new(params.level),
                params.zlib,
                params.window_bits,
            ),
        }
    }
}

impl DeflateStream for NativeDeflater {
    fn deflate(&mut self, input: &[u8], flush: Flush, out: &mut Vec<u8>) -> Result<bool, BackendError> {
        let mode = match flush {
            Flush::None => FlushCompress::None,
            Flush::Partial => FlushCompress::Partial,
            Flush::Sync | Flush::Block => FlushCompress::Sync,
            Flush::Full => FlushCompress::Full,
            Flush::Finish => FlushCompress::Finish,
            Flush::Trees => return Err(BackendError::stream()),
        };

        let mut offset = 0usize;
        let mut chunk = vec![0u8; DEF_BUF_SIZE];
        loop {
            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();
            let status = self
                .inner
                .compress(&input[offset..], &mut chunk, mode)
                .map_err(|e| compress_error(&e))?;
            let consumed = delta(self.inner.total_in(), before_in);
            let produced = delta(self.inner.total_out(), before_out);
            offset += consumed;
            out.extend_from_slice(&chunk[..produced]);

            if matches!(status, Status::StreamEnd) {
                return Ok(true);
            }
            if consumed == 0 && produced == 0 {
                return Ok(false);
            }
            if offset >= input.len() && produced < chunk.len() && flush != Flush::Finish {
                return Ok(false);
            }
        }
    }

    fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), BackendError> {
        self.inner
            .set_dictionary(dict)
            .map(|_| ())
            .map_err(|e| compress_error(&e))
    }

    fn snapshot(&self) -> Option<Self> {
        None
    }
}

pub struct NativeInflater {
    inner: Decompress,
}

impl core::fmt::Debug for NativeInflater {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NativeInflater")
            .field("total_in", &self.inner.total_in())
            .field("total_out", &self.inner.total_out())
            .finish()
    }
}

impl NativeInflater {
    pub fn new(zlib: bool, window_bits: u8) -> Self {
        Self {
            inner: Decompress::new_with_window_bits(zlib, window_bits),
        }
    }
}

impl InflateStream for NativeInflater {
    fn inflate(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
        limit: usize,
    ) -> Result<InflateProgress, BackendError> {
        let start = out.len();
        let mut offset = 0usize;
        let mut status = InflateStatus::Ok;
        loop {
            let room = limit.saturating_sub(out.len() - start).min(DEF_BUF_SIZE);
            if room == 0 {
                break;
            }
            let at = out.len();
            out.resize(at + room, 0);
            let before_in = self.inner.total_in();
            let before_out = self.inner.total_out();
            let result = self
                .inner
                .decompress(&input[offset..], &mut out[at..], FlushDecompress::None);
            let consumed = delta(self.inner.total_in(), before_in);
            let produced = delta(self.inner.total_out(), before_out);
            out.truncate(at + produced);
            offset += consumed;

            match result {
                Ok(Status::StreamEnd) => {
                    status = InflateStatus::StreamEnd;
                    break;
                }
                Ok(_) => {}
                Err(err) => match err.needs_dictionary() {
                    Some(id) => {
                        status = InflateStatus::NeedDict(id);
                        break;
                    }
                    None => return Err(decompress_error(&err)),
                },
            }
            if consumed == 0 && produced == 0 {
                break;
            }
            if offset >= input.len() && produced < room {
                break;
            }
        }
        Ok(InflateProgress {
            consumed: offset,
            produced: out.len() - start,
            status,
        })
    }

    fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), BackendError> {
        self.inner
            .set_dictionary(dict)
            .map(|_| ())
            .map_err(|e| decompress_error(&e))
    }

    fn snapshot(&self) -> Option<Self> {
        None
    }
}
