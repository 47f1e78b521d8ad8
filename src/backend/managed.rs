//! Managed backend: the in-crate DEFLATE codec.

use super::{BackendError, DeflateParams, DeflateStream, InflateStream};
use crate::deflate::{
    DeflateError, DeflateStatus, Deflater, DictionaryRejected, InflateProgress, Inflater,
};
use crate::types::{Flush, Z_DATA_ERROR, Z_STREAM_ERROR};

impl From<DeflateError> for BackendError {
    fn from(err: DeflateError) -> Self {
        tracing::trace!(%err, "managed deflate refused call");
        BackendError::stream()
    }
}

impl From<DictionaryRejected> for BackendError {
    fn from(err: DictionaryRejected) -> Self {
        match err {
            DictionaryRejected::WrongState => BackendError::new(Z_STREAM_ERROR, None),
            DictionaryRejected::Mismatch => BackendError::new(Z_DATA_ERROR, None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManagedDeflater {
    inner: Deflater,
}

impl ManagedDeflater {
    pub fn new(params: DeflateParams) -> Self {
        Self {
            inner: Deflater::new(
                params.level,
                params.window_bits,
                params.mem_level,
                params.strategy,
                params.zlib,
            ),
        }
    }
}

impl DeflateStream for ManagedDeflater {
    fn deflate(&mut self, input: &[u8], flush: Flush, out: &mut Vec<u8>) -> Result<bool, BackendError> {
        let status = self.inner.deflate(input, flush, out)?;
        Ok(status == DeflateStatus::StreamEnd)
    }

    fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), BackendError> {
        self.inner.set_dictionary(dict)?;
        Ok(())
    }

    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}

#[derive(Debug, Clone)]
pub struct ManagedInflater {
    inner: Inflater,
}

impl ManagedInflater {
    pub fn new(zlib: bool, window_bits: u8) -> Self {
        Self {
            inner: Inflater::new(zlib, window_bits),
        }
    }
}

impl InflateStream for ManagedInflater {
    fn inflate(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
        limit: usize,
    ) -> Result<InflateProgress, BackendError> {
        self.inner
            .inflate(input, out, limit)
            .map_err(|err| BackendError::data(err.0))
    }

    fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), BackendError> {
        self.inner.set_dictionary(dict)?;
        Ok(())
    }

    fn snapshot(&self) -> Option<Self> {
        Some(self.clone())
    }
}
