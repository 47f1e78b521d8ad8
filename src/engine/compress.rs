//! Compression engine (`compressobj`).
//!
//! Wraps a backend [`Deflater`] and adds what the backends leave out: option
//! validation, gzip member framing, the released state after `Z_FINISH`,
//! and copying.
//!
//! Input handed over by [`feed`](CompressionEngine::feed) is compressed at
//! once; the output waits in an internal [`FrameBuffer`] until the next
//! [`compress`](CompressionEngine::compress) or
//! [`flush`](CompressionEngine::flush) returns it.

use crate::backend::{Backend, BackendError, CopySupport, DeflateParams, DeflateStream, Deflater};
use crate::buffer::FrameBuffer;
use crate::config::{DEF_MEM_LEVEL, MAX_MEM_LEVEL, MAX_WBITS};
use crate::engine::ReplayLog;
use crate::error::{CompressionError, ErrorTranslator, Operation, StreamCall};
use crate::gzip::{self, MemberCheck};
use crate::types::{
    Flush, Framing, Level, Strategy, WindowBits, DEFLATED, Z_DEFAULT_COMPRESSION,
    Z_DEFAULT_STRATEGY,
};

/// Arguments of `compressobj`, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressOptions {
    pub level: i32,
    pub method: i32,
    pub wbits: i32,
    pub mem_level: i32,
    pub strategy: i32,
    pub zdict: Option<Vec<u8>>,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            level: Z_DEFAULT_COMPRESSION,
            method: DEFLATED,
            wbits: MAX_WBITS,
            mem_level: DEF_MEM_LEVEL,
            strategy: Z_DEFAULT_STRATEGY,
            zdict: None,
        }
    }
}

impl CompressOptions {
    pub fn level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn wbits(mut self, wbits: i32) -> Self {
        self.wbits = wbits;
        self
    }

    pub fn method(mut self, method: i32) -> Self {
        self.method = method;
        self
    }

    pub fn mem_level(mut self, mem_level: i32) -> Self {
        self.mem_level = mem_level;
        self
    }

    pub fn strategy(mut self, strategy: i32) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn zdict(mut self, zdict: impl Into<Vec<u8>>) -> Self {
        self.zdict = Some(zdict.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplayStep {
    Feed(Vec<u8>),
    Flush(Flush),
}

/// gzip member state on the writing side.
#[derive(Debug, Clone)]
struct GzipWriter {
    level: Level,
    header_written: bool,
    check: MemberCheck,
}

/// A compression stream.
#[derive(Debug)]
pub struct CompressionEngine {
    backend: Backend,
    params: DeflateParams,
    framing: Framing,
    zdict: Option<Vec<u8>>,
    /// `None` once the stream has been finished or torn down.
    handle: Option<Deflater>,
    gzip: Option<GzipWriter>,
    output: FrameBuffer,
    log: ReplayLog<ReplayStep>,
}

impl CompressionEngine {
    /// Create an engine on the default backend.
    pub fn new(options: &CompressOptions) -> Result<Self, CompressionError> {
        Self::with_backend(Backend::default(), options)
    }

    pub fn with_backend(backend: Backend, options: &CompressOptions) -> Result<Self, CompressionError> {
        Self::create(backend, options, StreamCall::DeflateObjInit)
    }

    /// `init` picks the wording of setup failures: the object constructor
    /// reports invalid options, the one-shot path a bad level.
    pub(crate) fn create(
        backend: Backend,
        options: &CompressOptions,
        init: StreamCall,
    ) -> Result<Self, CompressionError> {
        let backend = backend.require()?;
        if options.method != DEFLATED {
            return Err(CompressionError::bad_method(options.method));
        }
        let rejected = || ErrorTranslator::rejected(init);
        let level = Level::new(options.level).ok_or_else(rejected)?;
        let wbits = WindowBits::for_compress(options.wbits).ok_or_else(rejected)?;
        if !(1..=MAX_MEM_LEVEL).contains(&options.mem_level) {
            return Err(rejected());
        }
        let strategy = Strategy::from_code(options.strategy).ok_or_else(rejected)?;

        let params = DeflateParams {
            level: level.effective(),
            window_bits: wbits.log2,
            mem_level: options.mem_level.unsigned_abs(),
            strategy,
            zlib: wbits.framing == Framing::Zlib,
        };
        let handle = Deflater::new(backend, params).map_err(|e| e.translate(init, true).error)?;

        let gzip = (wbits.framing == Framing::Gzip).then(|| GzipWriter {
            level,
            header_written: false,
            check: MemberCheck::new(),
        });
        let zdict = match options.zdict.as_deref() {
            Some(dict) if !dict.is_empty() && gzip.is_some() => {
                tracing::debug!(len = dict.len(), "dictionary ignored for gzip framing");
                None
            }
            Some(dict) if !dict.is_empty() => Some(dict.to_vec()),
            _ => None,
        };

        let mut engine = Self {
            backend,
            params,
            framing: wbits.framing,
            zdict,
            handle: Some(handle),
            gzip,
            output: FrameBuffer::new(),
            log: ReplayLog::new(backend.copy_support() == CopySupport::Replay),
        };
        if let (Some(dict), Some(handle)) = (engine.zdict.as_deref(), engine.handle.as_mut()) {
            handle
                .set_dictionary(dict)
                .map_err(|e| e.translate(StreamCall::DeflateSetDictionary, true).error)?;
            tracing::debug!(len = dict.len(), "compression dictionary installed");
        }
        tracing::debug!(
            %backend,
            framing = %engine.framing,
            level = params.level,
            window_bits = params.window_bits,
            ?strategy,
            "compression engine created"
        );
        Ok(engine)
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// `true` after `Z_FINISH` or a fatal error.
    pub fn is_released(&self) -> bool {
        self.handle.is_none()
    }

    /// Whether [`copy`](Self::copy) can currently succeed.
    pub fn can_copy(&self) -> bool {
        self.handle.is_some()
            && (self.backend.copy_support() == CopySupport::Snapshot || self.log.can_copy())
    }

    /// Compress `data` without flushing. Output is held until the next
    /// [`compress`](Self::compress) or [`flush`](Self::flush).
    pub fn feed(&mut self, data: &[u8]) -> Result<(), CompressionError> {
        self.log.feed(|| ReplayStep::Feed(data.to_vec()));
        self.run(data, Flush::None, StreamCall::Deflate)
    }

    /// Compress `data` and return whatever output is ready.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        self.feed(data)?;
        Ok(self.output.take_all())
    }

    /// Flush under `mode` and return the pending output.
    ///
    /// `Flush::None` returns nothing and touches nothing. `Flush::Finish`
    /// completes the stream (appending the gzip trailer for gzip framing) and
    /// releases the engine; every later call fails.
    pub fn flush(&mut self, mode: Flush) -> Result<Vec<u8>, CompressionError> {
        if mode == Flush::None {
            return Ok(Vec::new());
        }
        if self.handle.is_none() {
            return Err(CompressionError::released(Operation::Flushing));
        }
        if mode == Flush::Trees {
            return Err(ErrorTranslator::rejected(StreamCall::DeflateFlush));
        }
        self.log.push(ReplayStep::Flush(mode));
        self.run(&[], mode, StreamCall::DeflateFlush)?;
        Ok(self.output.take_all())
    }

    /// Shorthand for `flush(Flush::Finish)`.
    pub fn finish(&mut self) -> Result<Vec<u8>, CompressionError> {
        self.flush(Flush::Finish)
    }

    /// An independent engine in the same state.
    ///
    /// # Errors
    /// - `State` ("inconsistent stream state") when this engine is released.
    /// - `CloneUnsupported` when the backend cannot snapshot and more than
    ///   one feed has happened.
    pub fn copy(&self) -> Result<Self, CompressionError> {
        let Some(handle) = self.handle.as_ref() else {
            return Err(CompressionError::inconsistent_state());
        };
        let handle = match handle.snapshot() {
            Some(handle) => {
                tracing::debug!(backend = %self.backend, "compression stream copied by snapshot");
                handle
            }
            None if self.log.can_copy() => self.replay()?,
            None => {
                return Err(CompressionError::CloneUnsupported {
                    backend: self.backend,
                })
            }
        };
        Ok(Self {
            backend: self.backend,
            params: self.params,
            framing: self.framing,
            zdict: self.zdict.clone(),
            handle: Some(handle),
            gzip: self.gzip.clone(),
            output: self.output.clone(),
            log: self.log.clone(),
        })
    }

    fn run(&mut self, input: &[u8], mode: Flush, call: StreamCall) -> Result<(), CompressionError> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(CompressionError::released(call.operation()));
        };
        if let Some(gz) = self.gzip.as_mut() {
            if !gz.header_written {
                self.output.append(&gzip::write_header(gz.level));
                gz.header_written = true;
            }
        }

        let mut out = Vec::new();
        let done = match handle.deflate(input, mode, &mut out) {
            Ok(done) => done,
            Err(err) => return Err(self.fail(&err, call)),
        };
        self.output.append(&out);
        if let Some(gz) = self.gzip.as_mut() {
            gz.check.update(input);
            if done {
                self.output.append(&gz.check.trailer());
            }
        }
        if done {
            self.handle = None;
            tracing::debug!(backend = %self.backend, framing = %self.framing, "compression stream finished");
        }
        Ok(())
    }

    fn fail(&mut self, err: &BackendError, call: StreamCall) -> CompressionError {
        let translated = err.translate(call, false);
        if translated.teardown {
            self.handle = None;
        }
        translated.error
    }

    /// Rebuild the backend stream by replaying the recorded calls.
    fn replay(&self) -> Result<Deflater, CompressionError> {
        let fail = |err: BackendError| err.translate(StreamCall::DeflateCopy, true).error;
        let mut handle = Deflater::new(self.backend, self.params).map_err(fail)?;
        if let Some(dict) = self.zdict.as_deref() {
            handle.set_dictionary(dict).map_err(fail)?;
        }
        let mut sink = Vec::new();
        for step in self.log.steps() {
            let (input, mode) = match step {
                ReplayStep::Feed(data) => (data.as_slice(), Flush::None),
                ReplayStep::Flush(mode) => (&[][..], *mode),
            };
            handle.deflate(input, mode, &mut sink).map_err(fail)?;
            sink.clear();
        }
        tracing::debug!(
            backend = %self.backend,
            steps = self.log.steps().len(),
            "compression stream copied by replay"
        );
        Ok(handle)
    }
}
