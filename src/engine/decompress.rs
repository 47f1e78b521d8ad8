//! Decompression engine (`decompressobj`).
//!
//! The stream moves through three states:
//!
//! ```text
//! DetectingHeader { buffered } --> Active { decoder, member } --> Finished
//! ```
//!
//! Raw and zlib streams start out `Active`. Gzip streams (and auto-detected
//! ones) buffer input until the member header can be parsed: at least
//! [`GZIP_DETECT_THRESHOLD`] bytes, or whatever is there when the caller
//! forces the issue by flushing. Backends only decode the DEFLATE payload of
//! a gzip member; its trailer is collected and checked here.
//!
//! After the stream ends, leftover input is appended to `unused_data`. Input
//! left over because the output cap was reached is kept in
//! `unconsumed_tail` for the caller to pass back in.

use crate::backend::{Backend, CopySupport, InflateStream, Inflater};
use crate::buffer::FrameBuffer;
use crate::config::{DEF_BUF_SIZE, GZIP_DETECT_THRESHOLD, MAX_LENGTH_SENTINEL};
use crate::deflate::InflateStatus;
use crate::engine::ReplayLog;
use crate::error::{CompressionError, ErrorTranslator, Operation, StreamCall};
use crate::gzip::{self, GzipHeaderParser, MemberCheck, GZIP_MAGIC, GZIP_TRAILER_SIZE};
use crate::types::{Framing, WindowBits};

#[derive(Debug, Clone, PartialEq, Eq)]
struct ReplayCall {
    data: Vec<u8>,
    max: usize,
}

/// gzip member state on the reading side.
#[derive(Debug, Clone, Default)]
struct GzipMember {
    check: MemberCheck,
    trailer: FrameBuffer,
    payload_done: bool,
}

#[derive(Debug)]
enum DecodeState {
    DetectingHeader { buffered: FrameBuffer },
    Active { decoder: Inflater, member: Option<GzipMember> },
    Finished,
}

enum Detected {
    Wait,
    Zlib,
    Gzip { header_len: usize },
}

/// A decompression stream.
#[derive(Debug)]
pub struct DecompressionEngine {
    backend: Backend,
    wbits: WindowBits,
    zdict: Option<Vec<u8>>,
    state: DecodeState,
    released: bool,
    eof: bool,
    unused_data: Vec<u8>,
    unconsumed_tail: Vec<u8>,
    log: ReplayLog<ReplayCall>,
}

impl DecompressionEngine {
    /// Create an engine on the default backend.
    pub fn new(wbits: i32, zdict: Option<&[u8]>) -> Result<Self, CompressionError> {
        Self::with_backend(Backend::default(), wbits, zdict)
    }

    pub fn with_backend(
        backend: Backend,
        wbits: i32,
        zdict: Option<&[u8]>,
    ) -> Result<Self, CompressionError> {
        Self::create(backend, wbits, zdict, StreamCall::InflateObjInit)
    }

    pub(crate) fn create(
        backend: Backend,
        wbits: i32,
        zdict: Option<&[u8]>,
        init: StreamCall,
    ) -> Result<Self, CompressionError> {
        let backend = backend.require()?;
        let wbits = WindowBits::for_decompress(wbits).ok_or_else(|| ErrorTranslator::rejected(init))?;
        let mut engine = Self {
            backend,
            wbits,
            zdict: zdict.filter(|d| !d.is_empty()).map(<[u8]>::to_vec),
            state: DecodeState::DetectingHeader {
                buffered: FrameBuffer::new(),
            },
            released: false,
            eof: false,
            unused_data: Vec::new(),
            unconsumed_tail: Vec::new(),
            log: ReplayLog::new(backend.copy_support() == CopySupport::Replay),
        };

        match wbits.framing {
            Framing::Raw | Framing::Zlib => {
                let zlib = wbits.framing == Framing::Zlib;
                let mut decoder = engine.inflater(zlib, init)?;
                if let (false, Some(dict)) = (zlib, engine.zdict.as_deref()) {
                    decoder
                        .set_dictionary(dict)
                        .map_err(|e| e.translate(StreamCall::InflateSetDictionary, true).error)?;
                    tracing::debug!(len = dict.len(), "raw stream dictionary installed");
                }
                engine.state = DecodeState::Active {
                    decoder,
                    member: None,
                };
            }
            Framing::Gzip | Framing::Auto => {}
        }
        tracing::debug!(%backend, framing = %wbits.framing, window_bits = wbits.log2, "decompression engine created");
        Ok(engine)
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Framing requested at creation (`Auto` stays `Auto` after detection).
    pub fn framing(&self) -> Framing {
        self.wbits.framing
    }

    /// `true` once the end of the compressed stream has been reached.
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// Bytes found after the end of the compressed stream.
    pub fn unused_data(&self) -> &[u8] {
        &self.unused_data
    }

    /// Input not yet consumed because the output cap was reached.
    pub fn unconsumed_tail(&self) -> &[u8] {
        &self.unconsumed_tail
    }

    /// `true` after [`flush`](Self::flush).
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Whether [`copy`](Self::copy) can currently succeed.
    pub fn can_copy(&self) -> bool {
        !self.released
            && (!matches!(self.state, DecodeState::Active { .. })
                || self.backend.copy_support() == CopySupport::Snapshot
                || self.log.can_copy())
    }

    /// Decompress `data`, returning at most `max_length` bytes (`0` means no
    /// limit). Input left over at the cap is kept in
    /// [`unconsumed_tail`](Self::unconsumed_tail).
    pub fn decompress(&mut self, data: &[u8], max_length: i64) -> Result<Vec<u8>, CompressionError> {
        if max_length < 0 {
            return Err(CompressionError::InvalidArgument(
                "max_length must be greater than zero".to_owned(),
            ));
        }
        let max = match max_length {
            0 => MAX_LENGTH_SENTINEL,
            n => usize::try_from(n).unwrap_or(usize::MAX),
        };
        if self.released {
            return Err(CompressionError::released(Operation::Decompressing));
        }
        self.log.feed(|| ReplayCall {
            data: data.to_vec(),
            max,
        });
        self.process(data, max, DEF_BUF_SIZE, false)
    }

    /// Decompress whatever is left in `unconsumed_tail` and release the
    /// engine. `length` is the initial output buffer size.
    ///
    /// Errors from the decoder are not reported: the output decoded so far
    /// is dropped and an empty result returned.
    pub fn flush(&mut self, length: i64) -> Result<Vec<u8>, CompressionError> {
        if length <= 0 {
            return Err(CompressionError::InvalidArgument(
                "length must be greater than zero".to_owned(),
            ));
        }
        if self.released {
            return Ok(Vec::new());
        }
        let tail = std::mem::take(&mut self.unconsumed_tail);
        let hint = usize::try_from(length).unwrap_or(DEF_BUF_SIZE);
        let out = match self.process(&tail, usize::MAX, hint, true) {
            Ok(out) => out,
            Err(err) => {
                tracing::debug!(%err, "decompress flush error ignored");
                Vec::new()
            }
        };
        self.release();
        Ok(out)
    }

    /// An independent engine in the same state.
    pub fn copy(&self) -> Result<Self, CompressionError> {
        if self.released {
            return Err(CompressionError::inconsistent_state());
        }
        let state = match &self.state {
            DecodeState::DetectingHeader { buffered } => DecodeState::DetectingHeader {
                buffered: buffered.clone(),
            },
            DecodeState::Finished => DecodeState::Finished,
            DecodeState::Active { decoder, member } => match decoder.snapshot() {
                Some(decoder) => {
                    tracing::debug!(backend = %self.backend, "decompression stream copied by snapshot");
                    DecodeState::Active {
                        decoder,
                        member: member.clone(),
                    }
                }
                None if self.log.can_copy() => return self.replay(),
                None => {
                    return Err(CompressionError::CloneUnsupported {
                        backend: self.backend,
                    })
                }
            },
        };
        Ok(Self {
            backend: self.backend,
            wbits: self.wbits,
            zdict: self.zdict.clone(),
            state,
            released: false,
            eof: self.eof,
            unused_data: self.unused_data.clone(),
            unconsumed_tail: self.unconsumed_tail.clone(),
            log: self.log.clone(),
        })
    }

    /// One-shot path: decode all of `data` and fail unless the stream ended.
    pub(crate) fn decompress_all(mut self, data: &[u8], bufsize: usize) -> Result<Vec<u8>, CompressionError> {
        let out = self.process(data, usize::MAX, bufsize, true)?;
        if !self.eof {
            return Err(CompressionError::truncated(Operation::Decompressing));
        }
        Ok(out)
    }

    fn process(
        &mut self,
        data: &[u8],
        max: usize,
        hint: usize,
        force: bool,
    ) -> Result<Vec<u8>, CompressionError> {
        let mut out = Vec::with_capacity(hint.clamp(1, DEF_BUF_SIZE).min(max));
        if matches!(self.state, DecodeState::Finished) {
            self.unused_data.extend_from_slice(data);
            self.unconsumed_tail.clear();
            return Ok(out);
        }

        let detected;
        let input = if let DecodeState::DetectingHeader { buffered } = &mut self.state {
            buffered.append(data);
            match self.detect(force)? {
                Some(rest) => {
                    detected = rest;
                    detected.as_slice()
                }
                None => {
                    self.unconsumed_tail.clear();
                    return Ok(out);
                }
            }
        } else {
            data
        };

        let mut consumed = 0;
        let result = self.pump(input, max, &mut out, &mut consumed);
        let rest = &input[consumed..];
        if self.eof {
            self.unused_data.extend_from_slice(rest);
            self.unconsumed_tail.clear();
        } else {
            self.unconsumed_tail = rest.to_vec();
        }
        result.map(|()| out)
    }

    /// Drive the decoder over `input[*offset..]` until it wants more input,
    /// the stream ends, or `out` holds `max` bytes.
    fn pump(
        &mut self,
        input: &[u8],
        max: usize,
        out: &mut Vec<u8>,
        offset: &mut usize,
    ) -> Result<(), CompressionError> {
        let mut dict_installed = false;
        loop {
            let DecodeState::Active { decoder, member } = &mut self.state else {
                return Ok(());
            };

            if let Some(m) = member.as_mut().filter(|m| m.payload_done) {
                let take = (GZIP_TRAILER_SIZE - m.trailer.len()).min(input.len() - *offset);
                m.trailer.append(&input[*offset..*offset + take]);
                *offset += take;
                if m.trailer.len() < GZIP_TRAILER_SIZE {
                    return Ok(());
                }
                m.check
                    .verify(m.trailer.as_slice())
                    .map_err(|detail| CompressionError::format(Operation::Decompressing, detail))?;
                self.finish_stream();
                return Ok(());
            }

            let room = max.saturating_sub(out.len());
            if room == 0 {
                return Ok(());
            }
            let start = out.len();
            let progress = match decoder.inflate(&input[*offset..], out, room) {
                Ok(progress) => progress,
                Err(err) => {
                    let translated = err.translate(StreamCall::Inflate, false);
                    if translated.teardown {
                        self.release();
                    }
                    return Err(translated.error);
                }
            };
            *offset += progress.consumed;
            if let Some(m) = member.as_mut() {
                m.check.update(&out[start..]);
            }

            match progress.status {
                InflateStatus::StreamEnd => match member {
                    Some(m) => m.payload_done = true,
                    None => {
                        self.finish_stream();
                        return Ok(());
                    }
                },
                InflateStatus::NeedDict(id) => {
                    let dict = match self.zdict.as_deref() {
                        Some(dict) if !dict_installed => dict,
                        _ => return Err(CompressionError::missing_dictionary()),
                    };
                    decoder
                        .set_dictionary(dict)
                        .map_err(|e| e.translate(StreamCall::InflateSetDictionary, false).error)?;
                    dict_installed = true;
                    tracing::debug!(dict_id = id, len = dict.len(), "decompression dictionary installed");
                }
                InflateStatus::Ok => return Ok(()),
            }
        }
    }

    /// Resolve a pending header detection. Returns the buffered input that
    /// follows the header once the decoder exists.
    fn detect(&mut self, force: bool) -> Result<Option<Vec<u8>>, CompressionError> {
        let DecodeState::DetectingHeader { buffered } = &self.state else {
            return Ok(None);
        };
        let (zlib, header_len) = match Self::inspect(self.wbits.framing, buffered.as_slice(), force)? {
            Detected::Wait => return Ok(None),
            Detected::Zlib => (true, 0),
            Detected::Gzip { header_len } => (false, header_len),
        };
        let decoder = self.inflater(zlib, StreamCall::InflateObjInit)?;
        let mut buffered = match std::mem::replace(&mut self.state, DecodeState::Finished) {
            DecodeState::DetectingHeader { buffered } => buffered,
            _ => FrameBuffer::new(),
        };
        buffered.consume(header_len);
        tracing::debug!(
            framing = if zlib { "zlib" } else { "gzip" },
            header_len,
            "stream framing detected"
        );
        self.state = DecodeState::Active {
            decoder,
            member: (!zlib).then(GzipMember::default),
        };
        Ok(Some(buffered.take_all()))
    }

    fn inspect(framing: Framing, bytes: &[u8], force: bool) -> Result<Detected, CompressionError> {
        if framing == Framing::Auto {
            match bytes {
                [] if force => return Ok(Detected::Zlib),
                [] => return Ok(Detected::Wait),
                [first, ..] if *first != GZIP_MAGIC[0] => return Ok(Detected::Zlib),
                [_] if !force => return Ok(Detected::Wait),
                _ if !gzip::has_gzip_magic(bytes) => return Ok(Detected::Zlib),
                _ => {}
            }
        }
        if bytes.len() < GZIP_DETECT_THRESHOLD && !force {
            return Ok(Detected::Wait);
        }
        match GzipHeaderParser::parse(bytes) {
            Ok(Some(header)) => Ok(Detected::Gzip {
                header_len: header.len,
            }),
            Ok(None) if force => Err(CompressionError::truncated(Operation::Decompressing)),
            Ok(None) => Ok(Detected::Wait),
            Err(err) => Err(CompressionError::format(Operation::Decompressing, &err.to_string())),
        }
    }

    fn inflater(&self, zlib: bool, call: StreamCall) -> Result<Inflater, CompressionError> {
        Inflater::new(self.backend, zlib, self.wbits.log2).map_err(|e| e.translate(call, true).error)
    }

    fn finish_stream(&mut self) {
        self.state = DecodeState::Finished;
        self.eof = true;
        tracing::debug!(backend = %self.backend, "decompression stream finished");
    }

    fn release(&mut self) {
        self.state = DecodeState::Finished;
        self.released = true;
    }

    /// Rebuild by creating a fresh engine and replaying the recorded calls.
    fn replay(&self) -> Result<Self, CompressionError> {
        let copy_failed = |err: CompressionError| {
            ErrorTranslator::translate(StreamCall::InflateCopy, err.code(), None, true)
                .map_or(err, |t| t.error)
        };
        let mut copy = Self::create(
            self.backend,
            self.wbits.raw,
            self.zdict.as_deref(),
            StreamCall::InflateCopy,
        )?;
        for call in self.log.steps() {
            copy.process(&call.data, call.max, DEF_BUF_SIZE, false)
                .map_err(copy_failed)?;
        }
        copy.eof = self.eof;
        copy.unused_data = self.unused_data.clone();
        copy.unconsumed_tail = self.unconsumed_tail.clone();
        copy.log = self.log.clone();
        tracing::debug!(
            backend = %self.backend,
            calls = self.log.steps().len(),
            "decompression stream copied by replay"
        );
        Ok(copy)
    }
}
