//! Typed errors and the status-code translator.
//!
//! Every failure of an engine, a session or a one-shot call is a
//! [`CompressionError`]. Numeric zlib status codes are turned into errors in
//! exactly one place, [`ErrorTranslator`], which also decides whether the
//! stream handle that produced the code has to be torn down.
//!
//! Message formats follow zlibmodule.c:
//! - `Error <code> <operation>: <detail>` when a detail is known,
//! - `Error <code> <operation>` otherwise,
//! - fixed sentences for allocation and initialization failures.

use core::fmt;

use thiserror::Error;

use crate::backend::Backend;
use crate::types::{
    Z_BUF_ERROR, Z_DATA_ERROR, Z_MEM_ERROR, Z_NEED_DICT, Z_OK, Z_STREAM_END, Z_STREAM_ERROR,
    Z_VERSION_ERROR,
};

// ─────────────────────────────────────────────────────────────────────────────
// Canned messages
// ─────────────────────────────────────────────────────────────────────────────

pub const INCOMPLETE_OR_TRUNCATED_STREAM: &str = "incomplete or truncated stream";
pub const INCONSISTENT_STREAM_STATE: &str = "inconsistent stream state";
pub const INVALID_INPUT_DATA: &str = "invalid input data";
pub const LIBRARY_VERSION_MISMATCH: &str = "library version mismatch";
pub const INVALID_INITIALIZATION_OPTION: &str = "Invalid initialization option";
pub const BAD_COMPRESSION_LEVEL: &str = "Bad compression level";
pub const INVALID_DICTIONARY: &str = "Invalid dictionary";
pub const DEFLATE_SET_DICTIONARY: &str = "deflateSetDictionary()";

// ─────────────────────────────────────────────────────────────────────────────
// CompressionError
// ─────────────────────────────────────────────────────────────────────────────

/// Error raised by any compression or decompression operation.
///
/// `Display` renders the zlib-compatible message; [`code`](Self::code) gives
/// the status code the message was built from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompressionError {
    /// Invalid windowBits, method, level, strategy or memLevel.
    #[error("{message}")]
    Configuration { code: i32, message: String },
    /// Malformed gzip header, corrupt or truncated DEFLATE stream.
    #[error("{message}")]
    Format { code: i32, message: String },
    /// A required dictionary is missing or was rejected.
    #[error("{message}")]
    Dictionary { code: i32, message: String },
    /// Operation on a released session or inconsistent stream state.
    #[error("{message}")]
    State { code: i32, message: String },
    /// The backend ran out of memory.
    #[error("{message}")]
    Resource { code: i32, message: String },
    /// The backend library does not match the expected version.
    #[error("{message}")]
    VersionMismatch { code: i32, message: String },
    /// The backend cannot duplicate this session.
    #[error("{backend} zlib backend doesn't support copying this stream")]
    CloneUnsupported { backend: Backend },
    /// A caller-supplied argument is out of range.
    #[error("{0}")]
    InvalidArgument(String),
}

impl CompressionError {
    /// zlib status code carried by the error (`Z_STREAM_ERROR` for errors
    /// raised before any stream call).
    pub fn code(&self) -> i32 {
        match self {
            CompressionError::Configuration { code, .. }
            | CompressionError::Format { code, .. }
            | CompressionError::Dictionary { code, .. }
            | CompressionError::State { code, .. }
            | CompressionError::Resource { code, .. }
            | CompressionError::VersionMismatch { code, .. } => *code,
            CompressionError::CloneUnsupported { .. } | CompressionError::InvalidArgument(_) => {
                Z_STREAM_ERROR
            }
        }
    }

    /// Stable kind name, independent of the message text.
    pub fn error_name(&self) -> &'static str {
        match self {
            CompressionError::Configuration { .. } => "ConfigurationError",
            CompressionError::Format { .. } => "FormatError",
            CompressionError::Dictionary { .. } => "DictionaryError",
            CompressionError::State { .. } => "StateError",
            CompressionError::Resource { .. } => "ResourceError",
            CompressionError::VersionMismatch { .. } => "VersionMismatchError",
            CompressionError::CloneUnsupported { .. } => "CloneUnsupported",
            CompressionError::InvalidArgument(_) => "InvalidArgument",
        }
    }

    pub fn invalid_option() -> Self {
        CompressionError::Configuration {
            code: Z_STREAM_ERROR,
            message: INVALID_INITIALIZATION_OPTION.to_owned(),
        }
    }

    pub fn bad_method(method: i32) -> Self {
        CompressionError::Configuration {
            code: Z_STREAM_ERROR,
            message: format!(
                "only DEFLATED ({}) allowed as method, got {method}",
                crate::types::DEFLATED
            ),
        }
    }

    pub fn bad_level() -> Self {
        CompressionError::Configuration {
            code: Z_STREAM_ERROR,
            message: BAD_COMPRESSION_LEVEL.to_owned(),
        }
    }

    /// Bare "inconsistent stream state", raised for copy of a released object.
    pub fn inconsistent_state() -> Self {
        CompressionError::State {
            code: Z_STREAM_ERROR,
            message: INCONSISTENT_STREAM_STATE.to_owned(),
        }
    }

    /// `Error -2 <operation>: inconsistent stream state`, raised for stream
    /// calls on a released or uninitialized session.
    pub fn released(op: Operation) -> Self {
        CompressionError::State {
            code: Z_STREAM_ERROR,
            message: format_status(Z_STREAM_ERROR, op, Some(INCONSISTENT_STREAM_STATE)),
        }
    }

    /// A format error raised outside the decoder (gzip header or trailer).
    pub fn format(op: Operation, detail: &str) -> Self {
        CompressionError::Format {
            code: Z_DATA_ERROR,
            message: format_status(Z_DATA_ERROR, op, Some(detail)),
        }
    }

    /// `Error -5 <operation>: incomplete or truncated stream`.
    pub fn truncated(op: Operation) -> Self {
        CompressionError::Format {
            code: Z_BUF_ERROR,
            message: format_status(Z_BUF_ERROR, op, Some(INCOMPLETE_OR_TRUNCATED_STREAM)),
        }
    }

    /// Dictionary needed but none was supplied.
    pub fn missing_dictionary() -> Self {
        CompressionError::Dictionary {
            code: Z_NEED_DICT,
            message: format_status(Z_NEED_DICT, Operation::SettingDictionary, None),
        }
    }

    /// Streaming decompressor fed after its stream ended.
    pub fn end_of_stream() -> Self {
        CompressionError::State {
            code: Z_STREAM_END,
            message: "End of stream already reached".to_owned(),
        }
    }

    pub fn is_state(&self) -> bool {
        matches!(self, CompressionError::State { .. })
    }
}

impl From<CompressionError> for std::io::Error {
    fn from(err: CompressionError) -> Self {
        let kind = match err {
            CompressionError::Format { .. } | CompressionError::Dictionary { .. } => {
                std::io::ErrorKind::InvalidData
            }
            CompressionError::Resource { .. } => std::io::ErrorKind::OutOfMemory,
            CompressionError::Configuration { .. } | CompressionError::InvalidArgument(_) => {
                std::io::ErrorKind::InvalidInput
            }
            CompressionError::State { .. }
            | CompressionError::VersionMismatch { .. }
            | CompressionError::CloneUnsupported { .. } => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Operation phrases
// ─────────────────────────────────────────────────────────────────────────────

/// What the stream was doing when a status code was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Compressing,
    Decompressing,
    CreatingCompressor,
    CreatingDecompressor,
    CopyingCompressor,
    /// zlibmodule.c reuses the compression wording here ("while copying
    /// compression object"); this crate names the decompression object.
    CopyingDecompressor,
    FinishingCompression,
    FinishingDecompression,
    Flushing,
    PreparingDecompress,
    SettingDictionary,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Compressing => "while compressing data",
            Operation::Decompressing => "while decompressing data",
            Operation::CreatingCompressor => "while creating compression object",
            Operation::CreatingDecompressor => "while creating decompression object",
            Operation::CopyingCompressor => "while copying compression object",
            Operation::CopyingDecompressor => "while copying decompression object",
            Operation::FinishingCompression => "while finishing compression",
            Operation::FinishingDecompression => "while finishing decompression",
            Operation::Flushing => "while flushing",
            Operation::PreparingDecompress => "while preparing to decompress data",
            Operation::SettingDictionary => "while setting zdict",
        })
    }
}

fn format_status(code: i32, op: Operation, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("Error {code} {op}: {detail}"),
        None => format!("Error {code} {op}"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ErrorTranslator
// ─────────────────────────────────────────────────────────────────────────────

/// The stream call whose status code is being translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamCall {
    /// deflateInit inside a one-shot compress.
    DeflateInit,
    /// deflateInit2 for a compression object.
    DeflateObjInit,
    DeflateCopy,
    DeflateSetDictionary,
    Deflate,
    DeflateFlush,
    DeflateEnd,
    /// inflateInit inside a one-shot decompress.
    InflateInit,
    /// inflateInit2 for a decompression object.
    InflateObjInit,
    InflateCopy,
    InflateSetDictionary,
    Inflate,
    InflateFlush,
    InflateEnd,
}

impl StreamCall {
    /// Operation phrase used in generic `Error <code> ...` messages.
    pub fn operation(self) -> Operation {
        match self {
            StreamCall::DeflateInit | StreamCall::Deflate => Operation::Compressing,
            StreamCall::DeflateObjInit => Operation::CreatingCompressor,
            StreamCall::DeflateCopy => Operation::CopyingCompressor,
            StreamCall::DeflateSetDictionary | StreamCall::InflateSetDictionary => {
                Operation::SettingDictionary
            }
            StreamCall::DeflateFlush | StreamCall::InflateFlush => Operation::Flushing,
            StreamCall::DeflateEnd => Operation::FinishingCompression,
            StreamCall::InflateInit => Operation::PreparingDecompress,
            StreamCall::InflateObjInit => Operation::CreatingDecompressor,
            StreamCall::InflateCopy => Operation::CopyingDecompressor,
            StreamCall::Inflate => Operation::Decompressing,
            StreamCall::InflateEnd => Operation::FinishingDecompression,
        }
    }

    fn is_setup(self) -> bool {
        matches!(
            self,
            StreamCall::DeflateInit
                | StreamCall::DeflateObjInit
                | StreamCall::DeflateCopy
                | StreamCall::InflateInit
                | StreamCall::InflateObjInit
                | StreamCall::InflateCopy
                | StreamCall::DeflateSetDictionary
        )
    }
}

/// A translated status code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translated {
    pub error: CompressionError,
    /// The handle that returned the code must be released before the error
    /// reaches the caller.
    pub teardown: bool,
}

/// Maps zlib status codes to [`CompressionError`]s.
pub struct ErrorTranslator;

impl ErrorTranslator {
    /// Translate `status` returned by `call`.
    ///
    /// `detail` is the backend's own message (zlib's `strm->msg`), if any.
    /// `deallocate` requests teardown for every error; out-of-memory and
    /// setup-time stream errors tear down regardless.
    ///
    /// Returns `None` for `Z_OK` and positive codes other than `Z_NEED_DICT`.
    pub fn translate(
        call: StreamCall,
        status: i32,
        detail: Option<&str>,
        deallocate: bool,
    ) -> Option<Translated> {
        if status == Z_OK || status == Z_STREAM_END || (status > 0 && status != Z_NEED_DICT) {
            return None;
        }
        let teardown = deallocate
            || status == Z_MEM_ERROR
            || (status == Z_STREAM_ERROR && call.is_setup());
        let error = Self::error_for(call, status, detail);
        tracing::debug!(?call, status, teardown, %error, "zlib status translated");
        Some(Translated { error, teardown })
    }

    /// Like [`translate`](Self::translate) but as a `Result`, for callers
    /// that tear down unconditionally or not at all.
    pub fn check(
        call: StreamCall,
        status: i32,
        detail: Option<&str>,
    ) -> Result<(), CompressionError> {
        match Self::translate(call, status, detail, false) {
            Some(t) => Err(t.error),
            None => Ok(()),
        }
    }

    /// The error a setup call reports when it refuses its arguments
    /// (`Z_STREAM_ERROR` from an init call).
    pub fn rejected(call: StreamCall) -> CompressionError {
        Self::error_for(call, Z_STREAM_ERROR, None)
    }

    fn error_for(call: StreamCall, status: i32, detail: Option<&str>) -> CompressionError {
        let code = status;
        match (call, status) {
            (StreamCall::DeflateInit, Z_MEM_ERROR) => CompressionError::Resource {
                code,
                message: "Out of memory while compressing data".to_owned(),
            },
            (StreamCall::InflateInit, Z_MEM_ERROR) => CompressionError::Resource {
                code,
                message: "Out of memory while decompressing data".to_owned(),
            },
            (StreamCall::DeflateObjInit | StreamCall::DeflateCopy, Z_MEM_ERROR) => {
                CompressionError::Resource {
                    code,
                    message: "Can't allocate memory for compression object".to_owned(),
                }
            }
            (StreamCall::InflateObjInit | StreamCall::InflateCopy, Z_MEM_ERROR) => {
                CompressionError::Resource {
                    code,
                    message: "Can't allocate memory for decompression object".to_owned(),
                }
            }
            (_, Z_MEM_ERROR) => CompressionError::Resource {
                code,
                message: match call.operation() {
                    Operation::Decompressing => "Out of memory while decompressing data",
                    _ => "Out of memory while compressing data",
                }
                .to_owned(),
            },
            (StreamCall::DeflateInit, Z_STREAM_ERROR) => CompressionError::bad_level(),
            (StreamCall::DeflateObjInit | StreamCall::InflateObjInit, Z_STREAM_ERROR) => {
                CompressionError::invalid_option()
            }
            (StreamCall::DeflateCopy | StreamCall::InflateCopy, Z_STREAM_ERROR) => {
                CompressionError::inconsistent_state()
            }
            (StreamCall::DeflateSetDictionary, Z_STREAM_ERROR) => CompressionError::Dictionary {
                code,
                message: INVALID_DICTIONARY.to_owned(),
            },
            (StreamCall::DeflateSetDictionary, _) => CompressionError::Dictionary {
                code,
                message: DEFLATE_SET_DICTIONARY.to_owned(),
            },
            (_, Z_VERSION_ERROR) => CompressionError::VersionMismatch {
                code,
                message: format_status(code, call.operation(), Some(LIBRARY_VERSION_MISMATCH)),
            },
            _ => Self::generic(call, status, detail),
        }
    }

    fn generic(call: StreamCall, code: i32, detail: Option<&str>) -> CompressionError {
        let canned = match code {
            Z_BUF_ERROR => Some(INCOMPLETE_OR_TRUNCATED_STREAM),
            Z_STREAM_ERROR => Some(INCONSISTENT_STREAM_STATE),
            Z_DATA_ERROR => Some(INVALID_INPUT_DATA),
            _ => None,
        };
        let message = format_status(code, call.operation(), detail.or(canned));
        match code {
            Z_STREAM_ERROR => CompressionError::State { code, message },
            Z_NEED_DICT => CompressionError::Dictionary { code, message },
            _ if call == StreamCall::InflateSetDictionary => {
                CompressionError::Dictionary { code, message }
            }
            _ => CompressionError::Format { code, message },
        }
    }
}
