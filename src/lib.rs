// zlibr: zlib stream compression with native and managed DEFLATE backends

pub mod config;
pub mod checksum;
pub mod buffer;
pub mod types;
pub mod error;
pub mod gzip;
pub mod deflate;
pub mod backend;
pub mod engine;
pub mod oneshot;
pub mod session;
pub mod io;
pub mod cli;

// ── Version constants (zlib.h) ───────────────────────────────────────────────
pub use types::{ZLIB_RUNTIME_VERSION, ZLIB_VERSION};
pub const ZLIB_VERNUM: u32 = 0x1310;
pub const ZLIBR_VERSION_STRING: &str = env!("CARGO_PKG_VERSION");

/// Version of the zlib contract the crate follows (zlibVersion()).
pub fn zlib_version() -> &'static str {
    ZLIB_VERSION
}

// ── Module-level constants ───────────────────────────────────────────────────
pub use config::{DEF_BUF_SIZE, DEF_MEM_LEVEL, MAX_WBITS};
pub use types::{
    DEFLATED, Z_BEST_COMPRESSION, Z_BEST_SPEED, Z_BLOCK, Z_BUF_ERROR, Z_DATA_ERROR,
    Z_DEFAULT_COMPRESSION, Z_DEFAULT_STRATEGY, Z_ERRNO, Z_FILTERED, Z_FINISH, Z_FIXED,
    Z_FULL_FLUSH, Z_HUFFMAN_ONLY, Z_MEM_ERROR, Z_NEED_DICT, Z_NO_COMPRESSION, Z_NO_FLUSH, Z_OK,
    Z_PARTIAL_FLUSH, Z_RLE, Z_STREAM_END, Z_STREAM_ERROR, Z_SYNC_FLUSH, Z_TREES,
    Z_VERSION_ERROR,
};

// ── Top-level re-exports ─────────────────────────────────────────────────────
pub use backend::Backend;
pub use checksum::{adler32, crc32};
pub use engine::{CompressOptions, CompressionEngine, DecompressionEngine, Decompressor};
pub use error::{CompressionError, ErrorTranslator};
pub use oneshot::{compress, decompress};
pub use session::{CompressSession, DecompressSession, DecompressorSession, Session};
pub use types::{Flush, Framing, Level, Strategy, WindowBits};
