//! zlib stream constants, flush modes, strategies, levels and framing.
//!
//! Mirrors the public constant surface of zlib.h: return codes, flush values,
//! compression levels and strategies, plus the `windowBits` encoding that
//! selects raw / zlib / gzip framing.

use core::fmt;

use crate::config::MAX_WBITS;

// ─────────────────────────────────────────────────────────────────────────────
// Return codes (zlib.h)
// ─────────────────────────────────────────────────────────────────────────────

pub const Z_OK: i32 = 0;
pub const Z_STREAM_END: i32 = 1;
pub const Z_NEED_DICT: i32 = 2;
pub const Z_ERRNO: i32 = -1;
pub const Z_STREAM_ERROR: i32 = -2;
pub const Z_DATA_ERROR: i32 = -3;
pub const Z_MEM_ERROR: i32 = -4;
pub const Z_BUF_ERROR: i32 = -5;
pub const Z_VERSION_ERROR: i32 = -6;

// ─────────────────────────────────────────────────────────────────────────────
// Flush values
// ─────────────────────────────────────────────────────────────────────────────

pub const Z_NO_FLUSH: i32 = 0;
pub const Z_PARTIAL_FLUSH: i32 = 1;
pub const Z_SYNC_FLUSH: i32 = 2;
pub const Z_FULL_FLUSH: i32 = 3;
pub const Z_FINISH: i32 = 4;
pub const Z_BLOCK: i32 = 5;
pub const Z_TREES: i32 = 6;

// ─────────────────────────────────────────────────────────────────────────────
// Levels, strategies, method
// ─────────────────────────────────────────────────────────────────────────────

pub const Z_NO_COMPRESSION: i32 = 0;
pub const Z_BEST_SPEED: i32 = 1;
pub const Z_BEST_COMPRESSION: i32 = 9;
pub const Z_DEFAULT_COMPRESSION: i32 = -1;

pub const Z_FILTERED: i32 = 1;
pub const Z_HUFFMAN_ONLY: i32 = 2;
pub const Z_RLE: i32 = 3;
pub const Z_FIXED: i32 = 4;
pub const Z_DEFAULT_STRATEGY: i32 = 0;

/// The only compression method zlib defines.
pub const DEFLATED: i32 = 8;

/// zlib version the framing and error contract follow.
pub const ZLIB_VERSION: &str = "1.3.1";
pub const ZLIB_RUNTIME_VERSION: &str = ZLIB_VERSION;

/// Level zlib substitutes for `Z_DEFAULT_COMPRESSION`.
pub const DEFAULT_LEVEL: u32 = 6;

// ─────────────────────────────────────────────────────────────────────────────
// Flush
// ─────────────────────────────────────────────────────────────────────────────

/// Flush mode passed to a compress or flush call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum Flush {
    #[default]
    None = Z_NO_FLUSH,
    Partial = Z_PARTIAL_FLUSH,
    Sync = Z_SYNC_FLUSH,
    Full = Z_FULL_FLUSH,
    Finish = Z_FINISH,
    Block = Z_BLOCK,
    Trees = Z_TREES,
}

impl Flush {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            Z_NO_FLUSH => Flush::None,
            Z_PARTIAL_FLUSH => Flush::Partial,
            Z_SYNC_FLUSH => Flush::Sync,
            Z_FULL_FLUSH => Flush::Full,
            Z_FINISH => Flush::Finish,
            Z_BLOCK => Flush::Block,
            Z_TREES => Flush::Trees,
            _ => return None,
        })
    }

    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Strategy
// ─────────────────────────────────────────────────────────────────────────────

/// Compression strategy (`strategy` argument of deflateInit2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum Strategy {
    #[default]
    Default = Z_DEFAULT_STRATEGY,
    /// Data produced by a filter: favour Huffman coding over short matches.
    Filtered = Z_FILTERED,
    /// Literals only, no string matching.
    HuffmanOnly = Z_HUFFMAN_ONLY,
    /// Matches limited to distance one (run-length encoding).
    Rle = Z_RLE,
    /// Static Huffman codes only.
    Fixed = Z_FIXED,
}

impl Strategy {
    pub fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            Z_DEFAULT_STRATEGY => Strategy::Default,
            Z_FILTERED => Strategy::Filtered,
            Z_HUFFMAN_ONLY => Strategy::HuffmanOnly,
            Z_RLE => Strategy::Rle,
            Z_FIXED => Strategy::Fixed,
            _ => return None,
        })
    }

    #[inline]
    pub fn code(self) -> i32 {
        self as i32
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Level
// ─────────────────────────────────────────────────────────────────────────────

/// A validated compression level: 0..=9, with -1 meaning "default" (6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Level(i32);

impl Level {
    pub const DEFAULT: Level = Level(Z_DEFAULT_COMPRESSION);
    pub const NONE: Level = Level(Z_NO_COMPRESSION);
    pub const FAST: Level = Level(Z_BEST_SPEED);
    pub const BEST: Level = Level(Z_BEST_COMPRESSION);

    pub fn new(level: i32) -> Option<Self> {
        (Z_DEFAULT_COMPRESSION..=Z_BEST_COMPRESSION)
            .contains(&level)
            .then_some(Level(level))
    }

    /// The level as passed by the caller (may be -1).
    #[inline]
    pub fn code(self) -> i32 {
        self.0
    }

    /// The level the encoder actually runs at (0..=9).
    #[inline]
    pub fn effective(self) -> u32 {
        if self.0 < 0 {
            DEFAULT_LEVEL
        } else {
            self.0 as u32
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::DEFAULT
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Framing / windowBits
// ─────────────────────────────────────────────────────────────────────────────

/// Container wrapped around the DEFLATE payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Framing {
    /// Bare DEFLATE, no header or trailer.
    Raw,
    /// RFC 1950: 2-byte header, optional dictionary id, Adler-32 trailer.
    Zlib,
    /// RFC 1952: gzip member header, CRC-32 + ISIZE trailer.
    Gzip,
    /// Decompress only: zlib or gzip, chosen from the first bytes.
    Auto,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Framing::Raw => "raw",
            Framing::Zlib => "zlib",
            Framing::Gzip => "gzip",
            Framing::Auto => "auto",
        })
    }
}

/// A decoded `windowBits` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowBits {
    /// The value the caller passed.
    pub raw: i32,
    pub framing: Framing,
    /// Window size exponent, 9..=15. For decompression with `raw == 0` or
    /// `raw == 32` this is `MAX_WBITS` and the stream header decides.
    pub log2: u8,
}

impl WindowBits {
    /// Decode a compression `windowBits`: `-15..=-8` raw, `8..=15` zlib,
    /// `25..=31` gzip. A window of 8 is promoted to 9.
    pub fn for_compress(wbits: i32) -> Option<Self> {
        let (framing, log2) = match wbits {
            -15..=-8 => (Framing::Raw, -wbits),
            8..=15 => (Framing::Zlib, wbits),
            25..=31 => (Framing::Gzip, wbits - 16),
            _ => return None,
        };
        Some(Self::with(wbits, framing, log2))
    }

    /// Decode a decompression `windowBits`. Accepts every compression value
    /// plus `0` (zlib, window from the header) and `32`, `40..=47`
    /// (auto-detect zlib or gzip).
    pub fn for_decompress(wbits: i32) -> Option<Self> {
        let (framing, log2) = match wbits {
            0 => (Framing::Zlib, MAX_WBITS),
            32 => (Framing::Auto, MAX_WBITS),
            40..=47 => (Framing::Auto, wbits - 32),
            _ => return Self::for_compress(wbits),
        };
        Some(Self::with(wbits, framing, log2))
    }

    fn with(raw: i32, framing: Framing, log2: i32) -> Self {
        Self {
            raw,
            framing,
            log2: log2.clamp(9, MAX_WBITS) as u8,
        }
    }

    /// Window size in bytes.
    #[inline]
    pub fn window_size(self) -> usize {
        1usize << self.log2
    }
}
