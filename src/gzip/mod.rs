//! gzip member framing (RFC 1952).
//!
//! The DEFLATE backends only ever see raw streams; the gzip header, CRC-32 and
//! ISIZE trailer are produced and checked here so both backends share one
//! implementation of the container.

pub mod header;

pub use header::{GzipHeader, GzipHeaderError, GzipHeaderParser};

use crate::checksum::Crc32State;
use crate::types::Level;

// ─────────────────────────────────────────────────────────────────────────────
// Format constants (RFC 1952 section 2.3)
// ─────────────────────────────────────────────────────────────────────────────

pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
pub const CM_DEFLATE: u8 = 8;

pub const FTEXT: u8 = 0x01;
pub const FHCRC: u8 = 0x02;
pub const FEXTRA: u8 = 0x04;
pub const FNAME: u8 = 0x08;
pub const FCOMMENT: u8 = 0x10;
/// Bits 5..7 must be zero.
pub const FRESERVED: u8 = 0xe0;

pub const OS_UNIX: u8 = 3;

/// Fixed part of the member header.
pub const GZIP_HEADER_MIN: usize = 10;
/// CRC-32 + ISIZE.
pub const GZIP_TRAILER_SIZE: usize = 8;

/// True when `data` starts with the gzip magic.
#[inline]
pub fn has_gzip_magic(data: &[u8]) -> bool {
    data.len() >= 2 && data[..2] == GZIP_MAGIC
}

/// The 10-byte header written by the compressor: no optional fields,
/// mtime 0, XFL from the level, OS = Unix.
pub fn write_header(level: Level) -> [u8; GZIP_HEADER_MIN] {
    let xfl = match level.effective() {
        9 => 2,
        1 => 4,
        _ => 0,
    };
    [
        GZIP_MAGIC[0],
        GZIP_MAGIC[1],
        CM_DEFLATE,
        0,
        0,
        0,
        0,
        0,
        xfl,
        OS_UNIX,
    ]
}

/// Running CRC-32 and size of the uncompressed member payload.
#[derive(Clone)]
pub struct MemberCheck {
    crc: Crc32State,
    size: u64,
}

impl core::fmt::Debug for MemberCheck {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemberCheck")
            .field("crc", &self.crc.clone().finalize())
            .field("size", &self.size)
            .finish()
    }
}

impl Default for MemberCheck {
    fn default() -> Self {
        Self {
            crc: Crc32State::new(),
            size: 0,
        }
    }
}

impl MemberCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.crc.update(data);
        self.size += data.len() as u64;
    }

    pub fn crc(&self) -> u32 {
        self.crc.clone().finalize()
    }

    /// ISIZE: the payload length modulo 2^32.
    pub fn isize(&self) -> u32 {
        self.size as u32
    }

    /// The 8-byte trailer for the data seen so far.
    pub fn trailer(&self) -> [u8; GZIP_TRAILER_SIZE] {
        let mut out = [0u8; GZIP_TRAILER_SIZE];
        out[..4].copy_from_slice(&self.crc().to_le_bytes());
        out[4..].copy_from_slice(&self.isize().to_le_bytes());
        out
    }

    /// Compare a received trailer against the data seen so far. Returns the
    /// zlib message for the first mismatch.
    pub fn verify(&self, trailer: &[u8]) -> Result<(), &'static str> {
        if trailer.len() < GZIP_TRAILER_SIZE {
            return Err(crate::error::INCOMPLETE_OR_TRUNCATED_STREAM);
        }
        let crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let isize = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);
        if crc != self.crc() {
            return Err("incorrect data check");
        }
        if isize != self.isize() {
            return Err("incorrect length check");
        }
        Ok(())
    }
}
