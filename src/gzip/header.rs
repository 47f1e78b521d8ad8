//! gzip member header parser.
//!
//! Byte-exact reading of the RFC 1952 header: magic, method, flags, the six
//! fixed bytes (MTIME, XFL, OS), then the optional FEXTRA, FNAME, FCOMMENT and
//! FHCRC sections in that order. Every byte read goes through a running
//! CRC-32 so the optional header CRC can be checked against the low 16 bits.
//!
//! The parser is stateless: it is handed everything buffered so far and
//! either returns the complete header, reports that more bytes are needed, or
//! fails.

use thiserror::Error;

use super::{CM_DEFLATE, FCOMMENT, FEXTRA, FHCRC, FNAME, FRESERVED, GZIP_HEADER_MIN, GZIP_MAGIC};
use crate::checksum::Crc32State;

/// Reasons a header is rejected. `Display` gives zlib's inflate messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GzipHeaderError {
    #[error("incorrect header check")]
    BadMagic { found: u16 },
    #[error("unknown compression method")]
    BadMethod { method: u8 },
    #[error("unknown header flags set")]
    ReservedFlags { flags: u8 },
    #[error("header crc mismatch")]
    HeaderCrc { stored: u16, computed: u16 },
}

/// A parsed member header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GzipHeader {
    /// Total header length in bytes, including optional sections.
    pub len: usize,
    pub flags: u8,
    pub mtime: u32,
    pub xfl: u8,
    pub os: u8,
    pub extra: Option<Vec<u8>>,
    pub name: Option<Vec<u8>>,
    pub comment: Option<Vec<u8>>,
    pub header_crc: Option<u16>,
}

/// Cursor over the buffered bytes; every read feeds the header CRC.
struct HeaderReader<'a> {
    buf: &'a [u8],
    pos: usize,
    crc: Crc32State,
}

impl<'a> HeaderReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            crc: Crc32State::new(),
        }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.buf.get(self.pos..end)?;
        self.crc.update(bytes);
        self.pos = end;
        Some(bytes)
    }

    fn u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn le16(&mut self) -> Option<u16> {
        self.take(2).map(|b| u16::from_le_bytes([b[0], b[1]]))
    }

    fn le32(&mut self) -> Option<u32> {
        self.take(4).map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// NUL-terminated field, terminator consumed but not returned.
    fn cstr(&mut self) -> Option<Vec<u8>> {
        let rest = self.buf.get(self.pos..)?;
        let nul = rest.iter().position(|&b| b == 0)?;
        let field = self.take(nul + 1)?;
        Some(field[..nul].to_vec())
    }

    /// Low 16 bits of the CRC-32 of everything read so far.
    fn crc16(&self) -> u16 {
        (self.crc.clone().finalize() & 0xffff) as u16
    }
}

/// Stateless gzip header parser.
pub struct GzipHeaderParser;

impl GzipHeaderParser {
    /// Parse the header at the start of `buf`.
    ///
    /// Returns `Ok(None)` when `buf` is a valid prefix that ends before the
    /// header does. Magic and method are checked as soon as their bytes are
    /// present, so garbage is rejected without waiting for ten bytes.
    pub fn parse(buf: &[u8]) -> Result<Option<GzipHeader>, GzipHeaderError> {
        if let Some(&b0) = buf.first() {
            let b1 = buf.get(1).copied().unwrap_or(GZIP_MAGIC[1]);
            if [b0, b1] != GZIP_MAGIC {
                return Err(GzipHeaderError::BadMagic {
                    found: u16::from_le_bytes([b0, b1]),
                });
            }
        }
        if let Some(&method) = buf.get(2) {
            if method != CM_DEFLATE {
                return Err(GzipHeaderError::BadMethod { method });
            }
        }
        if let Some(&flags) = buf.get(3) {
            if flags & FRESERVED != 0 {
                return Err(GzipHeaderError::ReservedFlags { flags });
            }
        }
        if buf.len() < GZIP_HEADER_MIN {
            return Ok(None);
        }
        Self::read_all(&mut HeaderReader::new(buf))
    }

    /// Length of the header at the start of `buf`, if it is complete.
    pub fn header_len(buf: &[u8]) -> Result<Option<usize>, GzipHeaderError> {
        Ok(Self::parse(buf)?.map(|h| h.len))
    }

    fn read_all(r: &mut HeaderReader<'_>) -> Result<Option<GzipHeader>, GzipHeaderError> {
        // Magic, method and reserved flags were checked by `parse`.
        let Some((flags, mtime, xfl, os)) = Self::read_fixed(r) else {
            return Ok(None);
        };
        let mut header = GzipHeader {
            flags,
            mtime,
            xfl,
            os,
            ..GzipHeader::default()
        };

        if flags & FEXTRA != 0 {
            let Some(xlen) = r.le16() else { return Ok(None) };
            let Some(extra) = r.take(usize::from(xlen)) else {
                return Ok(None);
            };
            header.extra = Some(extra.to_vec());
        }
        if flags & FNAME != 0 {
            let Some(name) = r.cstr() else { return Ok(None) };
            header.name = Some(name);
        }
        if flags & FCOMMENT != 0 {
            let Some(comment) = r.cstr() else { return Ok(None) };
            header.comment = Some(comment);
        }
        if flags & FHCRC != 0 {
            let computed = r.crc16();
            let Some(stored) = r.le16() else { return Ok(None) };
            if stored != computed {
                return Err(GzipHeaderError::HeaderCrc { stored, computed });
            }
            header.header_crc = Some(stored);
        }
        header.len = r.pos;
        Ok(Some(header))
    }

    fn read_fixed(r: &mut HeaderReader<'_>) -> Option<(u8, u32, u8, u8)> {
        r.take(3)?;
        let flags = r.u8()?;
        let mtime = r.le32()?;
        let xfl = r.u8()?;
        let os = r.u8()?;
        Some((flags, mtime, xfl, os))
    }
}
