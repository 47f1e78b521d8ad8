//! Streaming CRC-32 and Adler-32 checksums.
//!
//! CRC-32 is a thin wrapper around the `crc32fast` crate (IEEE 802.3
//! polynomial, the same table zlib uses). Adler-32 is computed here, batching
//! additions so the 32-bit sums never overflow between modulo reductions.
//!
//! Both functions take the running value from a previous call, so a checksum
//! over `a ++ b` equals `f(b, f(a, init))`.

pub use crc32fast::Hasher as Crc32State;

/// Largest prime smaller than 65536.
pub const ADLER_BASE: u32 = 65_521;

/// Bytes summed before a modulo reduction is forced.
///
/// zlib's NMAX (5552) is the largest n with
/// `255 n (n + 1) / 2 + (n + 1)(BASE - 1) <= 2^32 - 1`. The window used here is
/// smaller so the bound holds with the unreduced running sums carried in.
pub const ADLER_DEFER: usize = 3850;

/// Initial value of an Adler-32 accumulator.
pub const ADLER32_INIT: u32 = 1;

/// Initial value of a CRC-32 accumulator.
pub const CRC32_INIT: u32 = 0;

/// Update a CRC-32 with `data`, starting from `value`.
///
/// # Parity vectors
/// * `crc32(b"", 0)` == `0`
/// * `crc32(b"123456789", 0)` == `0xCBF43926`
#[inline]
pub fn crc32(data: &[u8], value: u32) -> u32 {
    let mut hasher = Crc32State::new_with_initial(value);
    hasher.update(data);
    hasher.finalize()
}

/// Update an Adler-32 with `data`, starting from `value`.
///
/// # Parity vectors
/// * `adler32(b"", 1)` == `1`
/// * `adler32(b"Wikipedia", 1)` == `0x11E60398`
pub fn adler32(data: &[u8], value: u32) -> u32 {
    let mut s1 = value & 0xffff;
    let mut s2 = value >> 16;
    for window in data.chunks(ADLER_DEFER) {
        for &byte in window {
            s1 += u32::from(byte);
            s2 += s1;
        }
        s1 %= ADLER_BASE;
        s2 %= ADLER_BASE;
    }
    (s2 << 16) | s1
}

/// Incremental Adler-32, used by the zlib framing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adler32State {
    value: u32,
}

impl Default for Adler32State {
    fn default() -> Self {
        Self { value: ADLER32_INIT }
    }
}

impl Adler32State {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.value = adler32(data, self.value);
    }

    #[inline]
    pub fn value(&self) -> u32 {
        self.value
    }
}
