//! Huffman coding for DEFLATE: bit I/O, canonical codes, length-limited code
//! construction and a table-driven decoder.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::tables::MAX_BITS;

// ─────────────────────────────────────────────────────────────────────────────
// Bit output
// ─────────────────────────────────────────────────────────────────────────────

/// LSB-first bit writer. Partial bytes survive across calls so a block can
/// end mid-byte and the next block continue from there.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    out: Vec<u8>,
    bit_buf: u64,
    bit_count: u32,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u32) {
        debug_assert!(count <= 32);
        if count == 0 {
            return;
        }
        self.bit_buf |= u64::from(value & mask(count)) << self.bit_count;
        self.bit_count += count;
        while self.bit_count >= 8 {
            self.out.push(self.bit_buf as u8);
            self.bit_buf >>= 8;
            self.bit_count -= 8;
        }
    }

    /// Write a Huffman code stored bit-reversed (LSB first).
    #[inline]
    pub fn write_code(&mut self, code: u16, len: u8) {
        self.write_bits(u32::from(code), u32::from(len));
    }

    /// Pad with zero bits to the next byte boundary.
    pub fn align(&mut self) {
        if self.bit_count > 0 {
            self.out.push(self.bit_buf as u8);
            self.bit_buf = 0;
            self.bit_count = 0;
        }
    }

    /// Append whole bytes. The writer must be byte aligned.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        debug_assert_eq!(self.bit_count, 0);
        self.out.extend_from_slice(bytes);
    }

    /// Bits written but not yet forming a complete byte.
    #[inline]
    pub fn pending_bits(&self) -> u32 {
        self.bit_count
    }

    /// Move every completed byte into `dst`.
    pub fn drain_into(&mut self, dst: &mut Vec<u8>) {
        dst.append(&mut self.out);
    }
}

#[inline]
fn mask(count: u32) -> u32 {
    if count >= 32 {
        u32::MAX
    } else {
        (1u32 << count) - 1
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Bit input
// ─────────────────────────────────────────────────────────────────────────────

/// LSB-first bit cursor over a byte slice.
///
/// The cursor is `Copy`: a decoder takes a trial copy, reads a complete unit
/// (a symbol with its extra bits, a block header) from it, and only writes it
/// back when the unit was fully available. Reads past the end yield `None`.
#[derive(Debug, Clone, Copy)]
pub struct Bits<'a> {
    data: &'a [u8],
    /// Absolute bit position.
    pos: usize,
}

impl<'a> Bits<'a> {
    pub fn new(data: &'a [u8], bit_offset: usize) -> Self {
        Self {
            data,
            pos: bit_offset,
        }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn available(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    /// Up to 25 bits at the cursor, zero-padded past the end of the data.
    #[inline]
    pub fn peek(&self, count: u32) -> u32 {
        debug_assert!(count <= 25);
        let byte = self.pos >> 3;
        let mut word = 0u32;
        for i in 0..4 {
            if let Some(&b) = self.data.get(byte + i) {
                word |= u32::from(b) << (8 * i);
            }
        }
        (word >> (self.pos & 7)) & mask(count)
    }

    #[inline]
    pub fn skip(&mut self, count: u32) {
        self.pos += count as usize;
    }

    #[inline]
    pub fn bits(&mut self, count: u32) -> Option<u32> {
        if self.available() < count as usize {
            return None;
        }
        let v = self.peek(count);
        self.pos += count as usize;
        Some(v)
    }

    /// Skip to the next byte boundary.
    #[inline]
    pub fn align(&mut self) {
        self.pos = (self.pos + 7) & !7;
    }

    /// Whole bytes available from an aligned cursor.
    pub fn aligned_bytes(&self) -> &'a [u8] {
        debug_assert_eq!(self.pos & 7, 0);
        self.data.get(self.pos >> 3..).unwrap_or(&[])
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Canonical codes
// ─────────────────────────────────────────────────────────────────────────────

fn reverse_bits(code: u32, len: u8) -> u16 {
    let mut rev = 0u32;
    let mut c = code;
    for _ in 0..len {
        rev = (rev << 1) | (c & 1);
        c >>= 1;
    }
    rev as u16
}

/// Canonical codes (RFC 1951 section 3.2.2), bit-reversed for LSB-first output.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u16> {
    let mut bl_count = [0u32; MAX_BITS + 1];
    for &len in lengths {
        if len > 0 {
            bl_count[usize::from(len)] += 1;
        }
    }
    let mut next_code = [0u32; MAX_BITS + 2];
    let mut code = 0u32;
    for bits in 1..=MAX_BITS {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }
    lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                return 0;
            }
            let c = next_code[usize::from(len)];
            next_code[usize::from(len)] += 1;
            reverse_bits(c, len)
        })
        .collect()
}

/// An encoding table: per-symbol code lengths and reversed codes.
#[derive(Debug, Clone)]
pub struct HuffmanEncoder {
    pub lengths: Vec<u8>,
    pub codes: Vec<u16>,
}

impl HuffmanEncoder {
    pub fn from_lengths(lengths: &[u8]) -> Self {
        Self {
            lengths: lengths.to_vec(),
            codes: canonical_codes(lengths),
        }
    }

    /// Optimal code for `freqs` with no code longer than `max_bits`.
    pub fn from_frequencies(freqs: &[u32], max_bits: u8) -> Self {
        Self::from_lengths(&build_lengths(freqs, max_bits))
    }

    #[inline]
    pub fn write(&self, w: &mut BitWriter, symbol: usize) {
        w.write_code(self.codes[symbol], self.lengths[symbol]);
    }

    /// Bits needed to code `freqs` with this table.
    pub fn cost(&self, freqs: &[u32]) -> u64 {
        freqs
            .iter()
            .zip(&self.lengths)
            .map(|(&f, &l)| u64::from(f) * u64::from(l))
            .sum()
    }
}

/// Length-limited Huffman code lengths.
///
/// Builds an unrestricted Huffman tree; if it is deeper than `max_bits` the
/// frequencies are halved (keeping every used symbol at least 1) and the tree
/// rebuilt. At least two symbols always receive a code so the result is a
/// complete prefix code.
pub fn build_lengths(freqs: &[u32], max_bits: u8) -> Vec<u8> {
    let mut work: Vec<u32> = freqs.to_vec();
    let mut used = work.iter().filter(|&&f| f > 0).count();
    for slot in work.iter_mut() {
        if used >= 2 {
            break;
        }
        if *slot == 0 {
            *slot = 1;
            used += 1;
        }
    }
    loop {
        let lengths = tree_depths(&work);
        if lengths.iter().all(|&l| l <= max_bits) {
            return lengths;
        }
        for f in work.iter_mut().filter(|f| **f > 0) {
            *f = (*f >> 1).max(1);
        }
    }
}

fn tree_depths(freqs: &[u32]) -> Vec<u8> {
    let n = freqs.len();
    let mut parent: Vec<usize> = vec![usize::MAX; n];
    let mut heap = BinaryHeap::new();
    for (sym, &f) in freqs.iter().enumerate() {
        if f > 0 {
            heap.push(Reverse((u64::from(f), sym)));
        }
    }
    let mut lengths = vec![0u8; n];
    if heap.len() == 1 {
        if let Some(Reverse((_, sym))) = heap.pop() {
            lengths[sym] = 1;
        }
        return lengths;
    }
    while heap.len() > 1 {
        let (Some(Reverse((fa, a))), Some(Reverse((fb, b)))) = (heap.pop(), heap.pop()) else {
            break;
        };
        let node = parent.len();
        parent.push(usize::MAX);
        parent[a] = node;
        parent[b] = node;
        heap.push(Reverse((fa + fb, node)));
    }
    for (sym, &f) in freqs.iter().enumerate() {
        if f == 0 {
            continue;
        }
        let mut depth = 0usize;
        let mut at = sym;
        while parent[at] != usize::MAX {
            at = parent[at];
            depth += 1;
        }
        lengths[sym] = depth.min(usize::from(u8::MAX)) as u8;
    }
    lengths
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

/// Which alphabet a decoding table is built for; governs the completeness
/// rules zlib applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    /// Code-length codes: must be complete.
    CodeLengths,
    /// Literal/length codes.
    Lengths,
    /// Distance codes.
    Distances,
}

/// The lengths cannot form a usable prefix code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCode;

/// Result of decoding one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    Symbol(u16),
    /// Not enough input to finish the code.
    NeedMore,
    /// The bits match no code.
    Invalid,
}

/// Single-level lookup table indexed by the next `table_bits` input bits.
#[derive(Debug, Clone)]
pub struct HuffmanDecoder {
    /// `symbol << 4 | length`; length 0 marks an unused slot.
    table: Vec<u32>,
    table_bits: u32,
}

impl HuffmanDecoder {
    /// A table with no codes; every lookup is invalid.
    pub fn empty() -> Self {
        Self {
            table: vec![0; 2],
            table_bits: 1,
        }
    }

    /// Build a table, rejecting over-subscribed sets and incomplete sets
    /// other than a lone one-bit code (or no codes at all for distances).
    pub fn new(lengths: &[u8], kind: CodeKind) -> Result<Self, InvalidCode> {
        let mut count = [0u32; MAX_BITS + 1];
        for &len in lengths {
            count[usize::from(len)] += 1;
        }
        count[0] = 0;
        let max = (1..=MAX_BITS).rev().find(|&b| count[b] != 0).unwrap_or(0);

        if max == 0 {
            if kind == CodeKind::CodeLengths {
                return Err(InvalidCode);
            }
            return Ok(Self::empty());
        }

        let mut left: i64 = 1;
        for &c in &count[1..] {
            left <<= 1;
            left -= i64::from(c);
            if left < 0 {
                return Err(InvalidCode);
            }
        }
        if left > 0 && (kind == CodeKind::CodeLengths || max != 1) {
            return Err(InvalidCode);
        }

        let table_bits = max as u32;
        let mut table = vec![0u32; 1 << table_bits];
        let codes = canonical_codes(lengths);
        for (sym, (&len, &code)) in lengths.iter().zip(&codes).enumerate() {
            if len == 0 {
                continue;
            }
            let entry = ((sym as u32) << 4) | u32::from(len);
            let step = 1usize << len;
            let mut i = usize::from(code);
            while i < table.len() {
                table[i] = entry;
                i += step;
            }
        }
        Ok(Self { table, table_bits })
    }

    /// Decode the next symbol, advancing `bits` only on success.
    #[inline]
    pub fn decode(&self, bits: &mut Bits<'_>) -> Decoded {
        let entry = self.table[bits.peek(self.table_bits) as usize];
        let len = entry & 0xf;
        let available = bits.available();
        if len == 0 {
            return if available < self.table_bits as usize {
                Decoded::NeedMore
            } else {
                Decoded::Invalid
            };
        }
        if (len as usize) > available {
            return Decoded::NeedMore;
        }
        bits.skip(len);
        Decoded::Symbol((entry >> 4) as u16)
    }
}
