//! Incremental DEFLATE encoder (RFC 1951) with optional zlib wrapper.
//!
//! LZ77 over a sliding window with hash chains, greedy parsing for levels 1-3
//! and lazy parsing above, tuned by zlib's per-level table. Tokens are
//! buffered into blocks; each block is written stored, with the static codes
//! or with dynamic codes, whichever is smallest.
//!
//! Positions are absolute stream offsets; `window[0]` sits at `base`.

use thiserror::Error;

use super::huffman::{BitWriter, HuffmanEncoder};
use super::tables::{
    dist_index, length_index, CL_CODES, CL_ORDER, DIST_BASE, DIST_EXTRA, DYN_TREES, D_CODES, END_BLOCK,
    FIXED_DIST_LENGTHS, FIXED_LIT_LENGTHS, LENGTH_BASE, LENGTH_EXTRA, L_CODES, MAX_BITS,
    MAX_CL_BITS, MAX_MATCH, MAX_STORED, MIN_MATCH, STATIC_TREES, STORED_BLOCK,
};
use crate::checksum::{adler32, Adler32State, ADLER32_INIT};
use crate::types::{Flush, Strategy};

/// Bytes of lookahead kept unparsed until a flush, so every match can reach
/// its full length.
const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// Length-3 matches further back than this cost more than three literals.
const TOO_FAR: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct LevelConfig {
    /// Shorten the chain search once a match this long is in hand.
    good: usize,
    /// Lazy: only look for a better match below this length.
    lazy: usize,
    /// Stop searching at this length.
    nice: usize,
    chain: usize,
}

const fn cfg(good: usize, lazy: usize, nice: usize, chain: usize) -> LevelConfig {
    LevelConfig {
        good,
        lazy,
        nice,
        chain,
    }
}

const CONFIG_TABLE: [LevelConfig; 10] = [
    cfg(0, 0, 0, 0),
    cfg(4, 4, 8, 4),
    cfg(4, 5, 16, 8),
    cfg(4, 6, 32, 32),
    cfg(4, 4, 16, 16),
    cfg(8, 16, 32, 32),
    cfg(8, 16, 128, 128),
    cfg(8, 32, 128, 256),
    cfg(32, 128, 258, 1024),
    cfg(32, 258, 258, 4096),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeflateError {
    #[error("stream already finished")]
    Finished,
    #[error("unsupported flush mode")]
    BadFlush,
    #[error("dictionary must be set before any data")]
    DictionaryTooLate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeflateStatus {
    Ok,
    StreamEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Literal(u8),
    Match { len: u16, dist: u16 },
}

/// Streaming deflater. `Clone` yields an independent snapshot.
#[derive(Debug, Clone)]
pub struct Deflater {
    level: u32,
    strategy: Strategy,
    zlib: bool,
    window_bits: u8,
    config: LevelConfig,

    window: Vec<u8>,
    base: usize,
    pos: usize,
    block_start: usize,
    inserted: usize,
    head: Vec<usize>,
    prev: Vec<usize>,
    hash_shift: u32,

    tokens: Vec<Token>,
    lit_bufsize: usize,
    writer: BitWriter,
    fixed_lit: HuffmanEncoder,
    fixed_dist: HuffmanEncoder,

    adler: Adler32State,
    dict_id: Option<u32>,
    started: bool,
    finished: bool,
    total_in: u64,
}

impl Deflater {
    /// `level` 0..=9, `window_bits` 9..=15, `mem_level` 1..=9.
    pub fn new(level: u32, window_bits: u8, mem_level: u32, strategy: Strategy, zlib: bool) -> Self {
        let level = level.min(9);
        let hash_bits = (mem_level.clamp(1, 9) + 7).min(16);
        let wsize = 1usize << window_bits;
        Self {
            level,
            strategy,
            zlib,
            window_bits,
            config: CONFIG_TABLE[level as usize],
            window: Vec::new(),
            base: 0,
            pos: 0,
            block_start: 0,
            inserted: 0,
            head: vec![0; 1 << hash_bits],
            prev: vec![0; wsize],
            hash_shift: 32 - hash_bits,
            tokens: Vec::new(),
            lit_bufsize: 1 << (mem_level.clamp(1, 9) + 6),
            writer: BitWriter::new(),
            fixed_lit: HuffmanEncoder::from_lengths(&FIXED_LIT_LENGTHS),
            fixed_dist: HuffmanEncoder::from_lengths(&FIXED_DIST_LENGTHS),
            adler: Adler32State::new(),
            dict_id: None,
            started: false,
            finished: false,
            total_in: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn total_in(&self) -> u64 {
        self.total_in
    }

    /// Preset dictionary. zlib streams take it only before the first
    /// `deflate` call; raw streams whenever no input is pending. Returns the
    /// dictionary's Adler-32.
    pub fn set_dictionary(&mut self, dict: &[u8]) -> Result<u32, DeflateError> {
        if self.finished || (self.zlib && self.started) || self.pos < self.end() {
            return Err(DeflateError::DictionaryTooLate);
        }
        let id = adler32(dict, ADLER32_INIT);
        let keep = dict.len().min(self.wsize());
        self.window.extend_from_slice(&dict[dict.len() - keep..]);
        let end = self.end();
        self.insert_upto(end);
        self.pos = end;
        self.block_start = end;
        if self.zlib {
            self.dict_id = Some(id);
        }
        Ok(id)
    }

    /// Compress `input`, appending output to `out`.
    pub fn deflate(
        &mut self,
        input: &[u8],
        flush: Flush,
        out: &mut Vec<u8>,
    ) -> Result<DeflateStatus, DeflateError> {
        if flush == Flush::Trees {
            return Err(DeflateError::BadFlush);
        }
        if self.finished {
            if flush == Flush::Finish && input.is_empty() {
                return Ok(DeflateStatus::StreamEnd);
            }
            return Err(DeflateError::Finished);
        }
        if !self.started {
            self.started = true;
            if self.zlib {
                self.write_zlib_header();
            }
        }

        self.slide();
        self.window.extend_from_slice(input);
        self.total_in += input.len() as u64;
        if self.zlib {
            self.adler.update(input);
        }

        self.tokenize(flush != Flush::None);

        match flush {
            Flush::None | Flush::Trees => {}
            Flush::Partial => {
                self.flush_block(false);
                self.writer.write_bits(STATIC_TREES << 1, 3);
                self.fixed_lit.write(&mut self.writer, usize::from(END_BLOCK));
            }
            Flush::Sync | Flush::Full => {
                self.flush_block(false);
                self.writer.write_bits(STORED_BLOCK << 1, 3);
                self.writer.align();
                self.writer.write_bytes(&[0x00, 0x00, 0xff, 0xff]);
                if flush == Flush::Full {
                    self.head.fill(0);
                }
            }
            Flush::Block => self.flush_block(false),
            Flush::Finish => {
                self.emit_block(true);
                self.writer.align();
                if self.zlib {
                    self.writer.write_bytes(&self.adler.value().to_be_bytes());
                }
                self.finished = true;
            }
        }

        self.writer.drain_into(out);
        Ok(if self.finished {
            DeflateStatus::StreamEnd
        } else {
            DeflateStatus::Ok
        })
    }

    // ── zlib wrapper ────────────────────────────────────────────────────────

    fn write_zlib_header(&mut self) {
        let level_flags: u32 = if self.strategy.code() >= Strategy::HuffmanOnly.code() || self.level < 2 {
            0
        } else if self.level < 6 {
            1
        } else if self.level == 6 {
            2
        } else {
            3
        };
        let cmf = ((u32::from(self.window_bits) - 8) << 4) | 8;
        let mut header = (cmf << 8) | (level_flags << 6);
        if self.dict_id.is_some() {
            header |= 0x20;
        }
        header += 31 - header % 31;
        self.writer.write_bytes(&(header as u16).to_be_bytes());
        if let Some(id) = self.dict_id {
            self.writer.write_bytes(&id.to_be_bytes());
        }
    }

    // ── window and hash chains ──────────────────────────────────────────────

    #[inline]
    fn wsize(&self) -> usize {
        1usize << self.window_bits
    }

    #[inline]
    fn end(&self) -> usize {
        self.base + self.window.len()
    }

    #[inline]
    fn byte(&self, abs: usize) -> u8 {
        self.window[abs - self.base]
    }

    /// Drop history that no match or pending block can still reach.
    fn slide(&mut self) {
        let keep_from = self.block_start.min(self.pos.saturating_sub(self.wsize()));
        if keep_from.saturating_sub(self.base) >= self.wsize() {
            self.window.drain(..keep_from - self.base);
            self.base = keep_from;
        }
    }

    #[inline]
    fn hash(&self, abs: usize) -> usize {
        let i = abs - self.base;
        let key = u32::from_le_bytes([self.window[i], self.window[i + 1], self.window[i + 2], 0]);
        (key.wrapping_mul(0x9e37_79b1) >> self.hash_shift) as usize
    }

    fn insert_upto(&mut self, upto: usize) {
        let end = self.end();
        let wmask = self.wsize() - 1;
        while self.inserted < upto {
            let p = self.inserted;
            if p >= self.base && p + MIN_MATCH <= end {
                let h = self.hash(p);
                self.prev[p & wmask] = self.head[h];
                self.head[h] = p + 1;
            }
            self.inserted += 1;
        }
    }

    // ── parsing ─────────────────────────────────────────────────────────────

    fn lazy(&self) -> bool {
        self.level >= 4
    }

    fn tokenize(&mut self, flushing: bool) {
        let end = self.end();
        let limit = if flushing {
            end
        } else {
            end.saturating_sub(MIN_LOOKAHEAD)
        };
        if self.level == 0 {
            self.pos = self.pos.max(limit);
            if self.pos - self.block_start >= MAX_STORED {
                self.emit_block(false);
            }
            return;
        }

        while self.pos < limit {
            let p = self.pos;
            let found = self.best_match(p, MIN_MATCH - 1);
            self.insert_upto(p + 1);
            let chosen = match found {
                Some((len, _)) if self.lazy() && len < self.config.lazy && p + 1 < limit => {
                    match self.best_match(p + 1, len) {
                        Some((next, _)) if next > len => None,
                        _ => found,
                    }
                }
                other => other,
            };
            match chosen {
                Some((len, dist)) => {
                    self.tokens.push(Token::Match {
                        len: len as u16,
                        dist: dist as u16,
                    });
                    self.insert_upto(p + len);
                    self.pos = p + len;
                }
                None => {
                    self.tokens.push(Token::Literal(self.byte(p)));
                    self.pos = p + 1;
                }
            }
            if self.tokens.len() >= self.lit_bufsize {
                self.emit_block(false);
            }
        }
    }

    /// Longest acceptable match at `p` longer than `shorter_than`.
    fn best_match(&self, p: usize, shorter_than: usize) -> Option<(usize, usize)> {
        let end = self.end();
        if p + MIN_MATCH > end {
            return None;
        }
        let max_len = MAX_MATCH.min(end - p);
        let (len, dist) = match self.strategy {
            Strategy::HuffmanOnly => return None,
            Strategy::Rle => {
                if p == self.base {
                    return None;
                }
                let prev = self.byte(p - 1);
                let run = (0..max_len).take_while(|&i| self.byte(p + i) == prev).count();
                (run, 1)
            }
            _ => self.chain_search(p, max_len, shorter_than)?,
        };
        if len < MIN_MATCH || len <= shorter_than {
            return None;
        }
        if self.strategy == Strategy::Filtered && len <= 5 {
            return None;
        }
        if self.lazy() && len == MIN_MATCH && dist > TOO_FAR {
            return None;
        }
        Some((len, dist))
    }

    fn chain_search(&self, p: usize, max_len: usize, prev_len: usize) -> Option<(usize, usize)> {
        let wmask = self.wsize() - 1;
        let max_dist = self.wsize() - MIN_LOOKAHEAD;
        let lowest = p.saturating_sub(max_dist).max(self.base);
        let nice = self.config.nice.min(max_len);
        let mut chain = if prev_len >= self.config.good {
            self.config.chain >> 2
        } else {
            self.config.chain
        };

        let cur = &self.window[p - self.base..p - self.base + max_len];
        let mut best_len = prev_len.max(MIN_MATCH - 1);
        let mut best_dist = 0;
        let mut cand = self.head[self.hash(p)];
        while cand != 0 && chain > 0 {
            let c = cand - 1;
            if c >= p || c < lowest {
                break;
            }
            let old = &self.window[c - self.base..];
            if old.get(best_len) == cur.get(best_len) {
                let len = cur.iter().zip(old).take_while(|(a, b)| a == b).count();
                if len > best_len {
                    best_len = len;
                    best_dist = p - c;
                    if len >= nice {
                        break;
                    }
                }
            }
            let next = self.prev[c & wmask];
            if next == 0 || next - 1 >= c {
                break;
            }
            cand = next;
            chain -= 1;
        }
        (best_dist > 0).then_some((best_len, best_dist))
    }

    // ── block output ────────────────────────────────────────────────────────

    /// Emit the pending block if there is anything in it.
    fn flush_block(&mut self, last: bool) {
        if !self.tokens.is_empty() || self.pos > self.block_start {
            self.emit_block(last);
        }
    }

    fn emit_block(&mut self, last: bool) {
        let start = self.block_start - self.base;
        let stop = self.pos - self.base;
        let raw_len = stop - start;

        if self.level == 0 {
            self.write_stored(start, stop, last);
        } else {
            let mut lit_freq = [0u32; L_CODES];
            let mut dist_freq = [0u32; D_CODES];
            let mut extra_bits = 0u64;
            for tok in &self.tokens {
                match *tok {
                    Token::Literal(b) => lit_freq[usize::from(b)] += 1,
                    Token::Match { len, dist } => {
                        let li = length_index(usize::from(len));
                        let di = dist_index(usize::from(dist));
                        lit_freq[257 + li] += 1;
                        dist_freq[di] += 1;
                        extra_bits += u64::from(LENGTH_EXTRA[li]) + u64::from(DIST_EXTRA[di]);
                    }
                }
            }
            lit_freq[usize::from(END_BLOCK)] += 1;

            let dyn_lit = HuffmanEncoder::from_frequencies(&lit_freq, MAX_BITS as u8);
            let dyn_dist = HuffmanEncoder::from_frequencies(&dist_freq, MAX_BITS as u8);
            let trees = TreeHeader::new(&dyn_lit.lengths, &dyn_dist.lengths);

            let dyn_bits = 3 + trees.bits + dyn_lit.cost(&lit_freq) + dyn_dist.cost(&dist_freq) + extra_bits;
            let fixed_bits = 3 + self.fixed_lit.cost(&lit_freq) + self.fixed_dist.cost(&dist_freq) + extra_bits;
            let mut opt_bytes = (dyn_bits + 7) / 8;
            let fixed_bytes = (fixed_bits + 7) / 8;
            if fixed_bytes <= opt_bytes || self.strategy == Strategy::Fixed {
                opt_bytes = fixed_bytes;
            }
            let stored_chunks = raw_len.div_ceil(MAX_STORED).max(1) as u64;

            if raw_len as u64 + 4 * stored_chunks <= opt_bytes {
                self.write_stored(start, stop, last);
            } else if fixed_bytes == opt_bytes {
                self.writer.write_bits((STATIC_TREES << 1) | u32::from(last), 3);
                let (lit, dist) = (self.fixed_lit.clone(), self.fixed_dist.clone());
                self.write_tokens(&lit, &dist);
            } else {
                self.writer.write_bits((DYN_TREES << 1) | u32::from(last), 3);
                trees.write(&mut self.writer);
                self.write_tokens(&dyn_lit, &dyn_dist);
            }
        }

        self.tokens.clear();
        self.block_start = self.pos;
    }

    fn write_stored(&mut self, start: usize, stop: usize, last: bool) {
        let mut at = start;
        loop {
            let n = (stop - at).min(MAX_STORED);
            let final_chunk = at + n == stop;
            self.writer
                .write_bits((STORED_BLOCK << 1) | u32::from(last && final_chunk), 3);
            self.writer.align();
            let len = n as u16;
            self.writer.write_bytes(&len.to_le_bytes());
            self.writer.write_bytes(&(!len).to_le_bytes());
            self.writer.write_bytes(&self.window[at..at + n]);
            at += n;
            if final_chunk {
                break;
            }
        }
    }

    fn write_tokens(&mut self, lit: &HuffmanEncoder, dist: &HuffmanEncoder) {
        let w = &mut self.writer;
        for tok in &self.tokens {
            match *tok {
                Token::Literal(b) => lit.write(w, usize::from(b)),
                Token::Match { len, dist: d } => {
                    let len = usize::from(len);
                    let li = length_index(len);
                    lit.write(w, 257 + li);
                    w.write_bits((len - usize::from(LENGTH_BASE[li])) as u32, u32::from(LENGTH_EXTRA[li]));
                    let d = usize::from(d);
                    let di = dist_index(d);
                    dist.write(w, di);
                    w.write_bits(
                        (d - usize::from(DIST_BASE[di])) as u32,
                        u32::from(DIST_EXTRA[di]),
                    );
                }
            }
        }
        lit.write(w, usize::from(END_BLOCK));
    }
}

/// Run-length coded code lengths of a dynamic block.
struct TreeHeader {
    hlit: usize,
    hdist: usize,
    hclen: usize,
    cl: HuffmanEncoder,
    /// (code-length symbol, extra-bit value)
    ops: Vec<(u8, u8)>,
    bits: u64,
}

impl TreeHeader {
    fn new(lit_lengths: &[u8], dist_lengths: &[u8]) -> Self {
        let hlit = lit_lengths.iter().rposition(|&l| l != 0).map_or(0, |i| i + 1).max(257);
        let hdist = dist_lengths.iter().rposition(|&l| l != 0).map_or(0, |i| i + 1).max(1);
        let mut all = lit_lengths[..hlit].to_vec();
        all.extend_from_slice(&dist_lengths[..hdist]);
        let ops = run_length(&all);

        let mut cl_freq = [0u32; CL_CODES];
        for &(sym, _) in &ops {
            cl_freq[usize::from(sym)] += 1;
        }
        let cl = HuffmanEncoder::from_frequencies(&cl_freq, MAX_CL_BITS as u8);
        let hclen = CL_ORDER
            .iter()
            .rposition(|&s| cl.lengths[s] != 0)
            .map_or(0, |i| i + 1)
            .max(4);
        let bits = 14
            + 3 * hclen as u64
            + ops
                .iter()
                .map(|&(sym, _)| u64::from(cl.lengths[usize::from(sym)]) + cl_extra_bits(sym) as u64)
                .sum::<u64>();
        Self {
            hlit,
            hdist,
            hclen,
            cl,
            ops,
            bits,
        }
    }

    fn write(&self, w: &mut BitWriter) {
        w.write_bits((self.hlit - 257) as u32, 5);
        w.write_bits((self.hdist - 1) as u32, 5);
        w.write_bits((self.hclen - 4) as u32, 4);
        for &s in CL_ORDER.iter().take(self.hclen) {
            w.write_bits(u32::from(self.cl.lengths[s]), 3);
        }
        for &(sym, extra) in &self.ops {
            self.cl.write(w, usize::from(sym));
            w.write_bits(u32::from(extra), cl_extra_bits(sym));
        }
    }
}

fn cl_extra_bits(sym: u8) -> u32 {
    match sym {
        16 => 2,
        17 => 3,
        18 => 7,
        _ => 0,
    }
}

fn run_length(lengths: &[u8]) -> Vec<(u8, u8)> {
    let mut ops = Vec::new();
    let mut i = 0;
    while i < lengths.len() {
        let v = lengths[i];
        let run = lengths[i..].iter().take_while(|&&l| l == v).count();
        if v == 0 {
            let mut r = run;
            while r >= 11 {
                let k = r.min(138);
                ops.push((18, (k - 11) as u8));
                r -= k;
            }
            if r >= 3 {
                ops.push((17, (r - 3) as u8));
                r = 0;
            }
            ops.extend(std::iter::repeat((0, 0)).take(r));
        } else {
            ops.push((v, 0));
            let mut r = run - 1;
            while r >= 3 {
                let k = r.min(6);
                ops.push((16, (k - 3) as u8));
                r -= k;
            }
            ops.extend(std::iter::repeat((v, 0)).take(r));
        }
        i += run;
    }
    ops
}
