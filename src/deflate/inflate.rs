//! Resumable DEFLATE decoder (RFC 1951) with optional zlib wrapper (RFC 1950).
//!
//! Input is fed in arbitrary pieces. Decoding advances in atomic units (a
//! header, a symbol with its extra bits, a run of stored bytes); a unit whose
//! bits are not all present yet is rolled back and retried on the next call.
//! Output is capped per call; a back-reference cut by the cap is resumed on
//! the next call before anything else is decoded.

use thiserror::Error;

use super::huffman::{Bits, CodeKind, Decoded, HuffmanDecoder};
use super::tables::{
    CL_CODES, CL_ORDER, DIST_BASE, DIST_EXTRA, DYN_TREES, D_CODES, END_BLOCK, FIXED_DIST_LENGTHS,
    FIXED_LIT_LENGTHS, LENGTH_BASE, LENGTH_EXTRA, L_CODES, STATIC_TREES, STORED_BLOCK,
};
use crate::buffer::FrameBuffer;
use crate::checksum::{adler32, Adler32State, ADLER32_INIT};

/// A corrupt stream. Carries zlib's `strm->msg` text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InflateError(pub &'static str);

/// Why a dictionary was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DictionaryRejected {
    /// zlib stream not waiting for a dictionary.
    #[error("stream is not expecting a dictionary")]
    WrongState,
    /// Adler-32 of the dictionary differs from the header's DICTID.
    #[error("dictionary does not match the stream")]
    Mismatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InflateStatus {
    /// Progress was made; more input or output room is needed to go on.
    Ok,
    StreamEnd,
    /// zlib header asks for the dictionary with this Adler-32.
    NeedDict(u32),
}

/// Outcome of one [`Inflater::inflate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InflateProgress {
    /// Bytes of this call's input that were used. The rest is the caller's
    /// to present again (or, after `StreamEnd`, trailing data).
    pub consumed: usize,
    pub produced: usize,
    pub status: InflateStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Header,
    Dict(u32),
    BlockHeader,
    Stored(usize),
    Codes,
    Trailer,
    Done,
    Bad(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Input,
    Output,
    Dict(u32),
    End,
}

/// Decoded history for back-references, bounded by the window size.
#[derive(Debug, Clone)]
struct History {
    buf: Vec<u8>,
    limit: usize,
}

impl History {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
        }
    }

    fn available(&self) -> usize {
        self.buf.len().min(self.limit)
    }

    fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.trim();
    }

    #[inline]
    fn push_byte(&mut self, byte: u8) {
        self.buf.push(byte);
        if self.buf.len() > 2 * self.limit {
            self.trim();
        }
    }

    fn copy(&mut self, dist: usize, len: usize, out: &mut Vec<u8>) {
        for _ in 0..len {
            let b = self.buf[self.buf.len() - dist];
            self.buf.push(b);
            out.push(b);
        }
        self.trim();
    }

    fn trim(&mut self) {
        if self.buf.len() > 2 * self.limit {
            let cut = self.buf.len() - self.limit;
            self.buf.drain(..cut);
        }
    }
}

/// Streaming inflater. `Clone` yields an independent snapshot of the whole
/// decoding state.
#[derive(Debug, Clone)]
pub struct Inflater {
    zlib: bool,
    window_bits: u8,
    mode: Mode,
    last: bool,
    input: FrameBuffer,
    bit_offset: usize,
    lit: HuffmanDecoder,
    dist: HuffmanDecoder,
    pending: Option<(usize, usize)>,
    history: History,
    adler: Adler32State,
    total_out: u64,
}

impl Inflater {
    /// `window_bits` is 9..=15; a zlib header asking for more is rejected.
    pub fn new(zlib: bool, window_bits: u8) -> Self {
        Self {
            zlib,
            window_bits,
            mode: if zlib { Mode::Header } else { Mode::BlockHeader },
            last: false,
            input: FrameBuffer::new(),
            bit_offset: 0,
            lit: HuffmanDecoder::empty(),
            dist: HuffmanDecoder::empty(),
            pending: None,
            history: History::new(1usize << window_bits),
            adler: Adler32State::new(),
            total_out: 0,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.mode == Mode::Done
    }

    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// The DICTID the stream is waiting on, if any.
    pub fn needs_dictionary(&self) -> Option<u32> {
        match self.mode {
            Mode::Dict(id) => Some(id),
            _ => None,
        }
    }

    /// Preload history. Raw streams accept a dictionary at any time; zlib
    /// streams only once the header has asked for it.
    pub fn set_dictionary(&mut self, dict: &[u8]) -> Result<(), DictionaryRejected> {
        match self.mode {
            Mode::Dict(id) => {
                if adler32(dict, ADLER32_INIT) != id {
                    return Err(DictionaryRejected::Mismatch);
                }
                self.mode = Mode::BlockHeader;
            }
            _ if self.zlib => return Err(DictionaryRejected::WrongState),
            _ => {}
        }
        let keep = dict.len().min(self.history.limit);
        self.history.push(&dict[dict.len() - keep..]);
        Ok(())
    }

    /// Decode from `input`, appending at most `limit` bytes to `out`.
    pub fn inflate(
        &mut self,
        input: &[u8],
        out: &mut Vec<u8>,
        limit: usize,
    ) -> Result<InflateProgress, InflateError> {
        if let Mode::Bad(msg) = self.mode {
            return Err(InflateError(msg));
        }
        if self.mode == Mode::Done {
            return Ok(InflateProgress {
                consumed: 0,
                produced: 0,
                status: InflateStatus::StreamEnd,
            });
        }

        self.input.append(input);
        let mut buffered = std::mem::take(&mut self.input);
        let start = out.len();
        let cap = start.saturating_add(limit);
        let mut checked = start;

        let mut bits = Bits::new(buffered.as_slice(), self.bit_offset);
        let outcome = self.run(&mut bits, out, cap, &mut checked);
        let pos = bits.position();

        if self.zlib {
            self.adler.update(&out[checked..]);
        }
        let produced = out.len() - start;
        self.total_out += produced as u64;

        let stop = match outcome {
            Ok(stop) => stop,
            Err(err) => {
                self.mode = Mode::Bad(err.0);
                return Err(err);
            }
        };

        buffered.consume(pos / 8);
        self.bit_offset = pos % 8;
        let unprocessed = buffered.len() - usize::from(self.bit_offset > 0);
        let give_back = match stop {
            Stop::Input => 0,
            Stop::Output | Stop::Dict(_) | Stop::End => unprocessed.min(input.len()),
        };
        buffered.split_off_tail(give_back);
        if stop == Stop::End {
            buffered.clear();
            self.bit_offset = 0;
        }
        self.input = buffered;

        Ok(InflateProgress {
            consumed: input.len() - give_back,
            produced,
            status: match stop {
                Stop::End => InflateStatus::StreamEnd,
                Stop::Dict(id) => InflateStatus::NeedDict(id),
                Stop::Input | Stop::Output => InflateStatus::Ok,
            },
        })
    }

    fn run(
        &mut self,
        bits: &mut Bits<'_>,
        out: &mut Vec<u8>,
        cap: usize,
        checked: &mut usize,
    ) -> Result<Stop, InflateError> {
        loop {
            match self.mode {
                Mode::Header => {
                    let mut t = *bits;
                    let (Some(cmf), Some(flg)) = (t.bits(8), t.bits(8)) else {
                        return Ok(Stop::Input);
                    };
                    if ((cmf << 8) | flg) % 31 != 0 {
                        return Err(InflateError("incorrect header check"));
                    }
                    if cmf & 0x0f != 8 {
                        return Err(InflateError("unknown compression method"));
                    }
                    if (cmf >> 4) + 8 > u32::from(self.window_bits) {
                        return Err(InflateError("invalid window size"));
                    }
                    if flg & 0x20 != 0 {
                        let Some(id) = read_be32(&mut t) else {
                            return Ok(Stop::Input);
                        };
                        self.mode = Mode::Dict(id);
                    } else {
                        self.mode = Mode::BlockHeader;
                    }
                    *bits = t;
                }
                Mode::Dict(id) => return Ok(Stop::Dict(id)),
                Mode::BlockHeader => {
                    if self.last {
                        self.mode = if self.zlib { Mode::Trailer } else { Mode::Done };
                        continue;
                    }
                    let mut t = *bits;
                    let Some(head) = t.bits(3) else {
                        return Ok(Stop::Input);
                    };
                    let mode = match head >> 1 {
                        STORED_BLOCK => {
                            t.align();
                            let (Some(len), Some(nlen)) = (t.bits(16), t.bits(16)) else {
                                return Ok(Stop::Input);
                            };
                            if len != !nlen & 0xffff {
                                return Err(InflateError("invalid stored block lengths"));
                            }
                            Mode::Stored(len as usize)
                        }
                        STATIC_TREES => {
                            self.lit = HuffmanDecoder::new(&FIXED_LIT_LENGTHS, CodeKind::Lengths)
                                .map_err(|_| InflateError("invalid literal/lengths set"))?;
                            self.dist =
                                HuffmanDecoder::new(&FIXED_DIST_LENGTHS, CodeKind::Distances)
                                    .map_err(|_| InflateError("invalid distances set"))?;
                            Mode::Codes
                        }
                        DYN_TREES => {
                            let Some((lit, dist)) = read_dynamic_tables(&mut t)? else {
                                return Ok(Stop::Input);
                            };
                            self.lit = lit;
                            self.dist = dist;
                            Mode::Codes
                        }
                        _ => return Err(InflateError("invalid block type")),
                    };
                    self.last = head & 1 == 1;
                    self.mode = mode;
                    *bits = t;
                }
                Mode::Stored(0) => self.mode = Mode::BlockHeader,
                Mode::Stored(remaining) => {
                    if out.len() >= cap {
                        return Ok(Stop::Output);
                    }
                    let avail = bits.aligned_bytes();
                    if avail.is_empty() {
                        return Ok(Stop::Input);
                    }
                    let n = remaining.min(avail.len()).min(cap - out.len());
                    out.extend_from_slice(&avail[..n]);
                    self.history.push(&avail[..n]);
                    bits.skip((n * 8) as u32);
                    self.mode = Mode::Stored(remaining - n);
                }
                Mode::Codes => {
                    if let Some(stop) = self.decode_codes(bits, out, cap)? {
                        return Ok(stop);
                    }
                }
                Mode::Trailer => {
                    self.adler.update(&out[*checked..]);
                    *checked = out.len();
                    let mut t = *bits;
                    t.align();
                    let Some(expected) = read_be32(&mut t) else {
                        return Ok(Stop::Input);
                    };
                    if expected != self.adler.value() {
                        return Err(InflateError("incorrect data check"));
                    }
                    *bits = t;
                    self.mode = Mode::Done;
                }
                Mode::Done => return Ok(Stop::End),
                Mode::Bad(msg) => return Err(InflateError(msg)),
            }
        }
    }

    /// Decode symbols until end of block (`None`) or a stop condition.
    fn decode_codes(
        &mut self,
        bits: &mut Bits<'_>,
        out: &mut Vec<u8>,
        cap: usize,
    ) -> Result<Option<Stop>, InflateError> {
        loop {
            if let Some((len, dist)) = self.pending.take() {
                let n = len.min(cap.saturating_sub(out.len()));
                self.history.copy(dist, n, out);
                if n < len {
                    self.pending = Some((len - n, dist));
                    return Ok(Some(Stop::Output));
                }
            }

            let mut t = *bits;
            let sym = match self.lit.decode(&mut t) {
                Decoded::Symbol(sym) => sym,
                Decoded::NeedMore => return Ok(Some(Stop::Input)),
                Decoded::Invalid => return Err(InflateError("invalid literal/length code")),
            };
            if sym == END_BLOCK {
                *bits = t;
                self.mode = Mode::BlockHeader;
                return Ok(None);
            }
            // End-of-block is taken even with a full buffer; anything that
            // produces output waits.
            if out.len() >= cap {
                return Ok(Some(Stop::Output));
            }
            if sym < 256 {
                *bits = t;
                out.push(sym as u8);
                self.history.push_byte(sym as u8);
                continue;
            }

            let idx = usize::from(sym - 257);
            if idx >= LENGTH_BASE.len() {
                return Err(InflateError("invalid literal/length code"));
            }
            let Some(extra) = t.bits(u32::from(LENGTH_EXTRA[idx])) else {
                return Ok(Some(Stop::Input));
            };
            let len = usize::from(LENGTH_BASE[idx]) + extra as usize;

            let dsym = match self.dist.decode(&mut t) {
                Decoded::Symbol(sym) => usize::from(sym),
                Decoded::NeedMore => return Ok(Some(Stop::Input)),
                Decoded::Invalid => return Err(InflateError("invalid distance code")),
            };
            if dsym >= D_CODES {
                return Err(InflateError("invalid distance code"));
            }
            let Some(dextra) = t.bits(u32::from(DIST_EXTRA[dsym])) else {
                return Ok(Some(Stop::Input));
            };
            let dist = usize::from(DIST_BASE[dsym]) + dextra as usize;
            if dist > self.history.available() {
                return Err(InflateError("invalid distance too far back"));
            }
            *bits = t;
            self.pending = Some((len, dist));
        }
    }
}

fn read_be32(t: &mut Bits<'_>) -> Option<u32> {
    let mut v = 0u32;
    for _ in 0..4 {
        v = (v << 8) | t.bits(8)?;
    }
    Some(v)
}

/// Read a dynamic block's code tables. `Ok(None)` when the header is cut short.
fn read_dynamic_tables(
    t: &mut Bits<'_>,
) -> Result<Option<(HuffmanDecoder, HuffmanDecoder)>, InflateError> {
    let (Some(hlit), Some(hdist), Some(hclen)) = (t.bits(5), t.bits(5), t.bits(4)) else {
        return Ok(None);
    };
    let nlen = hlit as usize + 257;
    let ndist = hdist as usize + 1;
    let ncode = hclen as usize + 4;
    if nlen > L_CODES || ndist > D_CODES {
        return Err(InflateError("too many length or distance symbols"));
    }

    let mut cl = [0u8; CL_CODES];
    for &slot in CL_ORDER.iter().take(ncode) {
        let Some(v) = t.bits(3) else { return Ok(None) };
        cl[slot] = v as u8;
    }
    let cl_decoder = HuffmanDecoder::new(&cl, CodeKind::CodeLengths)
        .map_err(|_| InflateError("invalid code lengths set"))?;

    let total = nlen + ndist;
    let mut lengths = vec![0u8; total];
    let mut i = 0;
    while i < total {
        let sym = match cl_decoder.decode(t) {
            Decoded::Symbol(sym) => sym,
            Decoded::NeedMore => return Ok(None),
            Decoded::Invalid => return Err(InflateError("invalid code lengths set")),
        };
        let (value, repeat) = match sym {
            0..=15 => (sym as u8, 1),
            16 => {
                if i == 0 {
                    return Err(InflateError("invalid bit length repeat"));
                }
                let Some(r) = t.bits(2) else { return Ok(None) };
                (lengths[i - 1], 3 + r as usize)
            }
            17 => {
                let Some(r) = t.bits(3) else { return Ok(None) };
                (0, 3 + r as usize)
            }
            _ => {
                let Some(r) = t.bits(7) else { return Ok(None) };
                (0, 11 + r as usize)
            }
        };
        if i + repeat > total {
            return Err(InflateError("invalid bit length repeat"));
        }
        lengths[i..i + repeat].fill(value);
        i += repeat;
    }

    if lengths[usize::from(END_BLOCK)] == 0 {
        return Err(InflateError("invalid code -- missing end-of-block"));
    }
    let lit = HuffmanDecoder::new(&lengths[..nlen], CodeKind::Lengths)
        .map_err(|_| InflateError("invalid literal/lengths set"))?;
    let dist = HuffmanDecoder::new(&lengths[nlen..], CodeKind::Distances)
        .map_err(|_| InflateError("invalid distances set"))?;
    Ok(Some((lit, dist)))
}
