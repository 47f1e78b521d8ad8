//! File decompression.
//!
//! [`decompress_stream`] feeds a reader through a [`DecompressionEngine`] with
//! the output of every call capped at `prefs.buffer_size`, so memory stays
//! bounded however well the input compresses. Concatenated gzip members are
//! decoded one after another; anything else after the end of a stream is
//! reported as trailing garbage and skipped.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use rayon::prelude::*;

use crate::engine::DecompressionEngine;
use crate::error::{CompressionError, Operation};
use crate::gzip::GZIP_MAGIC;
use crate::io::file_io::{
    copy_file_times, discard_dst_file, open_dst_file, open_src_file, STDIN_MARK, STDOUT_MARK,
};
use crate::io::prefs::{display_level, Prefs, KNOWN_EXTENSIONS};
use crate::types::Framing;

/// Byte counts from a successful decompression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecompressStats {
    /// Compressed bytes read, trailing garbage included.
    pub bytes_in: u64,
    /// Decompressed bytes written.
    pub bytes_out: u64,
    /// Streams decoded (gzip members).
    pub members: u32,
    /// Bytes after the last stream that were ignored.
    pub trailing: u64,
}

enum Member {
    Active(Box<DecompressionEngine>),
    /// Between streams: bytes collected until the next header can be told
    /// from garbage.
    Between(Vec<u8>),
    Trailing,
}

struct MemberDecoder<'p> {
    prefs: &'p Prefs,
    state: Member,
    stats: DecompressStats,
    cap: usize,
}

fn open_engine(prefs: &Prefs) -> Result<Box<DecompressionEngine>, CompressionError> {
    DecompressionEngine::with_backend(prefs.backend, prefs.decompress_wbits(), prefs.decompress_dictionary())
        .map(Box::new)
}

impl<'p> MemberDecoder<'p> {
    fn new(prefs: &'p Prefs) -> io::Result<Self> {
        Ok(Self {
            prefs,
            state: Member::Active(open_engine(prefs)?),
            stats: DecompressStats {
                members: 1,
                ..DecompressStats::default()
            },
            cap: prefs.buffer_size.max(1),
        })
    }

    fn push<W: Write + ?Sized>(&mut self, mut data: Vec<u8>, out: &mut W) -> io::Result<()> {
        let multi_member = matches!(self.prefs.framing, Framing::Gzip | Framing::Auto);
        let cap = i64::try_from(self.cap).unwrap_or(i64::MAX);
        loop {
            match &mut self.state {
                Member::Trailing => {
                    self.stats.trailing += data.len() as u64;
                    return Ok(());
                }
                Member::Between(pending) => {
                    pending.extend_from_slice(&data);
                    if pending.len() < GZIP_MAGIC.len() {
                        return Ok(());
                    }
                    data = std::mem::take(pending);
                    if multi_member && data.starts_with(&GZIP_MAGIC) {
                        self.state = Member::Active(open_engine(self.prefs)?);
                        self.stats.members += 1;
                    } else {
                        self.state = Member::Trailing;
                    }
                }
                Member::Active(engine) => {
                    let mut input = data;
                    loop {
                        let chunk = engine.decompress(&input, cap)?;
                        self.stats.bytes_out += chunk.len() as u64;
                        out.write_all(&chunk)?;
                        if engine.eof() {
                            data = engine.unused_data().to_vec();
                            self.state = Member::Between(Vec::new());
                            break;
                        }
                        if engine.unconsumed_tail().is_empty() && chunk.len() < self.cap {
                            return Ok(());
                        }
                        input = engine.unconsumed_tail().to_vec();
                    }
                }
            }
        }
    }

    fn finish<W: Write + ?Sized>(mut self, out: &mut W) -> io::Result<DecompressStats> {
        match &mut self.state {
            Member::Active(engine) => {
                // Write what the partial stream still yields before failing.
                let rest = engine.flush(i64::try_from(self.cap).unwrap_or(i64::MAX))?;
                self.stats.bytes_out += rest.len() as u64;
                out.write_all(&rest)?;
                out.flush()?;
                return Err(CompressionError::truncated(Operation::Decompressing).into());
            }
            Member::Between(pending) => self.stats.trailing += pending.len() as u64,
            Member::Trailing => {}
        }
        if self.stats.trailing > 0 {
            display_level(2, &format!("zlibr: warning: {} bytes of trailing garbage ignored\n", self.stats.trailing));
        }
        out.flush()?;
        Ok(self.stats)
    }
}

/// Decompress everything `reader` yields into `writer`.
pub fn decompress_stream<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    prefs: &Prefs,
) -> io::Result<DecompressStats> {
    let mut decoder = MemberDecoder::new(prefs)?;
    let mut buf = vec![0u8; prefs.buffer_size.max(1)];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        decoder.stats.bytes_in += n as u64;
        decoder.push(buf[..n].to_vec(), writer)?;
    }
    let stats = decoder.finish(writer)?;
    tracing::debug!(
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        members = stats.members,
        "stream decompressed"
    );
    Ok(stats)
}

/// Output name for `src`: the name with its compression suffix removed.
///
/// With `Framing::Auto` any known suffix is accepted. Returns `None` when
/// `src` does not carry a matching suffix.
pub fn strip_extension(src: &str, prefs: &Prefs) -> Option<String> {
    let own = [prefs.extension()];
    let candidates: &[&str] = match prefs.framing {
        Framing::Auto => &KNOWN_EXTENSIONS,
        _ => &own,
    };
    candidates
        .iter()
        .find_map(|ext| src.strip_suffix(ext))
        .filter(|stem| !stem.is_empty() && !stem.ends_with(std::path::MAIN_SEPARATOR))
        .map(str::to_owned)
}

/// Decompress `src` into `dst`. Either may be a stdin/stdout sentinel.
pub fn decompress_filename(src: &str, dst: &str, prefs: &Prefs) -> io::Result<DecompressStats> {
    let mut reader = open_src_file(src)?;
    let mut writer = open_dst_file(dst, prefs)?;
    let regular = writer.is_regular();
    let stats = match decompress_stream(&mut reader, &mut writer, prefs) {
        Ok(stats) => stats,
        Err(err) => {
            drop(writer);
            if regular {
                discard_dst_file(dst);
            }
            return Err(err);
        }
    };
    drop(writer);

    if src != STDIN_MARK && !prefs.test_mode {
        if regular && prefs.preserve_times {
            if let Err(err) = copy_file_times(Path::new(src), Path::new(dst)) {
                display_level(2, &format!("Warning: could not copy times to {dst}: {err}\n"));
            }
        }
        if prefs.remove_src_file && dst != STDOUT_MARK {
            fs::remove_file(src)?;
        }
    }

    if prefs.test_mode {
        display_level(2, &format!("{src}: OK\n"));
    } else {
        display_level(
            2,
            &format!("{:<20}: decoded {} bytes\n", src, stats.bytes_out),
        );
    }
    Ok(stats)
}

/// Decompress each of `srcs`, writing next to it with the suffix removed
/// (or onto stdout when `to_stdout` is set). Returns the number of files
/// that failed or were skipped.
pub fn decompress_multiple_filenames(srcs: &[String], to_stdout: bool, prefs: &Prefs) -> io::Result<usize> {
    let run = |src: &String| -> bool {
        let dst = if to_stdout {
            STDOUT_MARK.to_owned()
        } else if prefs.test_mode {
            String::new()
        } else {
            match strip_extension(src, prefs) {
                Some(dst) => dst,
                None => {
                    display_level(1, &format!("zlibr: {src}: unknown suffix -- ignored\n"));
                    return true;
                }
            }
        };
        match decompress_filename(src, &dst, prefs) {
            Ok(_) => false,
            Err(err) => {
                display_level(1, &format!("zlibr: {src}: {err}\n"));
                tracing::debug!(src = src.as_str(), %err, "decompression failed");
                true
            }
        }
    };

    let missed = if to_stdout {
        srcs.iter().filter(|src| run(src)).count()
    } else {
        srcs.par_iter().filter(|src| run(src)).count()
    };
    Ok(missed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::oneshot;
    use tempfile::TempDir;

    fn managed(framing: Framing) -> Prefs {
        Prefs {
            backend: Backend::Managed,
            framing,
            buffer_size: 512,
            ..Prefs::default()
        }
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        oneshot::compress_with_backend(Backend::Managed, data, 6, 31).unwrap()
    }

    #[test]
    fn output_is_capped_per_call() {
        let data = vec![b'z'; 100_000];
        let packed = gzip(&data);
        let mut out = Vec::new();
        let stats = decompress_stream(&mut &packed[..], &mut out, &managed(Framing::Auto)).unwrap();
        assert_eq!(out, data);
        assert_eq!(stats.bytes_out, 100_000);
        assert_eq!(stats.bytes_in, packed.len() as u64);
        assert_eq!(stats.members, 1);
    }

    #[test]
    fn concatenated_members() {
        let mut packed = gzip(b"first member, ");
        packed.extend(gzip(b"second member"));
        let mut out = Vec::new();
        let stats = decompress_stream(&mut &packed[..], &mut out, &managed(Framing::Gzip)).unwrap();
        assert_eq!(out, b"first member, second member");
        assert_eq!(stats.members, 2);
        assert_eq!(stats.trailing, 0);
    }

    #[test]
    fn trailing_garbage_is_skipped() {
        let mut packed = gzip(b"payload");
        packed.extend_from_slice(b"not a member");
        let mut out = Vec::new();
        let stats = decompress_stream(&mut &packed[..], &mut out, &managed(Framing::Auto)).unwrap();
        assert_eq!(out, b"payload");
        assert_eq!(stats.trailing, 12);
    }

    #[test]
    fn zlib_streams_are_not_chained() {
        let mut packed = oneshot::compress_with_backend(Backend::Managed, b"zlib", 6, 15).unwrap();
        packed.extend(gzip(b"ignored"));
        let mut out = Vec::new();
        let stats = decompress_stream(&mut &packed[..], &mut out, &managed(Framing::Zlib)).unwrap();
        assert_eq!(out, b"zlib");
        assert_eq!(stats.members, 1);
        assert!(stats.trailing > 0);
    }

    #[test]
    fn truncated_input_fails() {
        let packed = gzip(&b"cut short ".repeat(100));
        let mut out = Vec::new();
        let err = decompress_stream(&mut &packed[..packed.len() - 4], &mut out, &managed(Framing::Auto))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("incomplete or truncated stream"));
    }

    #[test]
    fn empty_input_is_truncated() {
        let mut out = Vec::new();
        let err = decompress_stream(&mut &b""[..], &mut out, &managed(Framing::Auto)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn corrupt_input_is_invalid_data() {
        let mut out = Vec::new();
        let err = decompress_stream(&mut &b"\x1f\x8b\x09garbage-garbage"[..], &mut out, &managed(Framing::Auto))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn raw_streams_with_dictionary() {
        let dict = b"shared dictionary words".to_vec();
        let prefs = Prefs {
            dictionary: Some(dict.clone()),
            ..managed(Framing::Raw)
        };
        let mut packed = Vec::new();
        crate::io::compress_stream(&mut &b"shared dictionary words again"[..], &mut packed, 6, &prefs).unwrap();
        let mut out = Vec::new();
        decompress_stream(&mut &packed[..], &mut out, &prefs).unwrap();
        assert_eq!(out, b"shared dictionary words again");
    }

    #[test]
    fn suffix_stripping() {
        let auto = managed(Framing::Auto);
        assert_eq!(strip_extension("a.txt.gz", &auto).as_deref(), Some("a.txt"));
        assert_eq!(strip_extension("a.txt.zz", &auto).as_deref(), Some("a.txt"));
        assert_eq!(strip_extension("a.txt", &auto), None);
        assert_eq!(strip_extension(".gz", &auto), None);
        let raw = managed(Framing::Raw);
        assert_eq!(strip_extension("a.deflate", &raw).as_deref(), Some("a"));
        assert_eq!(strip_extension("a.gz", &raw), None);
    }

    #[test]
    fn test_mode_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("t.gz");
        fs::write(&src, gzip(b"verify only")).unwrap();
        let src = src.to_str().unwrap().to_owned();
        let prefs = Prefs {
            test_mode: true,
            ..managed(Framing::Auto)
        };
        assert_eq!(decompress_multiple_filenames(&[src.clone()], false, &prefs).unwrap(), 0);
        assert!(!dir.path().join("t").exists());
        assert!(Path::new(&src).exists());
    }

    #[test]
    fn multiple_files_skip_unknown_suffix() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.gz");
        let odd = dir.path().join("odd.bin");
        fs::write(&good, gzip(b"good")).unwrap();
        fs::write(&odd, gzip(b"odd")).unwrap();
        let srcs = vec![good.to_str().unwrap().to_owned(), odd.to_str().unwrap().to_owned()];

        let missed = decompress_multiple_filenames(&srcs, false, &managed(Framing::Auto)).unwrap();
        assert_eq!(missed, 1);
        assert_eq!(fs::read(dir.path().join("good")).unwrap(), b"good");
    }
}
