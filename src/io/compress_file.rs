//! File compression.
//!
//! - [`compress_stream`] drives one [`CompressionEngine`] from a reader into
//!   a writer.
//! - [`compress_filename`] compresses one file end to end: open, stream,
//!   copy timestamps, optionally remove the source.
//! - [`compress_multiple_filenames`] compresses a batch with a shared suffix.
//!   Separate output files are produced in parallel on the rayon pool;
//!   output to stdout is written sequentially so members do not interleave.

use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use rayon::prelude::*;

use crate::engine::CompressionEngine;
use crate::io::file_io::{
    copy_file_times, discard_dst_file, open_dst_file, open_src_file, STDIN_MARK, STDOUT_MARK,
};
use crate::io::prefs::{display_level, Prefs};

/// Byte counts from a successful compression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressStats {
    /// Uncompressed bytes read.
    pub bytes_in: u64,
    /// Compressed bytes written.
    pub bytes_out: u64,
}

impl CompressStats {
    /// Output size as a percentage of the input (100 for empty input).
    pub fn ratio(&self) -> f64 {
        if self.bytes_in == 0 {
            100.0
        } else {
            self.bytes_out as f64 / self.bytes_in as f64 * 100.0
        }
    }
}

/// Compress everything `reader` yields into `writer` as one stream.
pub fn compress_stream<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
    level: i32,
    prefs: &Prefs,
) -> io::Result<CompressStats> {
    let mut engine = CompressionEngine::with_backend(prefs.backend, &prefs.compress_options(level))?;
    let mut stats = CompressStats::default();
    let mut buf = vec![0u8; prefs.buffer_size.max(1)];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        stats.bytes_in += n as u64;
        let out = engine.compress(&buf[..n])?;
        stats.bytes_out += out.len() as u64;
        writer.write_all(&out)?;
    }
    let out = engine.finish()?;
    stats.bytes_out += out.len() as u64;
    writer.write_all(&out)?;
    writer.flush()?;
    tracing::debug!(
        backend = %engine.backend(),
        bytes_in = stats.bytes_in,
        bytes_out = stats.bytes_out,
        "stream compressed"
    );
    Ok(stats)
}

/// Compress `src` into `dst`. Either may be a stdin/stdout sentinel.
///
/// A failed run removes the partial destination. On success the source's
/// timestamps are copied over (when `prefs.preserve_times`) and the source is
/// deleted when `prefs.remove_src_file` is set.
pub fn compress_filename(src: &str, dst: &str, level: i32, prefs: &Prefs) -> io::Result<CompressStats> {
    let mut reader = open_src_file(src)?;
    let mut writer = open_dst_file(dst, prefs)?;
    let regular = writer.is_regular();
    let stats = match compress_stream(&mut reader, &mut writer, level, prefs) {
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

    if regular && src != STDIN_MARK {
        if prefs.preserve_times {
            if let Err(err) = copy_file_times(Path::new(src), Path::new(dst)) {
                display_level(2, &format!("Warning: could not copy times to {dst}: {err}\n"));
            }
        }
        if prefs.remove_src_file && !prefs.test_mode {
            fs::remove_file(src)?;
        }
    }

    display_level(
        2,
        &format!(
            "{:<20}: {} -> {} bytes ({:.2}%)\n",
            src,
            stats.bytes_in,
            stats.bytes_out,
            stats.ratio()
        ),
    );
    Ok(stats)
}

/// Compress each of `srcs` into `src + suffix`, or onto stdout when `suffix`
/// is [`STDOUT_MARK`]. Returns the number of files that failed.
pub fn compress_multiple_filenames(srcs: &[String], suffix: &str, level: i32, prefs: &Prefs) -> io::Result<usize> {
    let report = |src: &str, err: io::Error| {
        display_level(1, &format!("zlibr: {src}: {err}\n"));
        tracing::debug!(src, %err, "compression failed");
    };

    if suffix == STDOUT_MARK {
        let mut missed = 0;
        for src in srcs {
            if let Err(err) = compress_filename(src, STDOUT_MARK, level, prefs) {
                report(src, err);
                missed += 1;
            }
        }
        return Ok(missed);
    }

    let missed = srcs
        .par_iter()
        .filter(|src| {
            let dst = format!("{src}{suffix}");
            match compress_filename(src, &dst, level, prefs) {
                Ok(_) => false,
                Err(err) => {
                    report(src, err);
                    true
                }
            }
        })
        .count();
    Ok(missed)
}
