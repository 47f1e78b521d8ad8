//! File I/O primitives for the compression pipeline.
//!
//! - [`open_src_file`] resolves a path string to a `Box<dyn Read>`, handling
//!   the `"stdin"` sentinel and rejecting directories.
//! - [`open_dst_file`] resolves a path string to a [`DstFile`], handling the
//!   `"stdout"` and null-device sentinels and enforcing the overwrite policy
//!   from [`Prefs`].
//! - [`copy_file_times`] carries timestamps from source to destination.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use filetime::FileTime;

use crate::io::prefs::{display_level, Prefs};

// ---------------------------------------------------------------------------
// Sentinel strings
// ---------------------------------------------------------------------------

/// Sentinel: read from standard input.
pub const STDIN_MARK: &str = "stdin";

/// Sentinel: write to standard output.
pub const STDOUT_MARK: &str = "stdout";

/// Sentinel: discard output.
#[cfg(windows)]
pub const NUL_MARK: &str = "nul";
#[cfg(not(windows))]
pub const NUL_MARK: &str = "/dev/null";

#[inline]
pub fn is_special(path: &str) -> bool {
    path == STDIN_MARK || path == STDOUT_MARK || path == NUL_MARK
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Open `path` for reading. `"stdin"` yields a locked standard input.
pub fn open_src_file(path: &str) -> io::Result<Box<dyn Read>> {
    if path == STDIN_MARK {
        display_level(4, "Using stdin for input\n");
        return Ok(Box::new(io::stdin().lock()));
    }
    if Path::new(path).is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{path} is a directory -- ignored"),
        ));
    }
    let file = File::open(path).map_err(|e| io::Error::new(e.kind(), format!("{path}: {e}")))?;
    Ok(Box::new(BufReader::new(file)))
}

// ---------------------------------------------------------------------------
// Destination
// ---------------------------------------------------------------------------

/// An open destination.
pub enum DstFile {
    Stdout(io::StdoutLock<'static>),
    /// Output discarded (test mode or the null device).
    Sink(io::Sink),
    /// A regular file created by this invocation.
    File(BufWriter<File>),
}

impl DstFile {
    /// Whether the destination is a regular file this run created, and so
    /// must be cleaned up when the operation fails.
    pub fn is_regular(&self) -> bool {
        matches!(self, DstFile::File(_))
    }
}

impl Write for DstFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            DstFile::Stdout(w) => w.write(buf),
            DstFile::Sink(w) => w.write(buf),
            DstFile::File(w) => w.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            DstFile::Stdout(w) => w.write_all(buf),
            DstFile::Sink(w) => w.write_all(buf),
            DstFile::File(w) => w.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            DstFile::Stdout(w) => w.flush(),
            DstFile::Sink(w) => w.flush(),
            DstFile::File(w) => w.flush(),
        }
    }
}

/// Open `path` for writing.
///
/// Test mode and the null device discard output. An existing regular file is
/// only replaced when `prefs.overwrite` is set.
pub fn open_dst_file(path: &str, prefs: &Prefs) -> io::Result<DstFile> {
    if prefs.test_mode || path == NUL_MARK {
        return Ok(DstFile::Sink(io::sink()));
    }
    if path == STDOUT_MARK {
        display_level(4, "Using stdout for output\n");
        return Ok(DstFile::Stdout(io::stdout().lock()));
    }
    let mut options = OpenOptions::new();
    options.write(true);
    if prefs.overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let file = options.open(path).map_err(|e| match e.kind() {
        io::ErrorKind::AlreadyExists => io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{path} already exists; use -f to overwrite"),
        ),
        kind => io::Error::new(kind, format!("{path}: {e}")),
    })?;
    Ok(DstFile::File(BufWriter::new(file)))
}

/// Remove a partially written destination after a failure.
pub fn discard_dst_file(path: &str) {
    if let Err(err) = fs::remove_file(path) {
        tracing::debug!(path, %err, "could not remove partial output");
    }
}

/// Copy access and modification times from `src` to `dst`.
pub fn copy_file_times(src: &Path, dst: &Path) -> io::Result<()> {
    let meta = fs::metadata(src)?;
    let atime = FileTime::from_last_access_time(&meta);
    let mtime = FileTime::from_last_modification_time(&meta);
    filetime::set_file_times(dst, atime, mtime)
}
