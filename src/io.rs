//! File-level compression and decompression for the `zlibr` tool.
//!
//! This module assembles the file pipeline: preferences, source/destination
//! handling, the streaming compress and decompress loops, and recursive file
//! list expansion. The CLI only talks to the re-exports below.

pub mod compress_file;
pub mod decompress_file;
pub mod file_io;
pub mod file_list;
pub mod prefs;

pub use prefs::{extension_for, set_notification_level, Prefs};

// ── Special I/O sentinels ────────────────────────────────────────────────────
pub use file_io::{NUL_MARK, STDIN_MARK, STDOUT_MARK};

// ── Compression ──────────────────────────────────────────────────────────────
pub use compress_file::{compress_filename, compress_multiple_filenames, compress_stream, CompressStats};

// ── Decompression ────────────────────────────────────────────────────────────
pub use decompress_file::{
    decompress_filename, decompress_multiple_filenames, decompress_stream, strip_extension,
    DecompressStats,
};

pub use file_list::create_file_list;
