// prefs.rs: file I/O preferences and the shared notification level.
//
// `Prefs` is a plain value type built once by the CLI and shared (by
// reference) across every file of an invocation, including the rayon workers
// of `compress_multiple_filenames`.

use std::sync::atomic::{AtomicI32, Ordering};

use crate::backend::Backend;
use crate::config::{DEF_BUF_SIZE, DEF_MEM_LEVEL, MAX_WBITS};
use crate::engine::CompressOptions;
use crate::types::{Framing, Strategy, DEFLATED};

// ---------------------------------------------------------------------------
// File extensions
// ---------------------------------------------------------------------------
pub const GZIP_EXTENSION: &str = ".gz";
pub const ZLIB_EXTENSION: &str = ".zz";
pub const RAW_EXTENSION: &str = ".deflate";

/// Every suffix stripped when decompressing with auto-detected framing.
pub const KNOWN_EXTENSIONS: [&str; 2] = [GZIP_EXTENSION, ZLIB_EXTENSION];

// ---------------------------------------------------------------------------
// Display / notification globals
// ---------------------------------------------------------------------------

/// Global notification level. 0 = silent, 1 = errors only, 2 = results +
/// warnings, 3 = per-file progress, 4+ = verbose.
pub static DISPLAY_LEVEL: AtomicI32 = AtomicI32::new(2);

/// Write `msg` to stderr if the current notification level is ≥ `level`.
#[inline]
pub fn display_level(level: i32, msg: &str) {
    if DISPLAY_LEVEL.load(Ordering::Relaxed) >= level {
        eprint!("{}", msg);
    }
}

/// Set the notification level and return it.
pub fn set_notification_level(level: i32) -> i32 {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
    level
}

// ---------------------------------------------------------------------------
// Prefs
// ---------------------------------------------------------------------------

/// Preferences applied to every file of one invocation.
#[derive(Debug, Clone)]
pub struct Prefs {
    /// DEFLATE implementation used for every stream.
    pub backend: Backend,
    /// Container format. `Auto` writes gzip and accepts gzip or zlib.
    pub framing: Framing,
    /// Window size exponent (9..=15).
    pub window_log: u8,
    pub strategy: Strategy,
    pub mem_level: i32,
    /// Preset dictionary for zlib and raw streams.
    pub dictionary: Option<Vec<u8>>,
    /// Replace existing destination files.
    pub overwrite: bool,
    /// Delete the source once its output is complete.
    pub remove_src_file: bool,
    /// Decode and verify without writing anything.
    pub test_mode: bool,
    /// Copy access and modification times from source to destination.
    pub preserve_times: bool,
    /// Read size for the streaming loops, also the per-call output cap
    /// while decompressing.
    pub buffer_size: usize,
}

impl Default for Prefs {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            framing: Framing::Auto,
            window_log: MAX_WBITS as u8,
            strategy: Strategy::Default,
            mem_level: DEF_MEM_LEVEL,
            dictionary: None,
            overwrite: false,
            remove_src_file: false,
            test_mode: false,
            preserve_times: true,
            buffer_size: 4 * DEF_BUF_SIZE,
        }
    }
}

impl Prefs {
    /// `windowBits` for a compressor.
    pub fn compress_wbits(&self) -> i32 {
        let log = i32::from(self.window_log);
        match self.framing {
            Framing::Raw => -log,
            Framing::Zlib => log,
            Framing::Gzip | Framing::Auto => log + 16,
        }
    }

    /// `windowBits` for a decompressor.
    pub fn decompress_wbits(&self) -> i32 {
        let log = i32::from(self.window_log);
        match self.framing {
            Framing::Raw => -log,
            Framing::Zlib => log,
            Framing::Gzip => log + 16,
            Framing::Auto => log + 32,
        }
    }

    pub fn compress_options(&self, level: i32) -> CompressOptions {
        let options = CompressOptions::default()
            .level(level)
            .method(DEFLATED)
            .wbits(self.compress_wbits())
            .mem_level(self.mem_level)
            .strategy(self.strategy.code());
        match &self.dictionary {
            Some(dict) => options.zdict(dict.clone()),
            None => options,
        }
    }

    /// Suffix appended to compressed files.
    pub fn extension(&self) -> &'static str {
        extension_for(self.framing)
    }

    /// Dictionary handed to decompressors. Gzip streams never carry one.
    pub fn decompress_dictionary(&self) -> Option<&[u8]> {
        match self.framing {
            Framing::Gzip => None,
            _ => self.dictionary.as_deref(),
        }
    }
}

pub fn extension_for(framing: Framing) -> &'static str {
    match framing {
        Framing::Gzip | Framing::Auto => GZIP_EXTENSION,
        Framing::Zlib => ZLIB_EXTENSION,
        Framing::Raw => RAW_EXTENSION,
    }
}
