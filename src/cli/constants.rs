// cli/constants.rs: program identity and display infrastructure.
//
// The display level itself lives in `io::prefs::DISPLAY_LEVEL` so the file
// pipeline and the CLI agree on one value; this module only wraps it.

use std::sync::atomic::Ordering;

use crate::io::prefs::DISPLAY_LEVEL;

// ── Identity ──────────────────────────────────────────────────────────────────
pub const COMPRESSOR_NAME: &str = "zlibr";
/// Invoked under this name the binary decompresses.
pub const UNZLIBR: &str = "unzlibr";
/// Invoked under this name the binary decompresses to stdout.
pub const ZLIBRCAT: &str = "zlibrcat";

/// Environment variable overriding the default compression level.
pub const ENV_CLEVEL: &str = "ZLIBR_CLEVEL";
/// Environment variable holding a tracing filter directive.
pub const ENV_LOG: &str = "ZLIBR_LOG";

// ── Display level ─────────────────────────────────────────────────────────────
//
// 0 = no output; 1 = errors only; 2 = results and warnings (default);
// 3 = per-file progress; 4 = verbose.

#[inline]
pub fn display_level() -> i32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

#[inline]
pub fn set_display_level(level: i32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

// ── Display helpers ───────────────────────────────────────────────────────────

/// Print to stdout.
#[macro_export]
macro_rules! displayout {
    ($($arg:tt)*) => { print!($($arg)*) };
}

/// Print to stderr.
#[macro_export]
macro_rules! display {
    ($($arg:tt)*) => { eprint!($($arg)*) };
}

/// Print to stderr when the display level is at least `level`.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::cli::constants::display_level() >= $level {
            eprint!($($arg)*);
        }
    };
}
