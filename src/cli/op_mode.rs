//! Operation mode selection and startup defaults for the CLI.
//!
//! - [`OpMode`] says what the CLI should do with its inputs.
//! - [`determine_op_mode`] infers the mode from a filename's extension.
//! - [`detect_alias`] infers the mode from the name the binary was run as.
//! - [`init_c_level`] reads the default level from `ZLIBR_CLEVEL`.

use std::path::Path;

use crate::cli::constants::{display_level, ENV_CLEVEL, UNZLIBR, ZLIBRCAT};
use crate::io::prefs::KNOWN_EXTENSIONS;
use crate::types::DEFAULT_LEVEL;

/// Level used when neither the command line nor the environment picks one.
pub const ZLIBR_CLEVEL_DEFAULT: i32 = DEFAULT_LEVEL as i32;

/// What the CLI should do with its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMode {
    /// Decompress if the first input carries a known suffix, compress otherwise.
    Auto,
    Compress,
    Decompress,
    /// Decode and verify without writing output.
    Test,
}

/// Infer the operation mode from `filename`'s extension.
pub fn determine_op_mode(filename: &str) -> OpMode {
    if KNOWN_EXTENSIONS.iter().any(|ext| filename.ends_with(ext)) {
        OpMode::Decompress
    } else {
        OpMode::Compress
    }
}

/// Mode implied by the executable name: `unzlibr` decompresses, `zlibrcat`
/// decompresses to stdout. The flag is `true` when stdout is forced.
pub fn detect_alias(argv0: &str) -> (OpMode, bool) {
    let name = Path::new(argv0)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.as_str() {
        UNZLIBR => (OpMode::Decompress, false),
        ZLIBRCAT => (OpMode::Decompress, true),
        _ => (OpMode::Auto, false),
    }
}

/// Read the default compression level from `ZLIBR_CLEVEL`.
pub fn init_c_level() -> i32 {
    init_c_level_from(std::env::var(ENV_CLEVEL).ok().as_deref())
}

/// Testable core of [`init_c_level`]: `None` means the variable is unset.
pub fn init_c_level_from(env_val: Option<&str>) -> i32 {
    if let Some(env) = env_val {
        match env.trim().parse::<i32>() {
            Ok(level) if (0..=9).contains(&level) => return level,
            _ => {
                if display_level() >= 2 {
                    eprintln!(
                        "Ignore environment variable setting {}={}: not a level between 0 and 9",
                        ENV_CLEVEL, env
                    );
                }
            }
        }
    }
    ZLIBR_CLEVEL_DEFAULT
}
