// cli/help.rs: help text shown by clap, and the verbose banner.

use crate::cli::constants::{COMPRESSOR_NAME, ENV_CLEVEL, ENV_LOG};
use crate::io::{STDIN_MARK, STDOUT_MARK};

pub const ABOUT: &str = "Compress or decompress files in gzip, zlib or raw DEFLATE format";

/// Shown after the option list by `--help`.
pub fn after_help() -> String {
    format!(
        "\
With no FILE, or when FILE is - or {STDIN_MARK}, read standard input.
Output goes to FILE.gz (.zz for --format zlib, .deflate for --format raw),
or to standard output with -c (the default when reading standard input).
-o {STDOUT_MARK} also selects standard output.

Levels: -0 (store) .. -9 (best), or --level N. Default 6.

Environment:
  {ENV_CLEVEL}   default compression level
  {ENV_LOG}      tracing filter, e.g. {COMPRESSOR_NAME}=debug
  ZLIBR_BACKEND  default backend (native or managed)"
    )
}

/// One-line banner printed at display level 3 and above.
pub fn welcome_message() -> String {
    format!(
        "*** {} v{} {}-bit, zlib {} ***",
        COMPRESSOR_NAME,
        crate::ZLIBR_VERSION_STRING,
        std::mem::size_of::<usize>() * 8,
        crate::zlib_version()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_names_versions() {
        let banner = welcome_message();
        assert!(banner.contains(crate::ZLIBR_VERSION_STRING));
        assert!(banner.contains("zlib 1.3.1"));
    }

    #[test]
    fn after_help_mentions_environment() {
        let text = after_help();
        assert!(text.contains(ENV_CLEVEL));
        assert!(text.contains(ENV_LOG));
    }
}
