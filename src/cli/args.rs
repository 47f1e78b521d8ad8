//! Command-line argument parsing.
//!
//! The command line is declared with clap's derive API ([`Cli`]) and turned
//! into a [`ParsedArgs`] value that the dispatcher in `main.rs` consumes.
//! Entry points are [`parse_args`] (reads `std::env::args_os()`) and
//! [`parse_args_from`] (explicit argument list, used by the tests).
//!
//! gzip-style numeric levels (`-0` .. `-9`) are not expressible as clap
//! flags; [`normalize_level_flags`] rewrites them to `--level=N` first.

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};

use crate::backend::Backend;
use crate::cli::constants::COMPRESSOR_NAME;
use crate::cli::help::{after_help, ABOUT};
use crate::cli::op_mode::{detect_alias, init_c_level, OpMode};
use crate::config::MAX_WBITS;
use crate::io::file_io::{STDIN_MARK, STDOUT_MARK};
use crate::io::prefs::Prefs;
use crate::types::{Framing, Strategy};

/// Container format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Gzip,
    Zlib,
    Raw,
}

impl From<FormatArg> for Framing {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Gzip => Framing::Gzip,
            FormatArg::Zlib => Framing::Zlib,
            FormatArg::Raw => Framing::Raw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Default,
    Filtered,
    Huffman,
    Rle,
    Fixed,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Default => Strategy::Default,
            StrategyArg::Filtered => Strategy::Filtered,
            StrategyArg::Huffman => Strategy::HuffmanOnly,
            StrategyArg::Rle => Strategy::Rle,
            StrategyArg::Fixed => Strategy::Fixed,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = COMPRESSOR_NAME, version, about = ABOUT, after_help = after_help())]
pub struct Cli {
    /// Decompress
    #[arg(short, long)]
    pub decompress: bool,

    /// Compress (default unless the input has a .gz or .zz suffix)
    #[arg(short = 'z', long, conflicts_with_all = ["decompress", "test"])]
    pub compress: bool,

    /// Test compressed files: decode and verify, write nothing
    #[arg(short, long)]
    pub test: bool,

    /// Write to standard output
    #[arg(short = 'c', long = "stdout")]
    pub stdout: bool,

    /// Output file (single input only)
    #[arg(short, long, value_name = "FILE", conflicts_with = "stdout")]
    pub output: Option<String>,

    /// Keep source files (default)
    #[arg(short, long, conflicts_with = "rm")]
    pub keep: bool,

    /// Remove source files after successful de/compression
    #[arg(long)]
    pub rm: bool,

    /// Overwrite existing output files
    #[arg(short, long)]
    pub force: bool,

    /// Operate recursively on directories
    #[arg(short, long)]
    pub recursive: bool,

    /// Compression level, 0 (store) to 9 (best)
    #[arg(long, value_parser = clap::value_parser!(i32).range(0..=9))]
    pub level: Option<i32>,

    /// Same as --level 1
    #[arg(long, conflicts_with_all = ["level", "best"])]
    pub fast: bool,

    /// Same as --level 9
    #[arg(long, conflicts_with = "level")]
    pub best: bool,

    /// Container format [default: gzip; decompression accepts gzip or zlib]
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// DEFLATE implementation
    #[arg(long, value_parser = clap::value_parser!(Backend))]
    pub backend: Option<Backend>,

    /// Compression strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Window size exponent
    #[arg(long, default_value_t = MAX_WBITS as u8, value_parser = clap::value_parser!(u8).range(9..=15))]
    pub window: u8,

    /// Memory used for the internal compression state, 1 to 9
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(i32).range(1..=9))]
    pub mem_level: i32,

    /// Preset dictionary (zlib and raw formats)
    #[arg(short = 'D', long = "dict", value_name = "FILE")]
    pub dict: Option<PathBuf>,

    /// Suffix for compressed files
    #[arg(short = 'S', long)]
    pub suffix: Option<String>,

    /// Do not copy timestamps to output files
    #[arg(long)]
    pub no_times: bool,

    /// More output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Less output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Input files
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,
}

/// Options and filenames ready for dispatch.
#[derive(Debug)]
pub struct ParsedArgs {
    /// Compression/decompression/IO preferences.
    pub prefs: Prefs,
    /// Resolved operation mode (`Auto` is resolved against the first input).
    pub op_mode: OpMode,
    pub c_level: i32,
    /// Write every output to stdout.
    pub force_stdout: bool,
    /// Explicit output filename (single input only).
    pub output: Option<String>,
    pub recursive: bool,
    /// Suffix appended on compression and stripped on decompression.
    pub suffix: String,
    /// Input filenames; `stdin` when none were given.
    pub inputs: Vec<String>,
    /// Final display level (2 adjusted by -v / -q).
    pub display_level: i32,
}

/// Rewrite `-N` (a single digit) to `--level=N`. Everything after `--` is
/// left alone.
pub fn normalize_level_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut options_done = false;
    for arg in args {
        if !options_done {
            if arg == "--" {
                options_done = true;
            } else if let Some(s) = arg.to_str() {
                let bytes = s.as_bytes();
                if bytes.len() == 2 && bytes[0] == b'-' && bytes[1].is_ascii_digit() {
                    out.push(OsString::from(format!("--level={}", &s[1..])));
                    continue;
                }
            }
        }
        out.push(arg);
    }
    out
}

fn program_name(args: &[OsString]) -> String {
    args.first()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_else(|| COMPRESSOR_NAME.to_owned())
}

/// Parse the process arguments. clap errors (and `--help` / `--version`)
/// exit the process.
pub fn parse_args() -> anyhow::Result<ParsedArgs> {
    let args = normalize_level_flags(std::env::args_os());
    let argv0 = program_name(&args);
    Cli::parse_from(args).into_parsed(&argv0)
}

/// Parse an explicit argument list; the first element is the program name.
/// clap errors are returned instead of exiting.
pub fn parse_args_from<I>(args: I) -> anyhow::Result<ParsedArgs>
where
    I: IntoIterator<Item = OsString>,
{
    let args = normalize_level_flags(args);
    let argv0 = program_name(&args);
    let cli = Cli::try_parse_from(args)?;
    cli.into_parsed(&argv0)
}

impl Cli {
    /// Resolve the parsed flags against the binary name and the environment.
    pub fn into_parsed(self, argv0: &str) -> anyhow::Result<ParsedArgs> {
        let (alias_mode, alias_stdout) = detect_alias(argv0);

        let op_mode = if self.test {
            OpMode::Test
        } else if self.decompress {
            OpMode::Decompress
        } else if self.compress {
            OpMode::Compress
        } else {
            alias_mode
        };

        let c_level = match (self.level, self.fast, self.best) {
            (Some(level), _, _) => level,
            (None, true, _) => 1,
            (None, _, true) => 9,
            _ => init_c_level(),
        };

        let framing = self.format.map(Framing::from).unwrap_or(Framing::Auto);

        let backend = match self.backend {
            Some(backend) => backend
                .require()
                .with_context(|| format!("--backend {backend}"))?,
            None => Backend::default(),
        };

        let dictionary = match &self.dict {
            Some(path) => {
                if framing == Framing::Gzip || framing == Framing::Auto {
                    bail!("a dictionary needs --format zlib or --format raw");
                }
                let dict = fs::read(path)
                    .with_context(|| format!("reading dictionary {}", path.display()))?;
                Some(dict)
            }
            None => None,
        };

        let inputs = if self.files.is_empty() {
            vec![STDIN_MARK.to_owned()]
        } else {
            self.files
                .into_iter()
                .map(|f| if f == "-" { STDIN_MARK.to_owned() } else { f })
                .collect()
        };

        if self.output.is_some() && inputs.len() > 1 {
            bail!("-o can only be used with a single input file");
        }

        let prefs = Prefs {
            backend,
            framing,
            window_log: self.window,
            strategy: self.strategy.map(Strategy::from).unwrap_or_default(),
            mem_level: self.mem_level,
            dictionary,
            overwrite: self.force,
            remove_src_file: self.rm,
            test_mode: op_mode == OpMode::Test,
            preserve_times: !self.no_times,
            ..Prefs::default()
        };

        let suffix = match self.suffix {
            Some(suffix) if suffix.is_empty() => bail!("suffix must not be empty"),
            Some(suffix) => suffix,
            None => prefs.extension().to_owned(),
        };

        let force_stdout = self.stdout || alias_stdout || self.output.as_deref() == Some(STDOUT_MARK);

        Ok(ParsedArgs {
            prefs,
            op_mode,
            c_level,
            force_stdout,
            output: self.output.filter(|o| o != STDOUT_MARK),
            recursive: self.recursive,
            suffix,
            inputs,
            display_level: 2 + i32::from(self.verbose) - i32::from(self.quiet),
        })
    }
}
