//! Binary entry point for the `zlibr` command-line tool.
//!
//! # Control flow
//!
//! 1. [`parse_args`] processes the command line into a [`ParsedArgs`] value
//!    (clap handles `--help`, `--version` and usage errors).
//! 2. Logging is initialised: `ZLIBR_LOG` when set, otherwise a level derived
//!    from `-v` / `-q`.
//! 3. [`run`] expands the inputs, resolves `Auto` mode and output names, and
//!    dispatches to the file pipeline in `zlibr::io`.
//!
//! The exit code is 0 when every input succeeded and 1 otherwise.

use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context};
use tracing_subscriber::EnvFilter;

use zlibr::cli::args::{parse_args, ParsedArgs};
use zlibr::cli::constants::{set_display_level, COMPRESSOR_NAME, ENV_LOG};
use zlibr::cli::help::welcome_message;
use zlibr::cli::op_mode::{determine_op_mode, OpMode};
use zlibr::io::{
    compress_filename, compress_multiple_filenames, create_file_list, decompress_filename,
    decompress_multiple_filenames, STDIN_MARK, STDOUT_MARK,
};

fn init_tracing(display_level: i32) {
    let default = match display_level {
        i32::MIN..=0 => "off",
        1 | 2 => "warn",
        3 => "info",
        4 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Expand directories when `-r` was given.
fn expand_inputs(args: &ParsedArgs) -> anyhow::Result<Vec<String>> {
    if !args.recursive {
        return Ok(args.inputs.clone());
    }
    if !cfg!(feature = "recursive") {
        zlibr::displaylevel!(2, "warning: this build has no recursive support (-r ignored)\n");
        return Ok(args.inputs.clone());
    }
    let paths: Vec<&Path> = args.inputs.iter().map(Path::new).collect();
    let skip = match args.op_mode {
        OpMode::Compress | OpMode::Auto => Some(args.suffix.as_str()),
        _ => None,
    };
    let list = create_file_list(&paths, skip).context("expanding directories")?;
    for (u, p) in list.iter().enumerate() {
        zlibr::displaylevel!(4, "{} {}\n", u, p.display());
    }
    Ok(list.into_iter().map(|p| p.to_string_lossy().into_owned()).collect())
}

/// Execute the operation selected by argument parsing. Returns the number of
/// inputs that failed.
fn run(args: ParsedArgs) -> anyhow::Result<usize> {
    zlibr::displaylevel!(3, "{}\n", welcome_message());

    let inputs = expand_inputs(&args)?;
    if inputs.is_empty() {
        bail!("no input files");
    }
    let reads_stdin = inputs.iter().any(|i| i == STDIN_MARK);
    if reads_stdin && inputs.len() > 1 {
        bail!("stdin cannot be combined with other inputs");
    }

    let mut op_mode = args.op_mode;
    if op_mode == OpMode::Auto {
        op_mode = if reads_stdin {
            OpMode::Compress
        } else {
            determine_op_mode(&inputs[0])
        };
    }
    let prefs = &args.prefs;
    let to_stdout = args.force_stdout || (reads_stdin && args.output.is_none());

    match op_mode {
        OpMode::Compress | OpMode::Auto => {
            if to_stdout && std::io::stdout().is_terminal() && !prefs.overwrite {
                bail!("refusing to write compressed data to a terminal (use -f to force)");
            }
            tracing::info!(
                files = inputs.len(),
                level = args.c_level,
                framing = %prefs.framing,
                backend = %prefs.backend,
                "compressing"
            );
            if let Some(output) = &args.output {
                compress_filename(&inputs[0], output, args.c_level, prefs)
                    .with_context(|| format!("{}: compression failed", inputs[0]))?;
                return Ok(0);
            }
            let suffix = if to_stdout { STDOUT_MARK } else { args.suffix.as_str() };
            Ok(compress_multiple_filenames(&inputs, suffix, args.c_level, prefs)?)
        }
        OpMode::Decompress | OpMode::Test => {
            if reads_stdin && std::io::stdin().is_terminal() && !prefs.overwrite {
                bail!("refusing to read compressed data from a terminal (use -f to force)");
            }
            tracing::info!(
                files = inputs.len(),
                framing = %prefs.framing,
                backend = %prefs.backend,
                test = prefs.test_mode,
                "decompressing"
            );
            if let Some(output) = &args.output {
                decompress_filename(&inputs[0], output, prefs)
                    .with_context(|| format!("{}: decompression failed", inputs[0]))?;
                return Ok(0);
            }
            if args.suffix != prefs.extension() && !to_stdout && !prefs.test_mode {
                // A custom -S suffix is stripped by name, one file at a time.
                let mut missed = 0;
                for src in &inputs {
                    let Some(dst) = src.strip_suffix(args.suffix.as_str()).filter(|d| !d.is_empty()) else {
                        zlibr::displaylevel!(1, "{}: {}: unknown suffix -- ignored\n", COMPRESSOR_NAME, src);
                        missed += 1;
                        continue;
                    };
                    if let Err(err) = decompress_filename(src, dst, prefs) {
                        zlibr::displaylevel!(1, "{}: {}: {}\n", COMPRESSOR_NAME, src, err);
                        missed += 1;
                    }
                }
                return Ok(missed);
            }
            Ok(decompress_multiple_filenames(&inputs, to_stdout, prefs)?)
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{COMPRESSOR_NAME}: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    set_display_level(args.display_level);
    init_tracing(args.display_level);

    match run(args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(missed) => {
            tracing::debug!(missed, "some inputs failed");
            ExitCode::FAILURE
        }
        Err(err) => {
            zlibr::displaylevel!(1, "{}: {:#}\n", COMPRESSOR_NAME, err);
            ExitCode::FAILURE
        }
    }
}
