// Integration tests for cli/args.rs: command-line parsing into ParsedArgs.

use std::ffi::OsString;
use std::fs;

use tempfile::TempDir;
use zlibr::cli::args::{normalize_level_flags, parse_args_from};
use zlibr::cli::op_mode::OpMode;
use zlibr::io::STDIN_MARK;
use zlibr::types::{Framing, Strategy};

fn argv(args: &[&str]) -> Vec<OsString> {
    std::iter::once("zlibr")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect()
}

#[test]
fn no_files_reads_stdin() {
    let parsed = parse_args_from(argv(&[])).unwrap();
    assert_eq!(parsed.inputs, vec![STDIN_MARK.to_owned()]);
    assert_eq!(parsed.op_mode, OpMode::Auto);
    assert_eq!(parsed.display_level, 2);
}

#[test]
fn digit_flags_select_level() {
    let parsed = parse_args_from(argv(&["-9", "a.txt"])).unwrap();
    assert_eq!(parsed.c_level, 9);
    let parsed = parse_args_from(argv(&["--fast", "a.txt"])).unwrap();
    assert_eq!(parsed.c_level, 1);
    let parsed = parse_args_from(argv(&["--best", "a.txt"])).unwrap();
    assert_eq!(parsed.c_level, 9);
}

#[test]
fn digits_after_double_dash_are_files() {
    let args = normalize_level_flags(argv(&["-3", "--", "-4"]));
    assert_eq!(args[1], OsString::from("--level=3"));
    assert_eq!(args[3], OsString::from("-4"));
}

#[test]
fn format_and_strategy_flags_reach_prefs() {
    let parsed = parse_args_from(argv(&["--format", "raw", "--strategy", "rle", "--window", "12", "x"])).unwrap();
    assert_eq!(parsed.prefs.framing, Framing::Raw);
    assert_eq!(parsed.prefs.strategy, Strategy::Rle);
    assert_eq!(parsed.prefs.window_log, 12);
    assert_eq!(parsed.prefs.compress_wbits(), -12);
    assert_eq!(parsed.suffix, ".deflate");
}

#[test]
fn out_of_range_level_is_rejected() {
    assert!(parse_args_from(argv(&["--level", "10", "x"])).is_err());
    assert!(parse_args_from(argv(&["--window", "16", "x"])).is_err());
}

#[test]
fn dictionary_requires_zlib_or_raw() {
    let dir = TempDir::new().unwrap();
    let dict = dir.path().join("dict");
    fs::write(&dict, b"preset").unwrap();
    let dict = dict.to_str().unwrap();

    let err = parse_args_from(argv(&["-D", dict, "x"])).unwrap_err();
    assert!(err.to_string().contains("dictionary"));

    let parsed = parse_args_from(argv(&["--format", "zlib", "-D", dict, "x"])).unwrap();
    assert_eq!(parsed.prefs.dictionary.as_deref(), Some(&b"preset"[..]));
}

#[test]
fn output_flag_needs_single_input() {
    assert!(parse_args_from(argv(&["-o", "out.gz", "a", "b"])).is_err());
    let parsed = parse_args_from(argv(&["-o", "out.gz", "a"])).unwrap();
    assert_eq!(parsed.output.as_deref(), Some("out.gz"));
}

#[test]
fn verbosity_counts() {
    assert_eq!(parse_args_from(argv(&["-vv", "x"])).unwrap().display_level, 4);
    assert_eq!(parse_args_from(argv(&["-q", "x"])).unwrap().display_level, 1);
}

#[test]
fn test_mode_sets_prefs() {
    let parsed = parse_args_from(argv(&["-t", "x.gz"])).unwrap();
    assert_eq!(parsed.op_mode, OpMode::Test);
    assert!(parsed.prefs.test_mode);
}

#[test]
fn alias_binary_decompresses_to_stdout() {
    let args: Vec<OsString> = ["/usr/bin/zlibrcat", "a.gz"].iter().map(OsString::from).collect();
    let parsed = parse_args_from(args).unwrap();
    assert_eq!(parsed.op_mode, OpMode::Decompress);
    assert!(parsed.force_stdout);
}
