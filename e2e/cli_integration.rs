// e2e/cli_integration.rs: the `zlibr` binary driven as a black box
//
// Covers compress/decompress dispatch, stdin/stdout piping, test mode, the
// overwrite policy, format and level flags, and exit codes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

/// Locate the `zlibr` binary produced by Cargo.
fn zlibr_bin() -> PathBuf {
    if let Ok(p) = std::env::var("CARGO_BIN_EXE_zlibr") {
        return PathBuf::from(p);
    }
    let mut p = std::env::current_exe().unwrap();
    p.pop();
    if p.ends_with("deps") {
        p.pop();
    }
    p.push("zlibr");
    p
}

fn make_temp_input() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("input.txt");
    fs::write(&input_path, "Hello, zlib!\n".repeat(400)).unwrap();
    (dir, input_path)
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(zlibr_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("ZLIBR_CLEVEL")
        .env_remove("ZLIBR_BACKEND")
        .output()
        .expect("failed to run zlibr")
}

fn run_with_stdin(dir: &Path, args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(zlibr_bin())
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn zlibr");
    child.stdin.take().unwrap().write_all(input).unwrap();
    child.wait_with_output().unwrap()
}

// ── 1. File round trip ───────────────────────────────────────────────────────

#[test]
fn test_cli_compress_decompress_roundtrip() {
    let (dir, input) = make_temp_input();
    let original = fs::read(&input).unwrap();

    let out = run(dir.path(), &["input.txt"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let gz = dir.path().join("input.txt.gz");
    assert!(gz.exists());
    assert!(input.exists(), "sources are kept by default");
    assert_eq!(&fs::read(&gz).unwrap()[..2], &[0x1f, 0x8b]);

    fs::remove_file(&input).unwrap();
    let out = run(dir.path(), &["input.txt.gz"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(fs::read(&input).unwrap(), original);
}

// ── 2. Pipes ─────────────────────────────────────────────────────────────────

#[test]
fn test_cli_stdin_to_stdout() {
    let dir = TempDir::new().unwrap();
    let data = b"piped through the binary ".repeat(100);

    let packed = run_with_stdin(dir.path(), &["-c"], &data);
    assert!(packed.status.success());
    assert_eq!(&packed.stdout[..2], &[0x1f, 0x8b]);

    let plain = run_with_stdin(dir.path(), &["-d", "-c"], &packed.stdout);
    assert!(plain.status.success(), "{}", String::from_utf8_lossy(&plain.stderr));
    assert_eq!(plain.stdout, data);
}

#[test]
fn test_cli_zlib_format_and_level() {
    let dir = TempDir::new().unwrap();
    let packed = run_with_stdin(dir.path(), &["--format", "zlib", "-9", "-c"], b"zlib framed");
    assert!(packed.status.success());
    assert_eq!(&packed.stdout[..2], &[0x78, 0xda]);

    let plain = run_with_stdin(dir.path(), &["-d", "--format", "zlib", "-c"], &packed.stdout);
    assert_eq!(plain.stdout, b"zlib framed");
}

#[test]
fn test_cli_managed_backend_flag() {
    let dir = TempDir::new().unwrap();
    let packed = run_with_stdin(dir.path(), &["--backend", "managed", "-c"], b"managed");
    assert!(packed.status.success());
    let plain = run_with_stdin(dir.path(), &["--backend", "native", "-dc"], &packed.stdout);
    if plain.status.success() {
        assert_eq!(plain.stdout, b"managed");
    } else {
        // Builds without the native feature refuse the flag.
        assert!(String::from_utf8_lossy(&plain.stderr).contains("native"));
    }
}

// ── 3. Test mode ─────────────────────────────────────────────────────────────

#[test]
fn test_cli_test_mode() {
    let (dir, _input) = make_temp_input();
    assert!(run(dir.path(), &["input.txt"]).status.success());
    fs::remove_file(dir.path().join("input.txt")).unwrap();

    let out = run(dir.path(), &["-t", "input.txt.gz"]);
    assert!(out.status.success());
    assert!(!dir.path().join("input.txt").exists());

    let gz = dir.path().join("input.txt.gz");
    let mut bytes = fs::read(&gz).unwrap();
    let n = bytes.len();
    bytes[n - 6] ^= 0x55;
    fs::write(&gz, bytes).unwrap();
    let out = run(dir.path(), &["-t", "input.txt.gz"]);
    assert!(!out.status.success());
}

// ── 4. Overwrite policy and exit codes ───────────────────────────────────────

#[test]
fn test_cli_refuses_overwrite_without_force() {
    let (dir, _input) = make_temp_input();
    fs::write(dir.path().join("input.txt.gz"), b"keep me").unwrap();

    let out = run(dir.path(), &["input.txt"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("already exists"));
    assert_eq!(fs::read(dir.path().join("input.txt.gz")).unwrap(), b"keep me");

    let out = run(dir.path(), &["-f", "input.txt"]);
    assert!(out.status.success());
}

#[test]
fn test_cli_missing_input_fails() {
    let dir = TempDir::new().unwrap();
    let out = run(dir.path(), &["does-not-exist.txt"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_cli_rm_and_output_flag() {
    let (dir, input) = make_temp_input();
    let out = run(dir.path(), &["--rm", "-o", "packed.bin", "input.txt"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(!input.exists());
    assert!(dir.path().join("packed.bin").exists());

    let out = run(dir.path(), &["-d", "-o", "back.txt", "packed.bin"]);
    assert!(out.status.success());
    assert_eq!(fs::read_to_string(dir.path().join("back.txt")).unwrap(), "Hello, zlib!\n".repeat(400));
}

#[test]
fn test_cli_version_and_help() {
    let dir = TempDir::new().unwrap();
    let out = run(dir.path(), &["--version"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("zlibr"));

    let out = run(dir.path(), &["--help"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("--format"));
}

#[test]
fn test_cli_rejects_bad_level() {
    let dir = TempDir::new().unwrap();
    let out = run(dir.path(), &["--level", "11", "x"]);
    assert!(!out.status.success());
}
