// Integration tests for io/compress_file.rs against real files.

use std::fs;
use std::path::Path;

use filetime::FileTime;
use tempfile::TempDir;
use zlibr::backend::Backend;
use zlibr::io::{compress_filename, compress_multiple_filenames, Prefs};
use zlibr::oneshot::decompress_with_backend;
use zlibr::types::Framing;

fn write(dir: &TempDir, name: &str, contents: &[u8]) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_owned()
}

#[test]
fn output_matches_framing() {
    let dir = TempDir::new().unwrap();
    let src = write(&dir, "in.txt", &b"compress me ".repeat(300));
    for (framing, wbits) in [(Framing::Gzip, 31), (Framing::Zlib, 15), (Framing::Raw, -15)] {
        let prefs = Prefs {
            framing,
            backend: Backend::Managed,
            ..Prefs::default()
        };
        let dst = format!("{src}{}", prefs.extension());
        let stats = compress_filename(&src, &dst, 6, &prefs).unwrap();
        let packed = fs::read(&dst).unwrap();
        assert_eq!(stats.bytes_out, packed.len() as u64);
        assert_eq!(decompress_with_backend(Backend::Managed, &packed, wbits, 0).unwrap(), fs::read(&src).unwrap());
    }
}

#[test]
fn timestamps_follow_source() {
    let dir = TempDir::new().unwrap();
    let src = write(&dir, "dated", b"old file");
    let stamp = FileTime::from_unix_time(1_234_567_890, 0);
    filetime::set_file_mtime(&src, stamp).unwrap();

    let dst = format!("{src}.gz");
    compress_filename(&src, &dst, 6, &Prefs::default()).unwrap();
    let meta = fs::metadata(&dst).unwrap();
    assert_eq!(FileTime::from_last_modification_time(&meta), stamp);
}

#[test]
fn existing_output_is_kept_without_force() {
    let dir = TempDir::new().unwrap();
    let src = write(&dir, "a", b"new data");
    let dst = write(&dir, "a.gz", b"precious");

    assert!(compress_filename(&src, &dst, 6, &Prefs::default()).is_err());
    assert_eq!(fs::read(&dst).unwrap(), b"precious");

    let forced = Prefs {
        overwrite: true,
        ..Prefs::default()
    };
    compress_filename(&src, &dst, 6, &forced).unwrap();
    assert_ne!(fs::read(&dst).unwrap(), b"precious");
}

#[test]
fn failure_leaves_no_partial_output() {
    let dir = TempDir::new().unwrap();
    let src = write(&dir, "b", b"data");
    let dst = format!("{src}.gz");
    // Level 12 is refused by the engine after the destination was created.
    assert!(compress_filename(&src, &dst, 12, &Prefs::default()).is_err());
    assert!(!Path::new(&dst).exists());
    assert!(Path::new(&src).exists());
}

#[test]
fn batch_with_custom_suffix() {
    let dir = TempDir::new().unwrap();
    let srcs: Vec<String> = (0..8)
        .map(|i| write(&dir, &format!("f{i}"), format!("file number {i} ").repeat(i + 1).as_bytes()))
        .collect();
    let prefs = Prefs {
        framing: Framing::Zlib,
        ..Prefs::default()
    };
    assert_eq!(compress_multiple_filenames(&srcs, ".z", 9, &prefs).unwrap(), 0);
    for (i, src) in srcs.iter().enumerate() {
        let packed = fs::read(format!("{src}.z")).unwrap();
        let plain = zlibr::oneshot::decompress(&packed, 15, 0).unwrap();
        assert_eq!(plain, format!("file number {i} ").repeat(i + 1).into_bytes());
    }
}
