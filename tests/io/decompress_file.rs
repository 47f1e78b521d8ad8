// Integration tests for io/decompress_file.rs against real files.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use zlibr::backend::Backend;
use zlibr::io::{
    compress_filename, decompress_filename, decompress_multiple_filenames, strip_extension, Prefs,
};
use zlibr::types::Framing;

fn write(dir: &TempDir, name: &str, contents: &[u8]) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_owned()
}

#[test]
fn round_trip_through_files() {
    let dir = TempDir::new().unwrap();
    let original = b"round trip through the filesystem\n".repeat(1000);
    let src = write(&dir, "doc.txt", &original);
    for backend in Backend::ALL.into_iter().filter(|b| b.is_available()) {
        let prefs = Prefs {
            backend,
            overwrite: true,
            ..Prefs::default()
        };
        let packed = format!("{src}.gz");
        compress_filename(&src, &packed, 6, &prefs).unwrap();
        let restored = dir.path().join("restored.txt");
        let restored = restored.to_str().unwrap();
        let stats = decompress_filename(&packed, restored, &prefs).unwrap();
        assert_eq!(stats.bytes_out, original.len() as u64);
        assert_eq!(fs::read(restored).unwrap(), original);
    }
}

#[test]
fn suffix_stripping() {
    let auto = Prefs::default();
    assert_eq!(strip_extension("a/b.txt.gz", &auto).as_deref(), Some("a/b.txt"));
    assert_eq!(strip_extension("b.zz", &auto).as_deref(), Some("b"));
    assert_eq!(strip_extension("b.deflate", &auto), None);
    assert_eq!(strip_extension(".gz", &auto), None);

    let raw = Prefs {
        framing: Framing::Raw,
        ..Prefs::default()
    };
    assert_eq!(strip_extension("b.deflate", &raw).as_deref(), Some("b"));
    assert_eq!(strip_extension("b.gz", &raw), None);
}

#[test]
fn batch_skips_unknown_suffix_and_removes_sources() {
    let dir = TempDir::new().unwrap();
    let prefs = Prefs {
        remove_src_file: true,
        ..Prefs::default()
    };
    let mut packed = Vec::new();
    for name in ["x", "y"] {
        let src = write(&dir, name, name.repeat(100).as_bytes());
        let dst = format!("{src}.gz");
        compress_filename(&src, &dst, 6, &prefs).unwrap();
        packed.push(dst);
    }
    packed.push(write(&dir, "z.bin", b"not compressed"));

    let missed = decompress_multiple_filenames(&packed, false, &prefs).unwrap();
    assert_eq!(missed, 1);
    assert_eq!(fs::read(dir.path().join("x")).unwrap(), "x".repeat(100).as_bytes());
    assert_eq!(fs::read(dir.path().join("y")).unwrap(), "y".repeat(100).as_bytes());
    assert!(!Path::new(&packed[0]).exists());
    assert!(Path::new(&packed[2]).exists());
}

#[test]
fn test_mode_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let src = write(&dir, "t", b"verify only");
    let gz = format!("{src}.gz");
    compress_filename(&src, &gz, 6, &Prefs::default()).unwrap();
    fs::remove_file(&src).unwrap();

    let prefs = Prefs {
        test_mode: true,
        remove_src_file: true,
        ..Prefs::default()
    };
    assert_eq!(decompress_multiple_filenames(&[gz.clone()], false, &prefs).unwrap(), 0);
    assert!(!Path::new(&src).exists());
    assert!(Path::new(&gz).exists());
}

#[test]
fn corrupt_input_removes_partial_output() {
    let dir = TempDir::new().unwrap();
    let src = write(&dir, "bad.gz", &[0x1f, 0x8b, 0x08, 0, 0, 0, 0, 0, 0, 3, 0xff, 0xff, 0xff, 0xff]);
    let dst = dir.path().join("bad");
    let dst = dst.to_str().unwrap();
    assert!(decompress_filename(&src, dst, &Prefs::default()).is_err());
    assert!(!Path::new(dst).exists());
}
