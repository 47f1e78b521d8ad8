// e2e/file_api.rs: the file pipeline end to end
//
// Directory trees, batches of files, multi-member gzip files and the
// unknown-suffix path, exercised through the public io API only.

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use zlibr::backend::Backend;
use zlibr::io::{
    compress_filename, compress_multiple_filenames, create_file_list, decompress_filename,
    decompress_multiple_filenames, Prefs,
};
use zlibr::types::Framing;

fn populate(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files = Vec::new();
    for (i, rel) in ["a.txt", "sub/b.txt", "sub/deeper/c.bin", "sub/deeper/d.txt"].iter().enumerate() {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let contents: Vec<u8> = (0..(i + 1) * 5000).map(|n| (n * (i + 3) % 97) as u8).collect();
        fs::write(&path, &contents).unwrap();
        files.push((path.to_str().unwrap().to_owned(), contents));
    }
    files
}

#[test]
fn tree_round_trip() {
    let dir = TempDir::new().unwrap();
    let files = populate(dir.path());

    let list = create_file_list(&[dir.path()], Some(".gz")).unwrap();
    assert_eq!(list.len(), files.len());
    let srcs: Vec<String> = list.iter().map(|p| p.to_str().unwrap().to_owned()).collect();

    let prefs = Prefs {
        remove_src_file: true,
        ..Prefs::default()
    };
    assert_eq!(compress_multiple_filenames(&srcs, ".gz", 6, &prefs).unwrap(), 0);
    for (path, _) in &files {
        assert!(!Path::new(path).exists());
    }

    // Second listing sees only the compressed files.
    let packed: Vec<String> = create_file_list(&[dir.path()], None)
        .unwrap()
        .iter()
        .map(|p| p.to_str().unwrap().to_owned())
        .collect();
    assert!(packed.iter().all(|p| p.ends_with(".gz")));
    assert_eq!(decompress_multiple_filenames(&packed, false, &prefs).unwrap(), 0);
    for (path, contents) in &files {
        assert_eq!(&fs::read(path).unwrap(), contents);
    }
}

#[test]
fn multi_member_file() {
    let dir = TempDir::new().unwrap();
    let mut joined = Vec::new();
    let mut expected = Vec::new();
    for (i, backend) in [Backend::Managed, Backend::Managed, Backend::default()].into_iter().enumerate() {
        let part = format!("part {i}\n").repeat(100 * (i + 1));
        joined.extend(zlibr::oneshot::compress_with_backend(backend, part.as_bytes(), 6, 31).unwrap());
        expected.extend_from_slice(part.as_bytes());
    }
    let src = dir.path().join("parts.gz");
    fs::write(&src, &joined).unwrap();
    let dst = dir.path().join("parts");

    let stats = decompress_filename(src.to_str().unwrap(), dst.to_str().unwrap(), &Prefs::default()).unwrap();
    assert_eq!(stats.members, 3);
    assert_eq!(fs::read(&dst).unwrap(), expected);
}

#[test]
fn raw_files_use_their_own_suffix() {
    let dir = TempDir::new().unwrap();
    let files = populate(dir.path());
    let prefs = Prefs {
        framing: Framing::Raw,
        ..Prefs::default()
    };
    let (src, contents) = &files[0];
    let dst = format!("{src}{}", prefs.extension());
    compress_filename(src, &dst, 1, &prefs).unwrap();
    fs::remove_file(src).unwrap();

    assert_eq!(decompress_multiple_filenames(&[dst.clone()], false, &prefs).unwrap(), 0);
    assert_eq!(&fs::read(src).unwrap(), contents);

    // Auto framing does not claim the raw suffix.
    let auto = Prefs::default();
    assert_eq!(decompress_multiple_filenames(&[dst], false, &auto).unwrap(), 1);
}
