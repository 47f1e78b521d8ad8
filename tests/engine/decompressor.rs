// Integration tests for engine/decompressor.rs: Decompressor
//
// The streaming decompressor keeps its own leftover input, so these tests
// never hand unconsumed_tail back; they only watch needs_input and eof.

use zlibr::backend::Backend;
use zlibr::engine::Decompressor;
use zlibr::oneshot::compress_with_backend;

fn backends() -> impl Iterator<Item = Backend> {
    Backend::ALL.into_iter().filter(|b| b.is_available())
}

fn payload() -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..5000u32 {
        data.extend_from_slice(&i.to_le_bytes());
        data.extend_from_slice(b" record;");
    }
    data
}

#[test]
fn fresh_decompressor_needs_input() {
    for backend in backends() {
        let d = Decompressor::with_backend(backend, 15, None).unwrap();
        assert!(d.needs_input());
        assert!(!d.eof());
        assert!(d.unused_data().is_empty());
        assert_eq!(d.backend(), backend);
    }
}

#[test]
fn capped_reads_drain_buffered_input() {
    let data = payload();
    for backend in backends() {
        let packed = compress_with_backend(backend, &data, 6, 31).unwrap();
        let mut d = Decompressor::with_backend(backend, 31, None).unwrap();

        let mut out = d.decompress(&packed, Some(1024)).unwrap();
        assert_eq!(out.len(), 1024);
        assert!(!d.needs_input());

        while !d.eof() {
            assert!(!d.needs_input(), "{backend}: stalled with {} bytes out", out.len());
            let chunk = d.decompress(b"", Some(1024)).unwrap();
            assert!(chunk.len() <= 1024);
            out.extend(chunk);
        }
        assert_eq!(out, data);
        assert!(!d.needs_input());
    }
}

#[test]
fn small_chunks_without_cap() {
    let data = payload();
    for backend in backends() {
        let packed = compress_with_backend(backend, &data, 9, -15).unwrap();
        let mut d = Decompressor::with_backend(backend, -15, None).unwrap();
        let mut out = Vec::new();
        for chunk in packed.chunks(33) {
            out.extend(d.decompress(chunk, None).unwrap());
            if !d.eof() {
                assert!(d.needs_input());
            }
        }
        assert!(d.eof());
        assert_eq!(out, data);
    }
}

#[test]
fn zero_cap_only_buffers() {
    let packed = compress_with_backend(Backend::Managed, b"buffer me", 6, 15).unwrap();
    let mut d = Decompressor::with_backend(Backend::Managed, 15, None).unwrap();
    assert!(d.decompress(&packed, Some(0)).unwrap().is_empty());
    assert!(!d.needs_input());
    assert_eq!(d.decompress(b"", None).unwrap(), b"buffer me");
    assert!(d.eof());
}

#[test]
fn trailing_bytes_become_unused_data() {
    for backend in backends() {
        let mut packed = compress_with_backend(backend, b"stream", 6, 15).unwrap();
        packed.extend_from_slice(b"TRAILER");
        let mut d = Decompressor::with_backend(backend, 15, None).unwrap();
        assert_eq!(d.decompress(&packed, None).unwrap(), b"stream");
        assert!(d.eof());
        assert_eq!(d.unused_data(), b"TRAILER");
    }
}

#[test]
fn feeding_after_end_is_state_error() {
    let packed = compress_with_backend(Backend::Managed, b"once", 6, 15).unwrap();
    let mut d = Decompressor::with_backend(Backend::Managed, 15, None).unwrap();
    d.decompress(&packed, None).unwrap();

    let err = d.decompress(b"more", None).unwrap_err();
    assert!(err.is_state());
    assert_eq!(err.to_string(), "End of stream already reached");
    assert!(d.unused_data().is_empty());
}

#[test]
fn corrupt_input_surfaces_format_error() {
    let mut d = Decompressor::with_backend(Backend::Managed, 15, None).unwrap();
    let err = d.decompress(&[0x78, 0x9c, 0xff, 0xff, 0xff, 0xff], None).unwrap_err();
    assert_eq!(err.error_name(), "FormatError");
}
