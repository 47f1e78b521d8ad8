// Integration tests for engine/decompress.rs: DecompressionEngine
//
// Covers framing detection, the output cap and unconsumed_tail, unused_data
// after the end of the stream, dictionaries, flush and the released state,
// and the error kinds raised for corrupt input.

use zlibr::backend::Backend;
use zlibr::engine::{CompressOptions, CompressionEngine, DecompressionEngine};
use zlibr::oneshot::compress_with_backend;

fn backends() -> impl Iterator<Item = Backend> {
    Backend::ALL.into_iter().filter(|b| b.is_available())
}

fn text(n: usize) -> Vec<u8> {
    (0..n).map(|i| b"abcdefghij klmnop\n"[i % 18] ^ (i / 1000) as u8).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Framing and detection
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn auto_detects_zlib_and_gzip() {
    let data = text(20_000);
    for backend in backends() {
        for wbits in [15, 31] {
            let packed = compress_with_backend(backend, &data, 6, wbits).unwrap();
            for auto in [47, 32] {
                let mut d = DecompressionEngine::with_backend(backend, auto, None).unwrap();
                assert_eq!(d.decompress(&packed, 0).unwrap(), data, "{backend} {wbits} -> {auto}");
                assert!(d.eof());
            }
        }
    }
}

#[test]
fn zero_window_reads_zlib_header() {
    let data = text(4000);
    for backend in backends() {
        let packed = compress_with_backend(backend, &data, 6, 12).unwrap();
        let mut d = DecompressionEngine::with_backend(backend, 0, None).unwrap();
        assert_eq!(d.decompress(&packed, 0).unwrap(), data);
    }
}

#[test]
fn gzip_header_split_across_calls() {
    let data = text(3000);
    for backend in backends() {
        let packed = compress_with_backend(backend, &data, 6, 31).unwrap();
        let mut d = DecompressionEngine::with_backend(backend, 31, None).unwrap();
        let mut out = Vec::new();
        for byte in &packed[..12] {
            out.extend(d.decompress(std::slice::from_ref(byte), 0).unwrap());
        }
        out.extend(d.decompress(&packed[12..], 0).unwrap());
        assert_eq!(out, data);
        assert!(d.eof());
    }
}

#[test]
fn gzip_member_followed_by_another_lands_in_unused_data() {
    for backend in backends() {
        let first = compress_with_backend(backend, b"member one", 6, 31).unwrap();
        let second = compress_with_backend(backend, b"member two", 6, 31).unwrap();
        let mut d = DecompressionEngine::with_backend(backend, 31, None).unwrap();
        assert_eq!(d.decompress(&[first, second.clone()].concat(), 0).unwrap(), b"member one");
        assert!(d.eof());
        assert_eq!(d.unused_data(), second.as_slice());

        // Further input after the end only accumulates.
        assert!(d.decompress(b"xyz", 0).unwrap().is_empty());
        assert!(d.unused_data().ends_with(b"xyz"));
    }
}

#[test]
fn raw_stream_has_no_header() {
    let data = text(5000);
    for backend in backends() {
        let packed = compress_with_backend(backend, &data, 9, -15).unwrap();
        let mut d = DecompressionEngine::with_backend(backend, -15, None).unwrap();
        assert_eq!(d.decompress(&packed, 0).unwrap(), data);
        assert!(d.eof());
    }
}

#[test]
fn invalid_window_bits_rejected() {
    for backend in backends() {
        for wbits in [7, 16, 24, 33, 48, -16, -7] {
            let err = DecompressionEngine::with_backend(backend, wbits, None).unwrap_err();
            assert_eq!(err.to_string(), "Invalid initialization option", "{wbits}");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output cap
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn max_length_caps_output_and_keeps_tail() {
    let data = text(50_000);
    for backend in backends() {
        let packed = compress_with_backend(backend, &data, 6, 15).unwrap();
        let mut d = DecompressionEngine::with_backend(backend, 15, None).unwrap();

        let mut out = d.decompress(&packed, 100).unwrap();
        assert_eq!(out.len(), 100);
        assert!(!d.unconsumed_tail().is_empty());

        while !d.eof() {
            let tail = d.unconsumed_tail().to_vec();
            let chunk = d.decompress(&tail, 4096).unwrap();
            assert!(chunk.len() <= 4096);
            out.extend(chunk);
        }
        assert_eq!(out, data);
        assert!(d.unconsumed_tail().is_empty());
    }
}

#[test]
fn negative_max_length_is_invalid_argument() {
    let mut d = DecompressionEngine::with_backend(Backend::Managed, 15, None).unwrap();
    let err = d.decompress(b"", -1).unwrap_err();
    assert_eq!(err.error_name(), "InvalidArgument");
    assert_eq!(err.to_string(), "max_length must be greater than zero");
}

// ─────────────────────────────────────────────────────────────────────────────
// flush and release
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn flush_drains_tail_and_releases() {
    let data = text(30_000);
    for backend in backends() {
        let packed = compress_with_backend(backend, &data, 6, 15).unwrap();
        let mut d = DecompressionEngine::with_backend(backend, 15, None).unwrap();
        let mut out = d.decompress(&packed, 1000).unwrap();
        out.extend(d.flush(zlibr::DEF_BUF_SIZE as i64).unwrap());
        assert_eq!(out, data);
        assert!(d.is_released());
        assert!(d.eof());

        let err = d.decompress(b"", 0).unwrap_err();
        assert!(err.is_state());
        assert_eq!(err.to_string(), "Error -2 while decompressing data: inconsistent stream state");
        assert!(d.flush(1).unwrap().is_empty());
    }
}

#[test]
fn flush_rejects_non_positive_length() {
    let mut d = DecompressionEngine::with_backend(Backend::Managed, 15, None).unwrap();
    assert_eq!(d.flush(0).unwrap_err().error_name(), "InvalidArgument");
    assert!(!d.is_released());
}

// ─────────────────────────────────────────────────────────────────────────────
// Dictionaries
// ─────────────────────────────────────────────────────────────────────────────

fn dict_stream(backend: Backend, wbits: i32, dict: &[u8], data: &[u8]) -> Vec<u8> {
    let options = CompressOptions::default().wbits(wbits).zdict(dict);
    let mut c = CompressionEngine::with_backend(backend, &options).unwrap();
    let mut out = c.compress(data).unwrap();
    out.extend(c.finish().unwrap());
    out
}

#[test]
fn zlib_stream_without_dictionary_fails() {
    let dict = b"shared dictionary contents for the test";
    for backend in backends() {
        let packed = dict_stream(backend, 15, dict, b"dictionary contents for the shared test");
        let mut d = DecompressionEngine::with_backend(backend, 15, None).unwrap();
        let err = d.decompress(&packed, 0).unwrap_err();
        assert_eq!(err.error_name(), "DictionaryError");
        assert_eq!(err.code(), zlibr::Z_NEED_DICT);
        assert_eq!(err.to_string(), "Error 2 while setting zdict");
    }
}

#[test]
fn raw_stream_with_dictionary() {
    let dict = b"0123456789abcdefghijklmnopqrstuvwxyz";
    for backend in backends() {
        let packed = dict_stream(backend, -15, dict, b"abcdefghij0123456789");
        let mut d = DecompressionEngine::with_backend(backend, -15, Some(dict)).unwrap();
        assert_eq!(d.decompress(&packed, 0).unwrap(), b"abcdefghij0123456789");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Corrupt input
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn garbage_is_format_error() {
    for backend in backends() {
        let mut d = DecompressionEngine::with_backend(backend, 15, None).unwrap();
        let err = d.decompress(b"this is certainly not zlib data", 0).unwrap_err();
        assert_eq!(err.error_name(), "FormatError", "{backend}");
        assert_eq!(err.code(), zlibr::Z_DATA_ERROR);
        assert!(err.to_string().starts_with("Error -3 while decompressing data"), "{err}");
    }
}

#[test]
fn bad_gzip_header_is_format_error() {
    let mut bogus = vec![0x1f, 0x8b, 0x07, 0x00];
    bogus.extend_from_slice(&[0u8; 16]);
    for backend in backends() {
        let mut d = DecompressionEngine::with_backend(backend, 31, None).unwrap();
        let err = d.decompress(&bogus, 0).unwrap_err();
        assert_eq!(err.error_name(), "FormatError");
    }
}

#[test]
fn corrupted_gzip_crc_is_format_error() {
    for backend in backends() {
        let mut packed = compress_with_backend(backend, b"check my crc", 6, 31).unwrap();
        let n = packed.len();
        packed[n - 8] ^= 0xff;
        let mut d = DecompressionEngine::with_backend(backend, 31, None).unwrap();
        let err = d.decompress(&packed, 0).unwrap_err();
        assert_eq!(err.error_name(), "FormatError");
        assert!(!d.eof());
    }
}

#[test]
fn truncated_stream_is_not_an_error_until_one_shot() {
    let data = text(10_000);
    for backend in backends() {
        let packed = compress_with_backend(backend, &data, 6, 15).unwrap();
        let cut = &packed[..packed.len() - 10];
        let mut d = DecompressionEngine::with_backend(backend, 15, None).unwrap();
        let out = d.decompress(cut, 0).unwrap();
        assert!(!d.eof());
        assert!(data.starts_with(&out));

        let err = zlibr::oneshot::decompress_with_backend(backend, cut, 15, 0).unwrap_err();
        assert_eq!(err.to_string(), "Error -5 while decompressing data: incomplete or truncated stream");
    }
}
