// Integration tests for engine/compress.rs: CompressionEngine
//
// Covers option validation, the three framings on every compiled-in
// backend, flush modes, the released state after Z_FINISH, and dictionaries.

use zlibr::backend::Backend;
use zlibr::engine::{CompressOptions, CompressionEngine};
use zlibr::oneshot::decompress_with_backend;
use zlibr::types::{Flush, Framing};
use zlibr::{Z_BLOCK, Z_FILTERED, Z_FIXED, Z_HUFFMAN_ONLY, Z_RLE};

fn backends() -> impl Iterator<Item = Backend> {
    Backend::ALL.into_iter().filter(|b| b.is_available())
}

fn sample() -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..2000u32 {
        data.extend_from_slice(format!("line {i}: the quick brown fox\n").as_bytes());
    }
    data
}

fn compress_all(backend: Backend, options: &CompressOptions, data: &[u8]) -> Vec<u8> {
    let mut engine = CompressionEngine::with_backend(backend, options).unwrap();
    let mut out = engine.compress(data).unwrap();
    out.extend(engine.finish().unwrap());
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Framing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn every_framing_round_trips_on_every_backend() {
    let data = sample();
    for backend in backends() {
        for (wbits, framing) in [(-15, Framing::Raw), (15, Framing::Zlib), (31, Framing::Gzip)] {
            let options = CompressOptions::default().wbits(wbits);
            let engine = CompressionEngine::with_backend(backend, &options).unwrap();
            assert_eq!(engine.framing(), framing);
            assert_eq!(engine.backend(), backend);

            let packed = compress_all(backend, &options, &data);
            assert!(packed.len() < data.len() / 4, "{backend} {framing}");
            for reader in backends() {
                assert_eq!(
                    decompress_with_backend(reader, &packed, wbits, 0).unwrap(),
                    data,
                    "{backend} -> {reader} {framing}"
                );
            }
        }
    }
}

#[test]
fn zlib_header_reflects_level() {
    for backend in backends() {
        let fast = compress_all(backend, &CompressOptions::default().level(1), b"abc");
        let best = compress_all(backend, &CompressOptions::default().level(9), b"abc");
        assert_eq!(fast[0], 0x78);
        assert_eq!(fast[1], 0x01, "{backend}");
        assert_eq!(best[1], 0xda, "{backend}");
    }
}

#[test]
fn gzip_member_layout() {
    let data = b"gzip member layout";
    for backend in backends() {
        let packed = compress_all(backend, &CompressOptions::default().wbits(31), data);
        assert_eq!(&packed[..4], &[0x1f, 0x8b, 0x08, 0x00]);
        let n = packed.len();
        let crc = u32::from_le_bytes(packed[n - 8..n - 4].try_into().unwrap());
        let isize = u32::from_le_bytes(packed[n - 4..].try_into().unwrap());
        assert_eq!(crc, zlibr::crc32(data, 0));
        assert_eq!(isize as usize, data.len());
    }
}

#[test]
fn window_of_eight_is_accepted() {
    for backend in backends() {
        for wbits in [8, -8, 24] {
            let options = CompressOptions::default().wbits(wbits);
            let result = CompressionEngine::with_backend(backend, &options);
            if wbits == 24 {
                assert!(result.is_err());
                continue;
            }
            let packed = compress_all(backend, &options, b"small window");
            let read_bits = if wbits < 0 { -9 } else { 9 };
            assert_eq!(decompress_with_backend(backend, &packed, read_bits, 0).unwrap(), b"small window");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn invalid_options_are_configuration_errors() {
    let bad = [
        CompressOptions::default().level(10),
        CompressOptions::default().level(-2),
        CompressOptions::default().wbits(16),
        CompressOptions::default().wbits(7),
        CompressOptions::default().mem_level(0),
        CompressOptions::default().mem_level(10),
        CompressOptions::default().strategy(5),
    ];
    for backend in backends() {
        for options in &bad {
            let err = CompressionEngine::with_backend(backend, options).unwrap_err();
            assert_eq!(err.error_name(), "ConfigurationError", "{options:?}");
            assert_eq!(err.to_string(), "Invalid initialization option");
        }
    }
}

#[test]
fn method_must_be_deflated() {
    let err = CompressionEngine::with_backend(Backend::Managed, &CompressOptions::default().method(9))
        .unwrap_err();
    assert_eq!(err.error_name(), "ConfigurationError");
    assert!(err.to_string().contains("DEFLATED"));
}

#[test]
fn strategies_round_trip() {
    let data = sample();
    for backend in backends() {
        for strategy in [Z_FILTERED, Z_HUFFMAN_ONLY, Z_RLE, Z_FIXED] {
            let options = CompressOptions::default().strategy(strategy);
            let packed = compress_all(backend, &options, &data);
            assert_eq!(decompress_with_backend(backend, &packed, 15, 0).unwrap(), data);
        }
    }
}

#[test]
fn level_zero_stores() {
    let data = sample();
    let packed = compress_all(Backend::Managed, &CompressOptions::default().level(0), &data);
    assert!(packed.len() > data.len());
    assert_eq!(decompress_with_backend(Backend::Managed, &packed, 15, 0).unwrap(), data);
}

// ─────────────────────────────────────────────────────────────────────────────
// Flush modes and release
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn sync_and_full_flush_make_prefix_decodable() {
    for backend in backends() {
        for mode in [Flush::Sync, Flush::Full] {
            let mut engine = CompressionEngine::with_backend(backend, &CompressOptions::default().wbits(-15)).unwrap();
            let mut head = engine.compress(b"first half, ").unwrap();
            head.extend(engine.flush(mode).unwrap());
            assert!(head.ends_with(&[0x00, 0x00, 0xff, 0xff]), "{backend} {mode:?}");

            let mut d = zlibr::DecompressionEngine::with_backend(backend, -15, None).unwrap();
            assert_eq!(d.decompress(&head, 0).unwrap(), b"first half, ");

            let mut tail = engine.compress(b"second half").unwrap();
            tail.extend(engine.finish().unwrap());
            assert_eq!(d.decompress(&tail, 0).unwrap(), b"second half");
            assert!(d.eof());
        }
    }
}

#[test]
fn block_and_partial_flush_keep_stream_valid() {
    let data = sample();
    for backend in backends() {
        let mut engine = CompressionEngine::with_backend(backend, &CompressOptions::default()).unwrap();
        let mut packed = Vec::new();
        for (i, chunk) in data.chunks(5000).enumerate() {
            packed.extend(engine.compress(chunk).unwrap());
            let mode = if i % 2 == 0 { Flush::Partial } else { Flush::from_code(Z_BLOCK).unwrap() };
            packed.extend(engine.flush(mode).unwrap());
        }
        packed.extend(engine.finish().unwrap());
        assert_eq!(decompress_with_backend(backend, &packed, 15, 0).unwrap(), data);
    }
}

#[test]
fn no_flush_returns_nothing() {
    let mut engine = CompressionEngine::with_backend(Backend::Managed, &CompressOptions::default()).unwrap();
    engine.feed(b"held back").unwrap();
    assert!(engine.flush(Flush::None).unwrap().is_empty());
    let rest = engine.finish().unwrap();
    assert_eq!(decompress_with_backend(Backend::Managed, &rest, 15, 0).unwrap(), b"held back");
}

#[test]
fn finish_releases_the_engine() {
    for backend in backends() {
        let mut engine = CompressionEngine::with_backend(backend, &CompressOptions::default()).unwrap();
        engine.compress(b"done").unwrap();
        engine.finish().unwrap();
        assert!(engine.is_released());
        assert!(!engine.can_copy());

        let err = engine.finish().unwrap_err();
        assert!(err.is_state());
        assert_eq!(err.to_string(), "Error -2 while flushing: inconsistent stream state");
        let err = engine.compress(b"more").unwrap_err();
        assert_eq!(err.to_string(), "Error -2 while compressing data: inconsistent stream state");
        // Flush::None never touches the stream.
        assert!(engine.flush(Flush::None).unwrap().is_empty());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Dictionaries
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn zlib_dictionary_sets_fdict() {
    let dict = b"the quick brown fox jumps over the lazy dog";
    for backend in backends() {
        let options = CompressOptions::default().zdict(&dict[..]);
        let packed = compress_all(backend, &options, b"the lazy dog jumps over the quick brown fox");
        assert_eq!(packed[1] & 0x20, 0x20, "FDICT bit");
        let id = u32::from_be_bytes(packed[2..6].try_into().unwrap());
        assert_eq!(id, zlibr::adler32(dict, 1));

        let mut d = zlibr::DecompressionEngine::with_backend(backend, 15, Some(dict)).unwrap();
        assert_eq!(d.decompress(&packed, 0).unwrap(), b"the lazy dog jumps over the quick brown fox");
    }
}

#[test]
fn gzip_ignores_dictionary() {
    let options = CompressOptions::default().wbits(31).zdict(&b"unused dictionary"[..]);
    let packed = compress_all(Backend::Managed, &options, b"payload");
    assert_eq!(decompress_with_backend(Backend::Managed, &packed, 31, 0).unwrap(), b"payload");
}
