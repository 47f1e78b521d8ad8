// e2e/error_handling.rs: failure paths across the public API
//
// Corrupt, truncated and misused streams must fail with the documented
// error kind and message on every backend, and leave engines in a defined
// state afterwards.

use zlibr::backend::Backend;
use zlibr::engine::{CompressOptions, CompressionEngine, DecompressionEngine, Decompressor};
use zlibr::error::CompressionError;
use zlibr::oneshot::{compress_with_backend, decompress_with_backend};
use zlibr::session::Session;
use zlibr::types::Flush;

fn backends() -> impl Iterator<Item = Backend> {
    Backend::ALL.into_iter().filter(|b| b.is_available())
}

fn packed(backend: Backend, wbits: i32) -> Vec<u8> {
    compress_with_backend(backend, &b"error handling payload ".repeat(500), 6, wbits).unwrap()
}

// ── 1. Truncation at every boundary ──────────────────────────────────────────

#[test]
fn every_prefix_of_a_gzip_member_is_truncated() {
    for backend in backends() {
        let full = packed(backend, 31);
        for cut in (0..full.len()).step_by(7) {
            let err = decompress_with_backend(backend, &full[..cut], 31, 0).unwrap_err();
            assert_eq!(err.error_name(), "FormatError", "{backend} cut at {cut}");
            assert_eq!(
                err.to_string(),
                "Error -5 while decompressing data: incomplete or truncated stream",
                "{backend} cut at {cut}"
            );
        }
    }
}

// ── 2. Bit flips ─────────────────────────────────────────────────────────────

#[test]
fn flipped_adler_is_detected() {
    for backend in backends() {
        let mut bad = packed(backend, 15);
        let n = bad.len();
        bad[n - 1] ^= 0x80;
        let err = decompress_with_backend(backend, &bad, 15, 0).unwrap_err();
        assert_eq!(err.error_name(), "FormatError");
        assert_eq!(err.code(), zlibr::Z_DATA_ERROR);
    }
}

#[test]
fn flipped_isize_is_detected() {
    for backend in backends() {
        let mut bad = packed(backend, 31);
        let n = bad.len();
        bad[n - 1] ^= 0x01;
        let err = decompress_with_backend(backend, &bad, 31, 0).unwrap_err();
        assert_eq!(err.error_name(), "FormatError");
    }
}

#[test]
fn wrong_framing_is_rejected() {
    for backend in backends() {
        let gz = packed(backend, 31);
        assert!(decompress_with_backend(backend, &gz, 15, 0).is_err());
        let zlib = packed(backend, 15);
        assert!(decompress_with_backend(backend, &zlib, 31, 0).is_err());
    }
}

// ── 3. Engines after failure ─────────────────────────────────────────────────

#[test]
fn decoder_stays_failed_after_data_error() {
    for backend in backends() {
        let mut d = DecompressionEngine::with_backend(backend, -15, None).unwrap();
        assert!(d.decompress(&[0xff, 0xff, 0xff], 0).is_err());
        // The broken stream never reports success afterwards.
        assert!(!d.eof());
        let again = d.decompress(&[0x03, 0x00], 0);
        assert!(again.is_err() || !d.eof());
    }
}

#[test]
fn streaming_decompressor_after_end() {
    for backend in backends() {
        let mut d = Decompressor::with_backend(backend, 47, None).unwrap();
        d.decompress(&packed(backend, 31), None).unwrap();
        let err = d.decompress(b"", None).unwrap_err();
        assert_eq!(err, CompressionError::end_of_stream());
    }
}

#[test]
fn finished_compressor_in_a_session() {
    let session = Session::new(CompressionEngine::with_backend(Backend::Managed, &CompressOptions::default()).unwrap());
    session.compress(b"data").unwrap();
    session.flush(Flush::Finish).unwrap();
    assert!(session.is_released());
    let err = session.flush(Flush::Sync).unwrap_err();
    assert!(err.is_state());
    assert!(session.copy().is_err());
}

#[test]
fn trees_flush_is_rejected() {
    for backend in backends() {
        let mut c = CompressionEngine::with_backend(backend, &CompressOptions::default()).unwrap();
        let err = c.flush(Flush::Trees).unwrap_err();
        assert!(err.is_state(), "{err:?}");
        assert!(!c.is_released());
        c.compress(b"still usable").unwrap();
        let out = c.finish().unwrap();
        assert_eq!(decompress_with_backend(backend, &out, 15, 0).unwrap(), b"still usable");
    }
}
