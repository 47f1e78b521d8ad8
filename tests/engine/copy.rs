// Integration tests for copying engines.
//
// The managed backend snapshots its state at any point. The native backend
// rebuilds a copy by replaying recorded calls, which stops working after the
// second feed and then reports CloneUnsupported.

use zlibr::backend::Backend;
use zlibr::engine::{CompressOptions, CompressionEngine, DecompressionEngine};
use zlibr::error::CompressionError;
use zlibr::oneshot::{compress_with_backend, decompress_with_backend};
use zlibr::types::Flush;

fn corpus() -> Vec<u8> {
    b"copying a stream keeps both halves independent. ".repeat(400)
}

#[test]
fn managed_compressor_copies_after_many_feeds() {
    let data = corpus();
    let (head, tail) = data.split_at(data.len() / 2);
    let mut a = CompressionEngine::with_backend(Backend::Managed, &CompressOptions::default().wbits(31)).unwrap();
    let mut prefix = Vec::new();
    for chunk in head.chunks(1000) {
        prefix.extend(a.compress(chunk).unwrap());
    }
    assert!(a.can_copy());
    let mut b = a.copy().unwrap();

    let mut out_a = prefix.clone();
    out_a.extend(a.compress(tail).unwrap());
    out_a.extend(a.finish().unwrap());

    let mut out_b = prefix;
    out_b.extend(b.compress(b"a different ending").unwrap());
    out_b.extend(b.finish().unwrap());

    assert_eq!(decompress_with_backend(Backend::Managed, &out_a, 31, 0).unwrap(), data);
    let mut expected = head.to_vec();
    expected.extend_from_slice(b"a different ending");
    assert_eq!(decompress_with_backend(Backend::Managed, &out_b, 31, 0).unwrap(), expected);
}

#[test]
fn released_engines_refuse_copy() {
    let mut c = CompressionEngine::with_backend(Backend::Managed, &CompressOptions::default()).unwrap();
    c.finish().unwrap();
    let err = c.copy().unwrap_err();
    assert!(err.is_state());
    assert_eq!(err.to_string(), "inconsistent stream state");

    let mut d = DecompressionEngine::with_backend(Backend::Managed, 15, None).unwrap();
    d.flush(16).unwrap();
    assert_eq!(d.copy().unwrap_err().to_string(), "inconsistent stream state");
}

#[test]
fn managed_decompressor_copy_mid_stream() {
    let data = corpus();
    let packed = compress_with_backend(Backend::Managed, &data, 6, 15).unwrap();
    let (x, y) = packed.split_at(packed.len() / 3);
    let mut a = DecompressionEngine::with_backend(Backend::Managed, 15, None).unwrap();
    let mut head = a.decompress(&x[..20], 0).unwrap();
    head.extend(a.decompress(&x[20..], 0).unwrap());
    let mut b = a.copy().unwrap();

    let rest_a = a.decompress(y, 0).unwrap();
    let rest_b = b.decompress(y, 0).unwrap();
    assert_eq!(rest_a, rest_b);
    assert_eq!([head, rest_a].concat(), data);
    assert!(a.eof() && b.eof());
}

#[cfg(feature = "native")]
mod native {
    use super::*;

    #[test]
    fn compressor_copy_by_replay() {
        let mut a = CompressionEngine::with_backend(Backend::Native, &CompressOptions::default()).unwrap();
        let mut prefix = a.flush(Flush::Sync).unwrap();
        prefix.extend(a.compress(b"replayed prefix ").unwrap());
        assert!(a.can_copy());
        let mut b = a.copy().unwrap();

        let mut out_b = prefix;
        out_b.extend(b.compress(b"and copy").unwrap());
        out_b.extend(b.finish().unwrap());
        assert_eq!(decompress_with_backend(Backend::Native, &out_b, 15, 0).unwrap(), b"replayed prefix and copy");
    }

    #[test]
    fn compressor_copy_refused_after_second_feed() {
        let mut a = CompressionEngine::with_backend(Backend::Native, &CompressOptions::default()).unwrap();
        a.feed(b"one").unwrap();
        a.feed(b"two").unwrap();
        assert!(!a.can_copy());
        let err = a.copy().unwrap_err();
        assert_eq!(err, CompressionError::CloneUnsupported { backend: Backend::Native });
        assert_eq!(err.to_string(), "native zlib backend doesn't support copying this stream");

        // The original keeps working.
        let out = a.flush(Flush::Finish).unwrap();
        assert_eq!(decompress_with_backend(Backend::Native, &out, 15, 0).unwrap(), b"onetwo");
    }

    #[test]
    fn decompressor_copy_by_replay() {
        let data = corpus();
        let packed = compress_with_backend(Backend::Native, &data, 6, 15).unwrap();
        let third = packed.len() / 3;
        let (x, rest) = packed.split_at(third);
        let (y, z) = rest.split_at(third);
        let mut a = DecompressionEngine::with_backend(Backend::Native, 15, None).unwrap();
        let head = a.decompress(x, 0).unwrap();
        let mut b = a.copy().unwrap();
        assert_eq!([head.clone(), b.decompress(rest, 0).unwrap()].concat(), data);

        let mid = a.decompress(y, 0).unwrap();
        assert!(!a.can_copy());
        assert!(matches!(a.copy(), Err(CompressionError::CloneUnsupported { .. })));
        assert_eq!([head, mid, a.decompress(z, 0).unwrap()].concat(), data);

        // A finished stream has no decoder state left to copy.
        assert!(a.can_copy());
        assert!(a.copy().unwrap().eof());
    }
}
