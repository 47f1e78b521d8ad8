// e2e/interop.rs: streams exchanged with flate2's encoders and decoders
//
// Every stream written by either backend must be readable by flate2, and
// every stream flate2 writes (including gzip headers with a file name,
// comment and extra field) must be readable by both backends.

#![cfg(feature = "native")]

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder, MultiGzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::{Compression, GzBuilder};
use zlibr::backend::Backend;
use zlibr::engine::{CompressOptions, CompressionEngine, Decompressor};
use zlibr::oneshot::{compress_with_backend, decompress_with_backend};
use zlibr::types::Flush;

fn corpus() -> Vec<u8> {
    let mut data = Vec::new();
    for i in 0..3000u32 {
        data.extend_from_slice(format!("{i:05} interop line with some repetition\n").as_bytes());
    }
    data
}

// ── 1. zlibr writes, flate2 reads ────────────────────────────────────────────

#[test]
fn flate2_reads_every_framing() {
    let data = corpus();
    for backend in Backend::ALL {
        for level in [0, 1, 6, 9] {
            let mut out = Vec::new();
            let raw = compress_with_backend(backend, &data, level, -15).unwrap();
            DeflateDecoder::new(&raw[..]).read_to_end(&mut out).unwrap();
            assert_eq!(out, data, "{backend} raw {level}");

            out.clear();
            let zlib = compress_with_backend(backend, &data, level, 15).unwrap();
            ZlibDecoder::new(&zlib[..]).read_to_end(&mut out).unwrap();
            assert_eq!(out, data, "{backend} zlib {level}");

            out.clear();
            let gz = compress_with_backend(backend, &data, level, 31).unwrap();
            GzDecoder::new(&gz[..]).read_to_end(&mut out).unwrap();
            assert_eq!(out, data, "{backend} gzip {level}");
        }
    }
}

#[test]
fn flate2_reads_sync_flushed_stream() {
    let data = corpus();
    for backend in Backend::ALL {
        let mut engine = CompressionEngine::with_backend(backend, &CompressOptions::default().wbits(31)).unwrap();
        let mut gz = Vec::new();
        for chunk in data.chunks(10_000) {
            gz.extend(engine.compress(chunk).unwrap());
            gz.extend(engine.flush(Flush::Sync).unwrap());
        }
        gz.extend(engine.finish().unwrap());
        let mut out = Vec::new();
        GzDecoder::new(&gz[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}

#[test]
fn flate2_reads_concatenated_members() {
    let mut gz = compress_with_backend(Backend::Managed, b"first ", 6, 31).unwrap();
    gz.extend(compress_with_backend(Backend::Native, b"second", 6, 31).unwrap());
    let mut out = Vec::new();
    MultiGzDecoder::new(&gz[..]).read_to_end(&mut out).unwrap();
    assert_eq!(out, b"first second");
}

// ── 2. flate2 writes, zlibr reads ────────────────────────────────────────────

#[test]
fn both_backends_read_flate2_output() {
    let data = corpus();
    let mut raw = DeflateEncoder::new(Vec::new(), Compression::best());
    raw.write_all(&data).unwrap();
    let raw = raw.finish().unwrap();

    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::fast());
    zlib.write_all(&data).unwrap();
    let zlib = zlib.finish().unwrap();

    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(&data).unwrap();
    let gz = gz.finish().unwrap();

    for backend in Backend::ALL {
        assert_eq!(decompress_with_backend(backend, &raw, -15, 0).unwrap(), data);
        assert_eq!(decompress_with_backend(backend, &zlib, 15, 0).unwrap(), data);
        assert_eq!(decompress_with_backend(backend, &gz, 31, 0).unwrap(), data);
        assert_eq!(decompress_with_backend(backend, &gz, 47, 0).unwrap(), data);
        assert_eq!(decompress_with_backend(backend, &zlib, 47, 0).unwrap(), data);
    }
}

#[test]
fn decorated_gzip_header_from_flate2() {
    let data = corpus();
    let mut gz = GzBuilder::new()
        .filename("corpus.txt")
        .comment("written by flate2")
        .extra(vec![b'Z', b'L', 3, 0, 1, 2, 3])
        .mtime(1_700_000_000)
        .write(Vec::new(), Compression::default());
    gz.write_all(&data).unwrap();
    let gz = gz.finish().unwrap();

    for backend in Backend::ALL {
        let mut d = Decompressor::with_backend(backend, 31, None).unwrap();
        let mut out = Vec::new();
        for chunk in gz.chunks(3) {
            out.extend(d.decompress(chunk, None).unwrap());
        }
        assert!(d.eof());
        assert_eq!(out, data);
    }
}
