// Integration tests for the stream-level io API: compress_stream and
// decompress_stream driven from in-memory readers and writers.

use std::io::{self, Read};

use zlibr::backend::Backend;
use zlibr::io::{compress_stream, decompress_stream, Prefs};
use zlibr::types::Framing;

fn prefs(backend: Backend, framing: Framing) -> Prefs {
    Prefs {
        backend,
        framing,
        buffer_size: 777,
        ..Prefs::default()
    }
}

fn backends() -> impl Iterator<Item = Backend> {
    Backend::ALL.into_iter().filter(|b| b.is_available())
}

fn sample() -> Vec<u8> {
    (0..60_000u32).map(|i| (i % 251) as u8 ^ (i / 3000) as u8).collect()
}

/// A reader that hands out at most `step` bytes per call.
struct Trickle<'a> {
    data: &'a [u8],
    step: usize,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.step.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

#[test]
fn stream_round_trip_every_framing() {
    let data = sample();
    for backend in backends() {
        for framing in [Framing::Raw, Framing::Zlib, Framing::Gzip] {
            let p = prefs(backend, framing);
            let mut packed = Vec::new();
            let c = compress_stream(&mut Trickle { data: &data, step: 4099 }, &mut packed, 6, &p).unwrap();
            assert_eq!(c.bytes_in, data.len() as u64);
            assert_eq!(c.bytes_out, packed.len() as u64);
            assert!(c.ratio() < 100.0);

            let mut out = Vec::new();
            let d = decompress_stream(&mut Trickle { data: &packed, step: 13 }, &mut out, &p).unwrap();
            assert_eq!(out, data, "{backend} {framing}");
            assert_eq!(d.bytes_in, packed.len() as u64);
            assert_eq!(d.bytes_out, data.len() as u64);
            assert_eq!(d.members, 1);
            assert_eq!(d.trailing, 0);
        }
    }
}

#[test]
fn auto_framing_compresses_gzip_and_reads_either() {
    let data = b"auto framing".repeat(100);
    let p = prefs(Backend::Managed, Framing::Auto);
    let mut packed = Vec::new();
    compress_stream(&mut &data[..], &mut packed, 6, &p).unwrap();
    assert_eq!(&packed[..2], &[0x1f, 0x8b]);

    let zlib = zlibr::oneshot::compress_with_backend(Backend::Managed, &data, 6, 15).unwrap();
    for input in [&packed, &zlib] {
        let mut out = Vec::new();
        decompress_stream(&mut &input[..], &mut out, &p).unwrap();
        assert_eq!(out, data);
    }
}

#[test]
fn concatenated_gzip_members() {
    for backend in backends() {
        let p = prefs(backend, Framing::Gzip);
        let mut packed = Vec::new();
        for part in [&b"alpha "[..], b"beta ", b"gamma"] {
            compress_stream(&mut &part[..], &mut packed, 6, &p).unwrap();
        }
        let mut out = Vec::new();
        let stats = decompress_stream(&mut Trickle { data: &packed, step: 5 }, &mut out, &p).unwrap();
        assert_eq!(out, b"alpha beta gamma");
        assert_eq!(stats.members, 3);
    }
}

#[test]
fn zlib_stream_with_trailing_garbage() {
    let p = prefs(Backend::Managed, Framing::Zlib);
    let mut packed = zlibr::oneshot::compress_with_backend(Backend::Managed, b"payload", 6, 15).unwrap();
    packed.extend_from_slice(&[0x1f, 0x8b, 0, 0, 0]);
    let mut out = Vec::new();
    let stats = decompress_stream(&mut &packed[..], &mut out, &p).unwrap();
    assert_eq!(out, b"payload");
    assert_eq!(stats.members, 1);
    assert_eq!(stats.trailing, 5);
}

#[test]
fn truncated_stream_writes_prefix_then_fails() {
    let data = sample();
    for backend in backends() {
        let p = prefs(backend, Framing::Gzip);
        let mut packed = Vec::new();
        compress_stream(&mut &data[..], &mut packed, 6, &p).unwrap();
        packed.truncate(packed.len() / 2);

        let mut out = Vec::new();
        let err = decompress_stream(&mut &packed[..], &mut out, &p).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("incomplete or truncated stream"));
        assert!(!out.is_empty());
        assert!(data.starts_with(&out));
    }
}

#[test]
fn corrupt_stream_is_invalid_data() {
    let p = prefs(Backend::Managed, Framing::Zlib);
    let mut out = Vec::new();
    let err = decompress_stream(&mut &b"\x78\x9cnot deflate at all"[..], &mut out, &p).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn preset_dictionary_through_prefs() {
    let dict = b"common prefix shared by every record: ".to_vec();
    for backend in backends() {
        let p = Prefs {
            dictionary: Some(dict.clone()),
            ..prefs(backend, Framing::Zlib)
        };
        let record = b"common prefix shared by every record: 42";
        let mut packed = Vec::new();
        compress_stream(&mut &record[..], &mut packed, 9, &p).unwrap();
        let mut out = Vec::new();
        decompress_stream(&mut &packed[..], &mut out, &p).unwrap();
        assert_eq!(out, record);
    }
}
