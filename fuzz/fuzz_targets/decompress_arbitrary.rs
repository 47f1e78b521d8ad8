#![no_main]
use libfuzzer_sys::fuzz_target;

use zlibr::backend::Backend;
use zlibr::engine::Decompressor;

// Arbitrary bytes through the streaming decompressor in small, capped
// steps. Errors are expected; panics and unbounded loops are not.
fuzz_target!(|data: &[u8]| {
    for wbits in [-15, 15, 31, 47] {
        let Ok(mut d) = Decompressor::with_backend(Backend::Managed, wbits, None) else {
            continue;
        };
        let mut produced = 0usize;
        for chunk in data.chunks(7) {
            match d.decompress(chunk, Some(64)) {
                Ok(out) => produced += out.len(),
                Err(_) => break,
            }
            while !d.eof() && !d.needs_input() {
                match d.decompress(b"", Some(64)) {
                    Ok(out) if out.is_empty() => break,
                    Ok(out) => produced += out.len(),
                    Err(_) => break,
                }
            }
            if d.eof() {
                break;
            }
        }
        // DEFLATE expands at most ~1032:1.
        assert!(produced <= data.len().saturating_mul(1100) + 64);
    }
});
