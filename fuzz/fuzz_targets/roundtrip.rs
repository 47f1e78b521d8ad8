#![no_main]
use libfuzzer_sys::fuzz_target;

use zlibr::backend::Backend;
use zlibr::oneshot::{compress_with_backend, decompress_with_backend};

// The first byte picks the level and framing; the rest is the payload.
fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    let level = i32::from(selector % 10);
    let wbits = match (selector / 10) % 3 {
        0 => -15,
        1 => 15,
        _ => 31,
    };

    for backend in Backend::ALL.into_iter().filter(|b| b.is_available()) {
        let packed = compress_with_backend(backend, payload, level, wbits)
            .unwrap_or_else(|e| panic!("{backend} compress failed: {e}"));
        // Every available backend must read every other backend's output.
        for reader in Backend::ALL.into_iter().filter(|b| b.is_available()) {
            let plain = decompress_with_backend(reader, &packed, wbits, 0)
                .unwrap_or_else(|e| panic!("{reader} could not read {backend} output: {e}"));
            assert_eq!(plain, payload, "{backend} -> {reader} round-trip mismatch");
        }
    }
});
