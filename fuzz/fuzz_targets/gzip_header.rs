#![no_main]
use libfuzzer_sys::fuzz_target;

use zlibr::gzip::GzipHeaderParser;

fuzz_target!(|data: &[u8]| {
    // A parsed header never claims more bytes than it was given, and parses
    // to the same length from exactly those bytes.
    if let Ok(Some(header)) = GzipHeaderParser::parse(data) {
        assert!(header.len <= data.len());
        assert_eq!(GzipHeaderParser::header_len(data), Ok(Some(header.len)));
        assert_eq!(GzipHeaderParser::parse(&data[..header.len]).map(|h| h.map(|h| h.len)), Ok(Some(header.len)));
    }
});
