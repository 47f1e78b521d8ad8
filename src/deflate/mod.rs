//! In-crate DEFLATE codec used by the managed backend.
//!
//! | Module      | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | [`tables`]  | RFC 1951 length/distance tables, static code lengths  |
//! | [`huffman`] | bit I/O, canonical codes, table decoder               |
//! | [`encode`]  | incremental LZ77 + Huffman encoder, zlib wrapper      |
//! | [`inflate`] | resumable decoder, zlib wrapper, preset dictionaries  |
//!
//! Both halves are plain owned data and derive `Clone`, which is what lets
//! the managed backend snapshot a live stream.

pub mod encode;
pub mod huffman;
pub mod inflate;
pub mod tables;

pub use encode::{DeflateError, DeflateStatus, Deflater};
pub use inflate::{DictionaryRejected, InflateError, InflateProgress, InflateStatus, Inflater};
