//! DEFLATE format tables (RFC 1951 section 3.2.5 and 3.2.6).

/// Maximum bits in a literal/length or distance code.
pub const MAX_BITS: usize = 15;
/// Maximum bits in a code-length code.
pub const MAX_CL_BITS: usize = 7;

/// Literal/length alphabet size actually usable in a block (0..=285).
pub const L_CODES: usize = 286;
/// Distance alphabet size actually usable in a block (0..=29).
pub const D_CODES: usize = 30;
/// Code-length alphabet size.
pub const CL_CODES: usize = 19;

pub const END_BLOCK: u16 = 256;

pub const MIN_MATCH: usize = 3;
pub const MAX_MATCH: usize = 258;

/// Largest payload of a single stored block.
pub const MAX_STORED: usize = 65_535;

/// Block types (BTYPE).
pub const STORED_BLOCK: u32 = 0;
pub const STATIC_TREES: u32 = 1;
pub const DYN_TREES: u32 = 2;

/// Order of code length code lengths in a dynamic block header.
pub const CL_ORDER: [usize; CL_CODES] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Base lengths for length symbols 257..=285.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Extra bits for length symbols 257..=285.
pub const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Base distances for distance symbols 0..=29.
pub const DIST_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for distance symbols 0..=29.
pub const DIST_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Static literal/length code lengths (all 288 symbols, 286 and 287 unused).
pub const FIXED_LIT_LENGTHS: [u8; 288] = {
    let mut lengths = [0u8; 288];
    let mut i = 0;
    while i < 288 {
        lengths[i] = if i < 144 {
            8
        } else if i < 256 {
            9
        } else if i < 280 {
            7
        } else {
            8
        };
        i += 1;
    }
    lengths
};

/// Static distance code lengths (32 symbols, 30 and 31 unused).
pub const FIXED_DIST_LENGTHS: [u8; 32] = [5; 32];

/// Length symbol index (0..=28, i.e. symbol - 257) for a match length.
#[inline]
pub fn length_index(len: usize) -> usize {
    debug_assert!((MIN_MATCH..=MAX_MATCH).contains(&len));
    if len == MAX_MATCH {
        return 28;
    }
    LENGTH_BASE[..28]
        .iter()
        .rposition(|&base| usize::from(base) <= len)
        .unwrap_or(0)
}

/// Distance symbol (0..=29) for a match distance.
#[inline]
pub fn dist_index(dist: usize) -> usize {
    debug_assert!((1..=32_768).contains(&dist));
    DIST_BASE
        .iter()
        .rposition(|&base| usize::from(base) <= dist)
        .unwrap_or(0)
}
