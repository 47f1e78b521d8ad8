// config.rs: Compile-time configuration constants and runtime overrides.
//
// Stream-level defaults follow zlib.h / zconf.h. The only runtime knob read by
// the library is ZLIBR_BACKEND, which picks the backend used when a caller
// does not name one explicitly.

use crate::backend::Backend;

// Output chunk size used by every streaming loop (DEF_BUF_SIZE in zlibmodule.c).
pub const DEF_BUF_SIZE: usize = 16 * 1024;

// Largest window size exponent (MAX_WBITS in zconf.h).
pub const MAX_WBITS: i32 = 15;

// Default memLevel (DEF_MEM_LEVEL in zutil.h).
pub const DEF_MEM_LEVEL: i32 = 8;

// Maximum memLevel accepted by deflateInit2 (MAX_MEM_LEVEL in zconf.h).
pub const MAX_MEM_LEVEL: i32 = 9;

// Bytes a gzip decompressor buffers before it tries to parse the member
// header: the fixed 10-byte header plus one payload byte.
pub const GZIP_DETECT_THRESHOLD: usize = 11;

// Output cap used when a caller passes max_length == 0 ("unbounded").
pub const MAX_LENGTH_SENTINEL: usize = i32::MAX as usize;

// Environment variable consulted by `default_backend`.
pub const BACKEND_ENV: &str = "ZLIBR_BACKEND";

// Compile-time default backend: native when the `native` feature is built in.
pub const DEFAULT_BACKEND: Backend = if cfg!(feature = "native") {
    Backend::Native
} else {
    Backend::Managed
};

/// Backend used when the caller does not pick one.
///
/// `ZLIBR_BACKEND=native|managed` overrides the compile-time default. A
/// request for `native` in a build without the `native` feature falls back to
/// the managed backend with a warning.
pub fn default_backend() -> Backend {
    match std::env::var(BACKEND_ENV) {
        Ok(value) => match value.parse::<Backend>() {
            Ok(backend) if backend.is_available() => backend,
            Ok(backend) => {
                tracing::warn!(requested = %backend, "backend not compiled in, using managed");
                Backend::Managed
            }
            Err(_) => {
                tracing::warn!(value = %value, "unrecognised {BACKEND_ENV}, using default");
                DEFAULT_BACKEND
            }
        },
        Err(_) => DEFAULT_BACKEND,
    }
}
