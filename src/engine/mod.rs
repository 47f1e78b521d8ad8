//! Stateful compression and decompression objects.
//!
//! - [`CompressionEngine`]: `compressobj` semantics (feed, flush modes,
//!   finish, copy) over either backend, with gzip member framing.
//! - [`DecompressionEngine`]: `decompressobj` semantics: deferred gzip
//!   detection, output cap, preset dictionaries, `unused_data` /
//!   `unconsumed_tail` bookkeeping, copy.
//! - [`Decompressor`]: streaming wrapper that holds leftover input between
//!   calls and reports `needs_input`.
//!
//! Copies go through the backend's snapshot when it has one. Otherwise the
//! engine replays its recorded calls into a fresh stream, which is only
//! possible while the recording is complete ([`ReplayLog`]).

pub mod compress;
pub mod decompress;
pub mod decompressor;

pub use compress::{CompressOptions, CompressionEngine};
pub use decompress::DecompressionEngine;
pub use decompressor::Decompressor;

/// Calls recorded so that a backend without a snapshot primitive can rebuild
/// a stream by replaying them.
///
/// Only the first feed is kept. Once a second one arrives the recording is
/// dropped for good and [`can_copy`](Self::can_copy) turns false.
#[derive(Debug, Clone)]
pub(crate) struct ReplayLog<T> {
    steps: Vec<T>,
    feeds: usize,
    enabled: bool,
}

impl<T> ReplayLog<T> {
    /// A log that records only when `enabled`; a disabled log never blocks
    /// copying.
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            steps: Vec::new(),
            feeds: 0,
            enabled,
        }
    }

    pub(crate) fn can_copy(&self) -> bool {
        !self.enabled || self.feeds <= 1
    }

    /// Record a call that hands input to the stream. `step` is only built
    /// when it will be kept.
    pub(crate) fn feed(&mut self, step: impl FnOnce() -> T) {
        if !self.enabled {
            return;
        }
        self.feeds += 1;
        if self.feeds > 1 {
            self.steps = Vec::new();
        } else {
            self.steps.push(step());
        }
    }

    /// Record a call that does not count as a feed (a flush).
    pub(crate) fn push(&mut self, step: T) {
        if self.enabled && self.feeds <= 1 {
            self.steps.push(step);
        }
    }

    pub(crate) fn steps(&self) -> &[T] {
        &self.steps
    }
}
