//! Single-flight download tracking.
//!
//! One atomic cell holds the handle of the download currently in flight.
//! Both call sites that touch it (the download path claiming a slot, the
//! completion watcher releasing it) go through compare-and-swap, so an
//! `update` call racing a completion event cannot corrupt the invariant.

use std::sync::atomic::{AtomicI64, Ordering};

use crate::platform::DownloadId;

/// No download in flight.
const IDLE: i64 = -1;

/// A claim holder is between winning the slot and recording its handle.
const CLAIMING: i64 = -2;

/// The at-most-one-download-in-flight cell.
pub(crate) struct ActiveDownload(AtomicI64);

impl ActiveDownload {
    pub(crate) const fn new() -> Self {
        Self(AtomicI64::new(IDLE))
    }

    /// Try to take the in-flight slot. Exactly one caller wins until the
    /// slot is released by [`complete`](Self::complete).
    pub(crate) fn try_claim(&self) -> bool {
        self.0
            .compare_exchange(IDLE, CLAIMING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Record the service-issued handle. Only the claim winner may call this.
    pub(crate) fn record(&self, id: DownloadId) {
        debug_assert!(id.0 >= 0, "service handles are non-negative");
        self.0.store(id.0, Ordering::SeqCst);
    }

    /// Whether `id` is the handle currently tracked.
    pub(crate) fn matches(&self, id: DownloadId) -> bool {
        self.0.load(Ordering::SeqCst) == id.0
    }

    /// Release the slot if `id` is still the tracked handle. Returns false
    /// when someone else already released or replaced it.
    pub(crate) fn complete(&self, id: DownloadId) -> bool {
        self.0
            .compare_exchange(id.0, IDLE, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}
