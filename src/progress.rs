//! Progress tracking and cancellation for rewrite runs.
//!
//! An [`AtomicProgress`] is shared between the thread running a
//! [`Fixer`](crate::Fixer) and any thread that wants to watch it or stop it,
//! such as a Ctrl-C handler.
//!
//! # Example
//!
//! ```rust
//! use sourcefile_fixer::progress::AtomicProgress;
//!
//! let progress = AtomicProgress::shared();
//! let handle = progress.clone();
//! std::thread::spawn(move || handle.cancel()).join().unwrap();
//! assert!(progress.is_cancelled());
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A thread-safe progress tracker using atomics.
#[derive(Debug)]
pub struct AtomicProgress {
    pass: AtomicU8,
    entries_processed: AtomicU64,
    bytes_processed: AtomicU64,
    cancelled: AtomicBool,
    start_time: Instant,
}

impl Default for AtomicProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgress {
    /// Creates a new progress tracker.
    pub fn new() -> Self {
        Self {
            pass: AtomicU8::new(0),
            entries_processed: AtomicU64::new(0),
            bytes_processed: AtomicU64::new(0),
            cancelled: AtomicBool::new(false),
            start_time: Instant::now(),
        }
    }

    /// Creates a shared progress tracker.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The pass currently running: 0 before the run, then 1 or 2.
    pub fn pass(&self) -> u8 {
        self.pass.load(Ordering::Relaxed)
    }

    /// Entries seen in the current pass.
    pub fn entries_processed(&self) -> u64 {
        self.entries_processed.load(Ordering::Relaxed)
    }

    /// Uncompressed entry bytes seen in the current pass.
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed.load(Ordering::Relaxed)
    }

    /// Returns whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Requests cancellation.
    ///
    /// The run stops at the next entry and publishes no output.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Returns elapsed time since creation.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub(crate) fn start_pass(&self, pass: u8) {
        self.pass.store(pass, Ordering::Relaxed);
        self.entries_processed.store(0, Ordering::Relaxed);
        self.bytes_processed.store(0, Ordering::Relaxed);
    }

    pub(crate) fn record_entry(&self, bytes: u64) {
        self.entries_processed.fetch_add(1, Ordering::Relaxed);
        self.bytes_processed.fetch_add(bytes, Ordering::Relaxed);
    }
}
