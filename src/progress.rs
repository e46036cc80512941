//! Progress-callback trait for per-item composition events.
//!
//! Attach an [`Arc<dyn ComposeProgressCallback>`] with
//! [`crate::Composer::with_progress`] to receive events as each source file
//! is loaded and normalised. Calls happen synchronously on the composing
//! thread, in input order.
//!
//! # Example
//!
//! ```rust
//! use edgequake_collage::ComposeProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ComposeProgressCallback for CountingCallback {
//!     fn on_item_complete(&self, index: usize, total: usize, source: &std::path::Path) {
//!         let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{}/{} {} ({done} done)", index, total, source.display());
//!     }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

/// Which composer operation a batch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Collage,
    Resize,
    Document,
}

/// Called by the composers as they work through a batch.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ComposeProgressCallback: Send + Sync {
    /// Called once after filtering, before the first source is read.
    ///
    /// # Arguments
    /// * `kind` : the operation running
    /// * `total`: number of sources that will be processed
    fn on_batch_start(&self, kind: BatchKind, total: usize) {
        let _ = (kind, total);
    }

    /// Called when a source has been loaded and normalised.
    ///
    /// # Arguments
    /// * `index` : 1-indexed position in the processed batch
    /// * `total` : total sources in the batch
    /// * `source`: the source file
    fn on_item_complete(&self, index: usize, total: usize, source: &Path) {
        let _ = (index, total, source);
    }

    /// Called once the artifact (if any) has been written.
    ///
    /// # Arguments
    /// * `kind`  : the operation that ran
    /// * `output`: the written file, `None` when nothing was produced
    fn on_batch_complete(&self, kind: BatchKind, output: Option<&Path>) {
        let _ = (kind, output);
    }
}

/// A no-op implementation; the default when no callback is attached.
pub struct NoopProgressCallback;

impl ComposeProgressCallback for NoopProgressCallback {}

/// Shared handle stored by [`crate::Composer`].
pub type ProgressCallback = Arc<dyn ComposeProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        started_total: AtomicUsize,
        completes: AtomicUsize,
        outputs: Mutex<Vec<Option<String>>>,
    }

    impl ComposeProgressCallback for TrackingCallback {
        fn on_batch_start(&self, _kind: BatchKind, total: usize) {
            self.started_total.store(total, Ordering::SeqCst);
        }

        fn on_item_complete(&self, _index: usize, _total: usize, _source: &Path) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _kind: BatchKind, output: Option<&Path>) {
            self.outputs
                .lock()
                .unwrap()
                .push(output.map(|p| p.display().to_string()));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(BatchKind::Collage, 5);
        cb.on_item_complete(1, 5, Path::new("a.jpg"));
        cb.on_batch_complete(BatchKind::Collage, None);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_batch_start(BatchKind::Document, 3);
        for i in 1..=3 {
            tracker.on_item_complete(i, 3, Path::new("x.jpg"));
        }
        tracker.on_batch_complete(BatchKind::Document, Some(Path::new("out.pdf")));
        tracker.on_batch_complete(BatchKind::Document, None);

        assert_eq!(tracker.started_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 3);
        assert_eq!(
            *tracker.outputs.lock().unwrap(),
            vec![Some("out.pdf".to_string()), None]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_batch_start(BatchKind::Resize, 10);
        cb.on_item_complete(1, 10, Path::new("a.png"));
    }
}
