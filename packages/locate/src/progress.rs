//! Progress reporting for batch lookups.
//!
//! [`ProgressCallback`] keeps the locate pass independent of how progress
//! is shown. The CLI renders it with `indicatif`; the server and tests use
//! [`NullProgress`].

/// Receives progress updates from a batch lookup.
///
/// Implementations are shared across tasks, so they must be
/// `Send + Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of lookups the batch will perform.
    fn set_total(&self, total: u64);

    /// Records `delta` settled lookups.
    fn inc(&self, delta: u64);

    /// Replaces the status message.
    fn set_message(&self, msg: String);

    /// Marks the batch complete with a summary message.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
