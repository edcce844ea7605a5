//! Progress hooks for cache building.
//!
//! The loaders report through [`ProgressCallback`] and never draw anything
//! themselves. The CLI renders the hooks with `indicatif`; tests pass
//! [`NullProgress`].

/// Receives step counts and status text from [`crate::DataLoader`].
pub trait ProgressCallback: Send + Sync {
    /// Number of steps the operation will take.
    fn set_total(&self, total: u64);

    /// `delta` more steps are done.
    fn inc(&self, delta: u64);

    /// Describes the step in progress.
    fn set_message(&self, msg: String);

    /// Completes the indicator, leaving `msg` behind.
    fn finish(&self, msg: String);

    /// Completes the indicator and removes it.
    fn finish_and_clear(&self);
}

/// Drops every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}
