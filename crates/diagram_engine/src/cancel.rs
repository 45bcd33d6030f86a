use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Liveness token handed to every render call.
///
/// Cancelling marks the consuming view as gone; a render that observes the
/// token afterwards reports [`crate::RenderOutcome::Cancelled`] and its result
/// is never written.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
