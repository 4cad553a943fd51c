//! Session-wide cancellation
//!
//! One scope exists per session. Once signaled it stays signaled; the
//! scheduler checks it at every loop head, timers check it before firing
//! and the event sink checks it before delivering.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct CancellationScope {
    token: CancellationToken,
    /// Set by the first `cancel()` only
    signaled: Arc<AtomicBool>,
}

impl CancellationScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation
    ///
    /// Safe to call from any task or thread, any number of times. Returns
    /// true only for the call that actually signaled.
    pub fn cancel(&self) -> bool {
        let first = !self.signaled.swap(true, Ordering::SeqCst);
        self.token.cancel();
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the scope is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}
