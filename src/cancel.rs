//! Caller-driven cancellation for in-flight requests.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::{Error, Result};

/// A cloneable signal that aborts every request it was handed to.
///
/// Cancelling is sticky: once [`cancel`](Self::cancel) has been called, every
/// clone reports cancelled and any request using it fails with
/// [`Error::Cancelled`].
///
/// # Examples
///
/// ```
/// use redmine_client::CancellationToken;
///
/// let token = CancellationToken::new();
/// let child = token.clone();
/// token.cancel();
/// assert!(child.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    state: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    /// Creates a token that is not cancelled yet.
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Signals cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.state.send_replace(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.state.borrow()
    }

    /// Completes when the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `fut` unless `token` fires first.
pub(crate) async fn run_cancellable<F, T>(token: Option<&CancellationToken>, fut: F) -> Result<T>
where
    F: Future<Output = T>,
{
    let Some(token) = token else {
        return Ok(fut.await);
    };

    if token.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        value = fut => Ok(value),
    }
}
