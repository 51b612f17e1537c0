//! Caller-driven cancellation for blocking calls.
//!
//! A [`CancelHandle`] flips a shared flag; every [`CancelToken`] cloned from
//! the pair observes it. Dropping the handle without cancelling leaves the
//! tokens pending forever, so a token with no live handle never fires.

use tokio::sync::watch;

/// Sender half: cancels every token created from the same pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Receiver half, cheap to clone and pass into calls.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

/// Create a linked handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

impl CancelHandle {
    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelToken {
    /// A token that never fires.
    pub fn never() -> Self {
        let (_, token) = cancel_pair();
        token
    }

    /// Whether cancellation has already been signalled.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                // handle dropped without cancelling
                std::future::pending::<()>().await;
            }
        }
    }
}
