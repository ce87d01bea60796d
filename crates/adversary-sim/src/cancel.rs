//! Lightweight cancellation primitive for in-flight generation requests.
//!
//! A request has no server-side abort, so cancellation means: stop waiting,
//! roll the state machine back, and guarantee the eventual completion can
//! never land (the controller's request tickets handle the latter).

use std::sync::Arc;

use tokio::sync::watch;

/// Create a connected handle/token pair.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelToken { rx })
}

/// Cloneable, Send handle that triggers cancellation.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancel every token connected to this handle. Idempotent.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// The awaited side of a cancellation pair.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Resolves once the connected handle cancels. If the handle is dropped
    /// without cancelling, this never resolves.
    pub async fn cancelled(&mut self) {
        if *self.rx.borrow() {
            return;
        }
        while self.rx.changed().await.is_ok() {
            if *self.rx.borrow() {
                return;
            }
        }
        std::future::pending::<()>().await;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}
