//! One-shot process signals ("application started", "shutdown requested").

use tokio::sync::watch;

/// Owning side of a one-shot signal. Triggering is permanent.
#[derive(Debug)]
pub struct Latch {
    tx: watch::Sender<bool>,
}

/// Observing side of a [`Latch`]. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct LatchHandle {
    rx: watch::Receiver<bool>,
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}

impl Latch {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Fires the signal. Repeated calls are no-ops.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn handle(&self) -> LatchHandle {
        LatchHandle {
            rx: self.tx.subscribe(),
        }
    }
}

impl LatchHandle {
    /// A handle whose latch can never fire.
    pub fn detached() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the latch fires.
    ///
    /// If the owning [`Latch`] is dropped untriggered this never resolves.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
