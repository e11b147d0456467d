//! Shared status container components can watch.

use std::sync::Arc;

use stela_primitives::l1::L1Status;
use tokio::sync::watch;

/// Handle around the current [`L1Status`].  The reader task writes it, RPC
/// and UI surfaces read or watch it.
#[derive(Debug, Clone)]
pub struct StatusChannel {
    tx: Arc<watch::Sender<L1Status>>,
    rx: watch::Receiver<L1Status>,
}

impl StatusChannel {
    pub fn new(initial: L1Status) -> Self {
        let (tx, rx) = watch::channel(initial);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Snapshot of the current status.
    pub fn get_l1_status(&self) -> L1Status {
        self.rx.borrow().clone()
    }

    /// Applies a mutation to the status and notifies watchers.
    pub fn update_l1_status(&self, f: impl FnOnce(&mut L1Status)) {
        self.tx.send_modify(f);
    }

    /// New receiver for callers that want change notifications.
    pub fn subscribe(&self) -> watch::Receiver<L1Status> {
        self.tx.subscribe()
    }
}

impl Default for StatusChannel {
    fn default() -> Self {
        Self::new(L1Status::default())
    }
}
