//! Network reachability signal.
//!
//! The host platform owns actual reachability detection (NetInfo on mobile,
//! interface watching on desktop) and feeds the result into
//! [`ConnectivityMonitor`]. Consumers read the current state or subscribe to
//! change notifications; the monitor only notifies when the value actually
//! flips.

use tokio::sync::watch;

pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx }
    }

    /// Feed the current reachability state. Subscribers are only woken when
    /// the state changes.
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}
