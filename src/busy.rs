use std::sync::Arc;

use tokio::sync::watch;

/// Shared "work in progress" flag. Set only through a [`BusyGuard`], which
/// clears it when dropped, so every exit path of the guarded work releases it.
///
/// Backed by a `watch` channel so observers on any task can await changes
/// instead of polling [`BusyFlag::is_set`].
#[derive(Debug, Clone)]
pub struct BusyFlag(Arc<watch::Sender<bool>>);

impl BusyFlag {
    pub fn new() -> Self {
        Self(Arc::new(watch::Sender::new(false)))
    }

    pub fn is_set(&self) -> bool {
        *self.0.borrow()
    }

    /// Returns `None` while another guard is alive.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        let acquired = self.0.send_if_modified(|busy| {
            if *busy {
                false
            } else {
                *busy = true;
                true
            }
        });
        acquired.then(|| BusyGuard(Arc::clone(&self.0)))
    }

    /// Receiver that sees every change of the flag, starting from its current value.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.0.subscribe()
    }
}

impl Default for BusyFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct BusyGuard(Arc<watch::Sender<bool>>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}
