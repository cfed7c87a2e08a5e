use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared network-reachability flag.
///
/// The library does not watch the network itself; the host shell owns
/// the platform monitor and flips this flag, while the client and the
/// synchronizer read it. Clones share the same underlying flag.
/// Defaults to reachable.
#[derive(Debug, Clone)]
pub struct Reachability {
    reachable: Arc<AtomicBool>,
}

impl Reachability {
    pub fn new() -> Self {
        Self {
            reachable: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

impl Default for Reachability {
    fn default() -> Self {
        Self::new()
    }
}
