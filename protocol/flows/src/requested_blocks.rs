use duskdag_hashes::Hash;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// The process-wide set of hashes some peer flow currently has an
/// in-flight `GetRelayBlocks` request for (§4.8/C13). Guarantees at most one
/// in-flight request per hash across all peers (§5 ordering guarantee (b)).
/// Small and short-lived, so a plain mutex is enough — matching the
/// teacher's choice of a plain mutex for similarly small, uncontended
/// netadapter-adjacent state.
#[derive(Default)]
pub struct RequestedBlocks {
    inner: Mutex<HashSet<Hash>>,
}

impl RequestedBlocks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Inserts `hash` if it isn't already pending. Returns `true` if this
    /// call is the one that now owns the in-flight request.
    pub fn add_if_not_exists(&self, hash: Hash) -> bool {
        self.inner.lock().insert(hash)
    }

    pub fn remove(&self, hash: &Hash) {
        self.inner.lock().remove(hash);
    }

    pub fn remove_set(&self, hashes: &[Hash]) {
        let mut guard = self.inner.lock();
        for hash in hashes {
            guard.remove(hash);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

/// RAII guard around a batch of hashes just inserted into [`RequestedBlocks`]
/// by one `request_blocks` call: its `Drop` impl releases exactly the hashes
/// this invocation still owns, on every exit path — normal return, an early
/// `?`, or (were this Go) a panic — the direct analogue of the source's
/// `defer requestedBlocks.removeSet(pendingBlocks)` (SPEC_FULL §3).
pub struct PendingBlocksGuard {
    registry: Arc<RequestedBlocks>,
    pending: Vec<Hash>,
}

impl PendingBlocksGuard {
    pub fn new(registry: Arc<RequestedBlocks>, pending: Vec<Hash>) -> Self {
        Self { registry, pending }
    }

    pub fn pending(&self) -> &[Hash] {
        &self.pending
    }

    /// Marks `hash` as resolved (block received and processed) so it's no
    /// longer released a second time when the guard drops.
    pub fn resolve(&mut self, hash: &Hash) {
        self.registry.remove(hash);
        self.pending.retain(|h| h != hash);
    }
}

impl Drop for PendingBlocksGuard {
    fn drop(&mut self) {
        self.registry.remove_set(&self.pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_requests_are_rejected() {
        let registry = RequestedBlocks::new();
        let hash = Hash::from_u64_word(1);
        assert!(registry.add_if_not_exists(hash));
        assert!(!registry.add_if_not_exists(hash));
    }

    #[test]
    fn guard_drop_releases_whatever_is_still_pending() {
        let registry = RequestedBlocks::new();
        let a = Hash::from_u64_word(1);
        let b = Hash::from_u64_word(2);
        registry.add_if_not_exists(a);
        registry.add_if_not_exists(b);

        {
            let mut guard = PendingBlocksGuard::new(registry.clone(), vec![a, b]);
            guard.resolve(&a);
            assert_eq!(registry.len(), 1);
        }

        assert!(registry.is_empty());
    }

    #[test]
    fn guard_releases_on_early_return_too() {
        let registry = RequestedBlocks::new();
        let hash = Hash::from_u64_word(1);
        registry.add_if_not_exists(hash);

        fn scoped(registry: Arc<RequestedBlocks>, hash: Hash) -> Result<(), ()> {
            let _guard = PendingBlocksGuard::new(registry, vec![hash]);
            Err(())
        }

        let _ = scoped(registry.clone(), hash);
        assert!(registry.is_empty());
    }
}
