use duskdag_consensus_core::BlockHashSet;
use duskdag_hashes::Hash;
use std::collections::VecDeque;

/// A FIFO queue of hashes still to be requested from a peer, deduplicated
/// against everything ever enqueued into *this* queue (not just what's
/// currently sitting in it) — the direct analogue of the source's
/// `hashesQueueSet`, which backs its ordering with a slice and its
/// membership check with a set so a hash already dequeued is never
/// re-enqueued by a later orphan-ancestor request (§4.8/C11).
#[derive(Default)]
pub struct HashesQueueSet {
    queue: VecDeque<Hash>,
    seen: BlockHashSet,
}

impl HashesQueueSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_if_not_exists(&mut self, hash: Hash) {
        if self.seen.insert(hash) {
            self.queue.push_back(hash);
        }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Removes and returns up to `count` hashes, in FIFO order.
    pub fn dequeue(&mut self, count: usize) -> Vec<Hash> {
        let n = count.min(self.queue.len());
        self.queue.drain(..n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_across_the_queues_whole_lifetime() {
        let mut q = HashesQueueSet::new();
        let h = Hash::from_u64_word(1);
        q.enqueue_if_not_exists(h);
        q.enqueue_if_not_exists(h);
        assert_eq!(q.len(), 1);

        q.dequeue(1);
        assert!(q.is_empty());

        // already dequeued once — re-enqueueing must not bring it back
        q.enqueue_if_not_exists(h);
        assert!(q.is_empty());
    }

    #[test]
    fn dequeue_is_fifo_and_bounded_by_available_len() {
        let mut q = HashesQueueSet::new();
        let hashes: Vec<Hash> = (1..=3).map(Hash::from_u64_word).collect();
        for &h in &hashes {
            q.enqueue_if_not_exists(h);
        }

        let taken = q.dequeue(2);
        assert_eq!(taken, hashes[..2]);
        assert_eq!(q.len(), 1);

        let rest = q.dequeue(10);
        assert_eq!(rest, hashes[2..]);
        assert!(q.is_empty());
    }
}
