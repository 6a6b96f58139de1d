use crate::errors::StoreAccessError;
use crate::model::{GhostdagStoreReader, HeaderStoreReader};
use duskdag_hashes::Hash;

/// Computes the past median time used to reject blocks with implausible
/// timestamps (§4.6/C6): the median timestamp over a window walked back
/// along the selected-parent chain. This is the classic full/unsampled
/// window variant — every block in the window contributes one timestamp, as
/// opposed to the modern sampled variant that skips blocks at increasing
/// strides once the window grows large.
#[derive(Debug, Clone, Copy)]
pub struct FullPastMedianTimeManager {
    window_size: u64,
}

impl FullPastMedianTimeManager {
    pub fn new(window_size: u64) -> Self {
        Self { window_size }
    }

    /// The past median time as seen from `selected_parent` (i.e. the
    /// selected parent and its own selected-parent chain ancestors, not
    /// the new block itself).
    pub fn calc_past_median_time(
        &self,
        headers: &dyn HeaderStoreReader,
        ghostdag: &dyn GhostdagStoreReader,
        selected_parent: Hash,
    ) -> Result<i64, StoreAccessError> {
        let mut timestamps = Vec::with_capacity(self.window_size as usize);
        let mut current = selected_parent;
        loop {
            timestamps.push(headers.timestamp(current)?);
            if timestamps.len() as u64 >= self.window_size {
                break;
            }
            let data = ghostdag.get(current)?;
            if data.selected_parent == current {
                break;
            }
            current = data.selected_parent;
        }
        timestamps.sort_unstable();
        // §4.6: ties (even-sized windows) resolve to the lower-indexed of the
        // two middle values once sorted ascending.
        Ok(timestamps[(timestamps.len() - 1) / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockNode, GhostdagData, GhostdagStore, HeaderStore, InMemoryBlockStore, RelationsStore};
    use duskdag_consensus_core::{blockhash::NONE, BlockHashSet, Header};
    use std::sync::Arc;

    fn push(store: &mut InMemoryBlockStore, word: u64, timestamp: i64, parent: Option<Hash>) -> Hash {
        let parents = parent.into_iter().collect::<Vec<_>>();
        let h = Arc::new(Header {
            hash: Hash::from_u64_word(word),
            version: 1,
            parents: parents.clone(),
            hash_merkle_root: NONE,
            accepted_id_merkle_root: NONE,
            utxo_commitment: NONE,
            time_in_milliseconds: timestamp,
            bits: 0x207fffff,
            nonce: 0,
        });
        let hash = h.hash;
        if let Some(p) = parent {
            HeaderStore::insert(store, h.clone());
            RelationsStore::insert(store, hash, BlockHashSet::from_iter([p])).unwrap();
            let prev = GhostdagStoreReader::get(store, p).unwrap();
            GhostdagStore::insert(
                store,
                hash,
                Arc::new(GhostdagData {
                    blue_score: prev.blue_score + 1,
                    selected_parent: p,
                    blue_set: vec![],
                    red_set: Default::default(),
                    blue_anticone_sizes: Default::default(),
                }),
            );
        } else {
            HeaderStore::insert(store, h.clone());
            store.insert_root(BlockNode::new(h), Arc::new(GhostdagData::genesis(hash)));
        }
        hash
    }

    #[test]
    fn median_of_odd_window_is_the_middle_timestamp() {
        let mut store = InMemoryBlockStore::new();
        let manager = FullPastMedianTimeManager::new(3);
        let g = push(&mut store, 0, 1000, None);
        let a = push(&mut store, 1, 2000, Some(g));
        let b = push(&mut store, 2, 3000, Some(a));

        let median = manager.calc_past_median_time(&store, &store, b).unwrap();
        assert_eq!(median, 2000);
    }

    #[test]
    fn window_shrinks_gracefully_near_genesis() {
        let mut store = InMemoryBlockStore::new();
        let manager = FullPastMedianTimeManager::new(5);
        let g = push(&mut store, 0, 500, None);
        let a = push(&mut store, 1, 1500, Some(g));

        let median = manager.calc_past_median_time(&store, &store, a).unwrap();
        assert_eq!(median, 1500);
    }
}
