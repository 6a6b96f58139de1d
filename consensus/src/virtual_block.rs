use crate::errors::GhostdagResult;
use crate::model::{GhostdagData, GhostdagStoreReader, RelationsStoreReader};
use crate::processes::ghostdag::GhostdagManager;
use duskdag_consensus_core::{BlockHashMap, BlockHashSet};
use duskdag_hashes::Hash;

/// The result of folding a new tip into the virtual block (§4.5): the
/// selected-parent-chain blocks that fell off and the ones that replaced
/// them, both ordered from the reorg point outward. Empty when the new tip
/// didn't change the virtual's selected parent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainUpdates {
    /// Former chain blocks, ordered from the old tip back down to (but
    /// excluding) the common ancestor.
    pub removed: Vec<Hash>,
    /// New chain blocks, ordered from the common ancestor's child up to the
    /// new tip.
    pub added: Vec<Hash>,
}

impl ChainUpdates {
    pub fn is_reorg(&self) -> bool {
        !self.removed.is_empty() || !self.added.is_empty()
    }
}

/// A synthetic block whose parents are the DAG's current tips (§4.5). It is
/// never persisted as a real block; it exists only to expose "the current
/// view of the DAG" — its blue score, its selected tip, and the
/// selected-parent chain leading to that tip.
#[derive(Debug, Clone)]
pub struct VirtualBlock {
    tips: BlockHashSet,
    selected_parent_chain: Vec<Hash>,
    ghostdag_data: GhostdagData,
}

impl VirtualBlock {
    pub fn new(genesis: Hash, genesis_data: GhostdagData) -> Self {
        Self { tips: BlockHashSet::from_iter([genesis]), selected_parent_chain: vec![genesis], ghostdag_data: genesis_data }
    }

    pub fn tips(&self) -> &BlockHashSet {
        &self.tips
    }

    pub fn selected_tip(&self) -> Hash {
        *self.selected_parent_chain.last().expect("selected-parent chain always contains at least genesis")
    }

    pub fn blue_score(&self) -> u64 {
        self.ghostdag_data.blue_score
    }

    pub fn ghostdag_data(&self) -> &GhostdagData {
        &self.ghostdag_data
    }

    pub fn chain_slice(&self) -> &[Hash] {
        &self.selected_parent_chain
    }

    pub fn contains_chain_block(&self, hash: &Hash) -> bool {
        self.selected_parent_chain.contains(hash)
    }

    /// Folds a newly accepted block into the tip set: any of its parents
    /// that were themselves tips are superseded and removed, and the block
    /// itself becomes a tip. Recomputes the virtual's own GHOSTDAG data over
    /// the resulting tip set and, if the selected tip changed, walks the new
    /// selected-parent chain back to the point it diverges from the old one.
    pub fn add_tip(
        &mut self,
        manager: &GhostdagManager,
        relations: &dyn RelationsStoreReader,
        ghostdag: &dyn GhostdagStoreReader,
        new_tip: Hash,
    ) -> GhostdagResult<ChainUpdates> {
        let parents = relations.parents(new_tip)?;
        let mut tips = self.tips.clone();
        for parent in parents.iter() {
            tips.remove(parent);
        }
        tips.insert(new_tip);

        self.set_tips(manager, relations, ghostdag, tips)
    }

    /// Replaces the tip set wholesale (§4.2) — used during initial sync and
    /// when restoring a virtual from a reorg snapshot, where the caller
    /// already knows the full new tip set rather than folding in one block
    /// at a time. Recomputes the selected parent as the bluest tip and
    /// returns the same `ChainUpdates` shape `add_tip` does.
    pub fn set_tips(
        &mut self,
        manager: &GhostdagManager,
        relations: &dyn RelationsStoreReader,
        ghostdag: &dyn GhostdagStoreReader,
        tips: BlockHashSet,
    ) -> GhostdagResult<ChainUpdates> {
        self.tips = tips;

        let data = manager.calculate_block_data(relations, ghostdag, &self.tips)?;
        let new_selected_tip = data.selected_parent;
        let old_tip = self.selected_tip();

        if new_selected_tip == old_tip {
            self.ghostdag_data = data;
            return Ok(ChainUpdates::default());
        }

        let old_chain = std::mem::take(&mut self.selected_parent_chain);
        let old_positions: BlockHashMap<usize> = old_chain.iter().enumerate().map(|(i, h)| (*h, i)).collect();

        let mut added = Vec::new();
        let mut cursor = new_selected_tip;
        let common_index = loop {
            if let Some(&idx) = old_positions.get(&cursor) {
                break idx;
            }
            added.push(cursor);
            cursor = ghostdag.get(cursor)?.selected_parent;
        };
        added.reverse();

        let removed: Vec<Hash> = old_chain[common_index + 1..].iter().rev().copied().collect();
        let mut new_chain = old_chain[..=common_index].to_vec();
        new_chain.extend(added.iter().copied());

        self.selected_parent_chain = new_chain;
        self.ghostdag_data = data;

        Ok(ChainUpdates { removed, added })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockNode, GhostdagStore, HeaderStore, InMemoryBlockStore, RelationsStore};
    use duskdag_consensus_core::{blockhash::NONE, Header};
    use std::sync::Arc;

    fn push(store: &mut InMemoryBlockStore, manager: &GhostdagManager, word: u64, parents: Vec<Hash>) -> Hash {
        let h = Arc::new(Header {
            hash: Hash::from_u64_word(word),
            version: 1,
            parents: parents.clone(),
            hash_merkle_root: NONE,
            accepted_id_merkle_root: NONE,
            utxo_commitment: NONE,
            time_in_milliseconds: word as i64,
            bits: 0x207fffff,
            nonce: 0,
        });
        let hash = h.hash;
        HeaderStore::insert(store, h);
        let parent_set: BlockHashSet = parents.into_iter().collect();
        RelationsStore::insert(store, hash, parent_set.clone()).unwrap();
        let data = manager.calculate_block_data(store, store, &parent_set).unwrap();
        GhostdagStore::insert(store, hash, Arc::new(data));
        hash
    }

    fn genesis(store: &mut InMemoryBlockStore) -> Hash {
        let h = Arc::new(Header {
            hash: Hash::from_u64_word(0),
            version: 1,
            parents: vec![],
            hash_merkle_root: NONE,
            accepted_id_merkle_root: NONE,
            utxo_commitment: NONE,
            time_in_milliseconds: 0,
            bits: 0x207fffff,
            nonce: 0,
        });
        let hash = h.hash;
        HeaderStore::insert(store, h.clone());
        store.insert_root(BlockNode::new(h), Arc::new(GhostdagData::genesis(hash)));
        hash
    }

    #[test]
    fn linear_chain_never_reorgs() {
        let mut store = InMemoryBlockStore::new();
        let manager = GhostdagManager::new(18);
        let g = genesis(&mut store);
        let mut virtual_block = VirtualBlock::new(g, GhostdagData::genesis(g));

        let mut tip = g;
        for i in 1..=6u64 {
            tip = push(&mut store, &manager, i, vec![tip]);
            let updates = virtual_block.add_tip(&manager, &store, &store, tip).unwrap();
            assert!(updates.removed.is_empty());
            assert_eq!(updates.added, vec![tip]);
        }
        assert_eq!(virtual_block.selected_tip(), tip);
        assert_eq!(virtual_block.blue_score(), 7); // 6 blocks + virtual's own increment
    }

    #[test]
    fn longer_side_chain_triggers_reorg() {
        let mut store = InMemoryBlockStore::new();
        let manager = GhostdagManager::new(18);
        let g = genesis(&mut store);
        let mut virtual_block = VirtualBlock::new(g, GhostdagData::genesis(g));

        let s1 = push(&mut store, &manager, 1, vec![g]);
        let s2 = push(&mut store, &manager, 2, vec![s1]);
        virtual_block.add_tip(&manager, &store, &store, s1).unwrap();
        let first = virtual_block.add_tip(&manager, &store, &store, s2).unwrap();
        assert!(first.removed.is_empty());
        assert_eq!(first.added, vec![s2]);
        assert_eq!(virtual_block.selected_tip(), s2);

        // A longer side chain, built directly off genesis without ever
        // becoming part of the virtual's own tip set, displaces the whole
        // short chain in one reorg when it's finally folded in.
        let mut long_tip = g;
        let mut long_chain = Vec::new();
        for i in 100..103u64 {
            long_tip = push(&mut store, &manager, i, vec![long_tip]);
            long_chain.push(long_tip);
        }

        let updates = virtual_block.add_tip(&manager, &store, &store, long_tip).unwrap();

        assert_eq!(virtual_block.selected_tip(), long_tip);
        assert!(virtual_block.contains_chain_block(&g));
        assert!(!virtual_block.contains_chain_block(&s2));
        // removed runs from the old tip backward to (excluding) the common
        // ancestor; added runs from the common ancestor forward to the new tip.
        assert_eq!(updates.removed, vec![s2, s1]);
        assert_eq!(updates.added, long_chain);
    }

    #[test]
    fn short_fork_does_not_move_the_selected_tip() {
        let mut store = InMemoryBlockStore::new();
        let manager = GhostdagManager::new(18);
        let g = genesis(&mut store);
        let mut virtual_block = VirtualBlock::new(g, GhostdagData::genesis(g));

        let mut main_tip = g;
        for i in 1..=10u64 {
            main_tip = push(&mut store, &manager, i, vec![main_tip]);
            virtual_block.add_tip(&manager, &store, &store, main_tip).unwrap();
        }

        let fork_block = push(&mut store, &manager, 1000, vec![g]);
        let updates = virtual_block.add_tip(&manager, &store, &store, fork_block).unwrap();

        assert_eq!(virtual_block.selected_tip(), main_tip);
        assert!(updates.added.is_empty() || !updates.added.contains(&fork_block));
    }

    #[test]
    fn set_tips_replaces_the_whole_tip_set_at_once() {
        // diamond: g -> {a, b}; a, b -> {c, d}. set_tips(c, d) should pick
        // the bluest of the two tips as selected parent in one call, the way
        // an initial-sync snapshot restore would (§4.2).
        let mut store = InMemoryBlockStore::new();
        let manager = GhostdagManager::new(18);
        let g = genesis(&mut store);
        let a = push(&mut store, &manager, 1, vec![g]);
        let b = push(&mut store, &manager, 2, vec![g]);
        let c = push(&mut store, &manager, 3, vec![a, b]);
        let d = push(&mut store, &manager, 4, vec![a, b]);

        let mut virtual_block = VirtualBlock::new(g, GhostdagData::genesis(g));
        let tips: BlockHashSet = [c, d].into_iter().collect();
        virtual_block.set_tips(&manager, &store, &store, tips.clone()).unwrap();

        assert_eq!(virtual_block.tips(), &tips);
        assert!(virtual_block.selected_tip() == c || virtual_block.selected_tip() == d);
        assert!(virtual_block.contains_chain_block(&g));
    }
}
