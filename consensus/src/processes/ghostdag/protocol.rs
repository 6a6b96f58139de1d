use crate::errors::GhostdagResult;
use crate::model::block_node::GhostdagData;
use crate::model::store::{GhostdagStoreReader, RelationsStoreReader};
use crate::processes::ghostdag::ordering::SortableBlock;
use duskdag_consensus_core::{BlockHashMap, BlockHashSet};
use duskdag_hashes::Hash;
use std::collections::VecDeque;

/// Computes GHOSTDAG data for a block from its direct parents (§4.1). `k`
/// bounds the size of a block's anticone among the blocks this manager will
/// accept as blue — the same parameter [`duskdag_consensus_core::config::NetworkParams::k`]
/// carries per network.
#[derive(Debug, Clone, Copy)]
pub struct GhostdagManager {
    k: u8,
}

impl GhostdagManager {
    pub fn new(k: u8) -> Self {
        Self { k }
    }

    pub fn k(&self) -> u8 {
        self.k
    }

    /// Picks the parent with the highest blue score, breaking ties on the
    /// smaller hash (§4.1).
    pub fn choose_selected_parent(
        &self,
        ghostdag: &dyn GhostdagStoreReader,
        parents: &BlockHashSet,
    ) -> GhostdagResult<Hash> {
        let mut best: Option<SortableBlock> = None;
        for &parent in parents {
            let candidate = SortableBlock::from_store(parent, ghostdag)?;
            best = Some(match best {
                None => candidate,
                Some(current) => current.max(candidate),
            });
        }
        best.map(|sb| sb.hash).ok_or_else(|| crate::errors::GhostdagError::MissingAncestor(Hash::default()))
    }

    /// The set of blocks pulled into `hash`'s merge set: every ancestor of a
    /// non-selected parent that the selected parent's own past does not
    /// already cover. Returned sorted ascending by blue score (ties by hash)
    /// so blue/red classification below processes older blocks first.
    pub fn merge_set(
        &self,
        relations: &dyn RelationsStoreReader,
        ghostdag: &dyn GhostdagStoreReader,
        selected_parent: Hash,
        parents: &BlockHashSet,
    ) -> GhostdagResult<Vec<Hash>> {
        let mut selected_past = past_set(relations, selected_parent)?;
        selected_past.insert(selected_parent);

        let mut candidates = BlockHashSet::new();
        for &parent in parents {
            if parent == selected_parent {
                continue;
            }
            if !selected_past.contains(&parent) {
                candidates.insert(parent);
            }
            for ancestor in past_set(relations, parent)? {
                if !selected_past.contains(&ancestor) {
                    candidates.insert(ancestor);
                }
            }
        }

        let mut sortable = Vec::with_capacity(candidates.len());
        for hash in candidates {
            sortable.push(SortableBlock::from_store(hash, ghostdag)?);
        }
        sortable.sort_by(|a, b| a.blue_score.cmp(&b.blue_score).then_with(|| a.hash.cmp(&b.hash)));
        Ok(sortable.into_iter().map(|sb| sb.hash).collect())
    }

    /// Runs GHOSTDAG on a non-genesis block: chooses the selected parent,
    /// computes the merge set, and classifies each merge-set member blue or
    /// red by the k-cluster anticone rule (§4.1).
    pub fn calculate_block_data(
        &self,
        relations: &dyn RelationsStoreReader,
        ghostdag: &dyn GhostdagStoreReader,
        parents: &BlockHashSet,
    ) -> GhostdagResult<GhostdagData> {
        let selected_parent = self.choose_selected_parent(ghostdag, parents)?;
        let merge_set = self.merge_set(relations, ghostdag, selected_parent, parents)?;

        let mut blues: Vec<Hash> = Vec::new();
        let mut blue_anticone_sizes: BlockHashMap<u8> = BlockHashMap::new();

        for candidate in merge_set.iter().copied() {
            if let Some(bumps) =
                self.check_blue_candidate(relations, ghostdag, selected_parent, &blues, &blue_anticone_sizes, candidate)?
            {
                for (hash, size) in bumps {
                    blue_anticone_sizes.insert(hash, size);
                }
                blues.push(candidate);
            }
        }

        let blue_set: BlockHashSet = blues.iter().copied().collect();
        let red_set = merge_set.into_iter().filter(|h| !blue_set.contains(h)).collect();
        let blue_score = ghostdag.blue_score(selected_parent)? + blues.len() as u64 + 1;

        Ok(GhostdagData { blue_score, selected_parent, blue_set: blues, red_set, blue_anticone_sizes })
    }

    /// Checks whether `candidate` can join the growing blue set without
    /// violating the k-cluster rule (§4.1): both its own anticone, restricted
    /// to the blues accumulated so far, must stay within `k`, and accepting
    /// it must not push any of those existing blues' own accumulated anticone
    /// size past `k` either. Blues already pushed this round are checked
    /// against `pending_anticone_sizes`; older blues, inherited down the
    /// selected-parent chain, are looked up via [`Self::blue_anticone_size`].
    ///
    /// Returns the bumped `(hash, new_anticone_size)` pairs for every blue
    /// affected (including `candidate` itself) when the candidate is
    /// accepted, or `None` when it must be red.
    fn check_blue_candidate(
        &self,
        relations: &dyn RelationsStoreReader,
        ghostdag: &dyn GhostdagStoreReader,
        selected_parent: Hash,
        blues_so_far: &[Hash],
        pending_anticone_sizes: &BlockHashMap<u8>,
        candidate: Hash,
    ) -> GhostdagResult<Option<Vec<(Hash, u8)>>> {
        let mut bumps: Vec<(Hash, u8)> = Vec::new();
        let mut candidate_anticone_size: u8 = 0;

        for &blue in blues_so_far {
            if is_ancestor(relations, blue, candidate)? {
                continue;
            }
            let blue_size = self.blue_anticone_size(ghostdag, pending_anticone_sizes, selected_parent, blue)?;
            candidate_anticone_size += 1;
            if candidate_anticone_size > self.k || blue_size + 1 > self.k {
                return Ok(None);
            }
            bumps.push((blue, blue_size + 1));
        }

        let mut chain_block = selected_parent;
        loop {
            if is_ancestor(relations, chain_block, candidate)? {
                break;
            }
            let data = ghostdag.get(chain_block)?;
            for &blue in data.blue_set.iter() {
                if is_ancestor(relations, blue, candidate)? {
                    continue;
                }
                let blue_size = self.blue_anticone_size(ghostdag, pending_anticone_sizes, selected_parent, blue)?;
                candidate_anticone_size += 1;
                if candidate_anticone_size > self.k || blue_size + 1 > self.k {
                    return Ok(None);
                }
                bumps.push((blue, blue_size + 1));
            }
            if data.selected_parent == chain_block {
                break;
            }
            chain_block = data.selected_parent;
        }

        bumps.push((candidate, candidate_anticone_size));
        Ok(Some(bumps))
    }

    /// The accumulated anticone size of `blue`, as of the in-progress block
    /// whose selected parent is `selected_parent`: the most recent running
    /// total, found by checking this round's own bumps first
    /// (`pending_anticone_sizes`) and otherwise walking back along the
    /// selected-parent chain until some ancestor's own stored record of it is
    /// found (§4.1's "restricted to the selected parent's blue set"). `0` if
    /// `blue` was never previously involved in a k-cluster bump.
    fn blue_anticone_size(
        &self,
        ghostdag: &dyn GhostdagStoreReader,
        pending_anticone_sizes: &BlockHashMap<u8>,
        selected_parent: Hash,
        blue: Hash,
    ) -> GhostdagResult<u8> {
        if let Some(&size) = pending_anticone_sizes.get(&blue) {
            return Ok(size);
        }
        let mut chain_block = selected_parent;
        loop {
            let data = ghostdag.get(chain_block)?;
            if let Some(&size) = data.blue_anticone_sizes.get(&blue) {
                return Ok(size);
            }
            if data.selected_parent == chain_block {
                return Ok(0);
            }
            chain_block = data.selected_parent;
        }
    }
}

fn past_set(relations: &dyn RelationsStoreReader, hash: Hash) -> GhostdagResult<BlockHashSet> {
    let mut visited = BlockHashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(hash);
    while let Some(h) = queue.pop_front() {
        for &parent in relations.parents(h)?.iter() {
            if visited.insert(parent) {
                queue.push_back(parent);
            }
        }
    }
    Ok(visited)
}

fn is_ancestor(relations: &dyn RelationsStoreReader, ancestor: Hash, descendant: Hash) -> GhostdagResult<bool> {
    if ancestor == descendant {
        return Ok(true);
    }
    let mut visited = BlockHashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(descendant);
    visited.insert(descendant);
    while let Some(h) = queue.pop_front() {
        for &parent in relations.parents(h)?.iter() {
            if parent == ancestor {
                return Ok(true);
            }
            if visited.insert(parent) {
                queue.push_back(parent);
            }
        }
    }
    Ok(false)
}
