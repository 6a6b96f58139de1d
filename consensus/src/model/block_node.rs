use duskdag_consensus_core::{BlockHashMap, BlockHashSet, Header};
use duskdag_hashes::Hash;
use std::sync::Arc;

/// A node of the block-DAG arena (§3): its identity and the header it was
/// built from. Parent/child adjacency and GHOSTDAG data live alongside it in
/// [`crate::model::InMemoryBlockStore`] rather than as fields here, since
/// children are discovered only after a node is created — the arena, not the
/// node, owns the mutable parts of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockNode {
    pub hash: Hash,
    pub parents: BlockHashSet,
    pub header: Arc<Header>,
}

impl BlockNode {
    pub fn new(header: Arc<Header>) -> Self {
        let hash = header.hash;
        let parents = header.direct_parents().iter().copied().collect();
        Self { hash, parents, header }
    }
}

/// The result of running GHOSTDAG (§4.1) on a single block: its blue score,
/// selected parent, and the partition of its merge set into blue and red
/// members. `blue_set` is ordered with the selected parent first followed by
/// the remaining blues in the order GHOSTDAG added them; this ordering feeds
/// the selected-parent-chain and topological-order computations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostdagData {
    pub blue_score: u64,
    pub selected_parent: Hash,
    pub blue_set: Vec<Hash>,
    pub red_set: BlockHashSet,
    /// Accumulated k-cluster anticone size for every blue whose count was
    /// last bumped at this block (§4.1). Older blues not touched here are
    /// found by walking further back along the selected-parent chain — see
    /// `GhostdagManager::blue_anticone_size`.
    pub blue_anticone_sizes: BlockHashMap<u8>,
}

impl GhostdagData {
    /// GHOSTDAG data for the origin/genesis: no selected parent, blue score
    /// zero, an empty merge set.
    pub fn genesis(selected_parent: Hash) -> Self {
        Self {
            blue_score: 0,
            selected_parent,
            blue_set: Vec::new(),
            red_set: BlockHashSet::new(),
            blue_anticone_sizes: BlockHashMap::new(),
        }
    }

    pub fn is_blue(&self, hash: &Hash) -> bool {
        *hash == self.selected_parent || self.blue_set.contains(hash)
    }

    pub fn is_red(&self, hash: &Hash) -> bool {
        self.red_set.contains(hash)
    }

    pub fn mergeset_size(&self) -> usize {
        self.blue_set.len() + self.red_set.len()
    }
}
