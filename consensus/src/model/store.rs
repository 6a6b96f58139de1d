use crate::errors::{StoreAccessError, StoreAccessResult};
use crate::model::block_node::{BlockNode, GhostdagData};
use duskdag_consensus_core::{BlockHashMap, BlockHashSet, Header};
use duskdag_hashes::Hash;
use std::sync::Arc;

/// Read side of the header store (§4.2/C3): headers are immutable once
/// inserted, so lookups return cheap `Arc` clones.
pub trait HeaderStoreReader {
    fn header(&self, hash: Hash) -> StoreAccessResult<Arc<Header>>;

    fn timestamp(&self, hash: Hash) -> StoreAccessResult<i64> {
        self.header(hash).map(|h| h.time_in_milliseconds)
    }

    fn bits(&self, hash: Hash) -> StoreAccessResult<u32> {
        self.header(hash).map(|h| h.bits)
    }
}

pub trait HeaderStore: HeaderStoreReader {
    fn insert(&mut self, header: Arc<Header>);
}

/// Read side of the parent/child relations store (§4.2/C2).
pub trait RelationsStoreReader {
    fn parents(&self, hash: Hash) -> StoreAccessResult<Arc<BlockHashSet>>;
    fn children(&self, hash: Hash) -> StoreAccessResult<Arc<BlockHashSet>>;
    fn contains(&self, hash: Hash) -> bool;
}

pub trait RelationsStore: RelationsStoreReader {
    /// Registers `hash` with the given parents, and back-links `hash` into
    /// each parent's child set. Parents must already be present.
    fn insert(&mut self, hash: Hash, parents: BlockHashSet) -> StoreAccessResult<()>;
}

/// Read side of the GHOSTDAG data store (§4.1).
pub trait GhostdagStoreReader {
    fn get(&self, hash: Hash) -> StoreAccessResult<Arc<GhostdagData>>;

    fn blue_score(&self, hash: Hash) -> StoreAccessResult<u64> {
        self.get(hash).map(|d| d.blue_score)
    }

    fn selected_parent(&self, hash: Hash) -> StoreAccessResult<Hash> {
        self.get(hash).map(|d| d.selected_parent)
    }
}

pub trait GhostdagStore: GhostdagStoreReader {
    fn insert(&mut self, hash: Hash, data: Arc<GhostdagData>);
}

/// An in-memory arena backing the header, relations and GHOSTDAG stores
/// (§3's "store nodes in an arena keyed by hash" design note). Mutation is
/// not internally synchronized: callers share one instance behind the
/// process-wide DAG lock described in §5, the same lock guarding GHOSTDAG
/// assignment, virtual mutation and UTXO commit.
#[derive(Debug, Default)]
pub struct InMemoryBlockStore {
    nodes: BlockHashMap<BlockNode>,
    children: BlockHashMap<BlockHashSet>,
    ghostdag: BlockHashMap<Arc<GhostdagData>>,
}

impl InMemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a genesis/origin block that has no parents of its own, with
    /// the given GHOSTDAG data (normally [`GhostdagData::genesis`]).
    pub fn insert_root(&mut self, node: BlockNode, ghostdag: Arc<GhostdagData>) {
        let hash = node.hash;
        self.nodes.insert(hash, node);
        self.children.entry(hash).or_default();
        self.ghostdag.insert(hash, ghostdag);
    }

    pub fn block_node(&self, hash: Hash) -> StoreAccessResult<&BlockNode> {
        self.nodes.get(&hash).ok_or(StoreAccessError::NotFound(hash))
    }
}

impl HeaderStoreReader for InMemoryBlockStore {
    fn header(&self, hash: Hash) -> StoreAccessResult<Arc<Header>> {
        self.nodes.get(&hash).map(|n| n.header.clone()).ok_or(StoreAccessError::NotFound(hash))
    }
}

impl HeaderStore for InMemoryBlockStore {
    fn insert(&mut self, header: Arc<Header>) {
        let node = BlockNode::new(header);
        let hash = node.hash;
        self.nodes.insert(hash, node);
        self.children.entry(hash).or_default();
    }
}

impl RelationsStoreReader for InMemoryBlockStore {
    fn parents(&self, hash: Hash) -> StoreAccessResult<Arc<BlockHashSet>> {
        self.nodes
            .get(&hash)
            .map(|n| Arc::new(n.parents.clone()))
            .ok_or(StoreAccessError::NotFound(hash))
    }

    fn children(&self, hash: Hash) -> StoreAccessResult<Arc<BlockHashSet>> {
        self.children
            .get(&hash)
            .map(|c| Arc::new(c.clone()))
            .ok_or(StoreAccessError::NotFound(hash))
    }

    fn contains(&self, hash: Hash) -> bool {
        self.nodes.contains_key(&hash)
    }
}

impl RelationsStore for InMemoryBlockStore {
    fn insert(&mut self, hash: Hash, parents: BlockHashSet) -> StoreAccessResult<()> {
        for &parent in &parents {
            let entry = self.children.get_mut(&parent).ok_or(StoreAccessError::NotFound(parent))?;
            entry.insert(hash);
        }
        self.children.entry(hash).or_default();
        Ok(())
    }
}

impl GhostdagStoreReader for InMemoryBlockStore {
    fn get(&self, hash: Hash) -> StoreAccessResult<Arc<GhostdagData>> {
        self.ghostdag.get(&hash).cloned().ok_or(StoreAccessError::NotFound(hash))
    }
}

impl GhostdagStore for InMemoryBlockStore {
    fn insert(&mut self, hash: Hash, data: Arc<GhostdagData>) {
        self.ghostdag.insert(hash, data);
    }
}
