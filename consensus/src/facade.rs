use crate::errors::ConsensusStateResult;
use crate::state::{ConsensusStateManager, TransactionalBackend};
use duskdag_consensus_core::{Block, Header};
use duskdag_hashes::Hash;

/// The subset of [`ConsensusStateManager`] the block-relay flow (C11, in
/// `duskdag-protocol-flows`) needs, erased over the backend type parameter
/// `B` so the flow crate doesn't have to become generic over it too — the
/// same "external collaborator behind a trait object" shape as
/// [`crate::collaborators::HeaderValidator`]. Pure reads correspond to the
/// queries §5 allows under a read lock; `process_block` is the one write
/// operation, requiring the caller to hold the DAG's write lock.
pub trait ConsensusFacade: Send + Sync {
    fn is_known_block(&self, hash: Hash) -> bool;
    fn is_known_invalid(&self, hash: Hash) -> bool;
    fn selected_tip_blue_score(&self) -> u64;
    fn get_orphan_missing_ancestor_hashes(&self, hash: Hash) -> Vec<Hash>;
    fn estimate_orphan_blue_score(&self, header: &Header) -> u64;
    fn process_block(&mut self, block: &Block, now_in_milliseconds: i64) -> ConsensusStateResult<crate::errors::ProcessBlockOutcome>;
}

impl<B: TransactionalBackend + Send + Sync> ConsensusFacade for ConsensusStateManager<B> {
    fn is_known_block(&self, hash: Hash) -> bool {
        self.is_known_block(hash)
    }

    fn is_known_invalid(&self, hash: Hash) -> bool {
        self.is_known_invalid(hash)
    }

    fn selected_tip_blue_score(&self) -> u64 {
        self.selected_tip_blue_score()
    }

    fn get_orphan_missing_ancestor_hashes(&self, hash: Hash) -> Vec<Hash> {
        self.get_orphan_missing_ancestor_hashes(hash)
    }

    fn estimate_orphan_blue_score(&self, header: &Header) -> u64 {
        self.estimate_orphan_blue_score(header)
    }

    fn process_block(&mut self, block: &Block, now_in_milliseconds: i64) -> ConsensusStateResult<crate::errors::ProcessBlockOutcome> {
        self.process_block(block.clone(), now_in_milliseconds)
    }
}
