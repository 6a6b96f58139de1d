use crate::errors::GhostdagResult;
use crate::model::GhostdagStoreReader;
use duskdag_hashes::Hash;
use std::cmp::Ordering;

/// A hash paired with the blue score it will be compared by. GHOSTDAG's
/// merge-set processing order and selected-parent tie-break both reduce to
/// "compare by blue score, then by hash" (§4.1) — this wrapper makes that
/// comparison `Ord` so blocks can be pushed into a `BinaryHeap`/sorted `Vec`
/// directly instead of re-deriving the comparison ad hoc at each call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortableBlock {
    pub hash: Hash,
    pub blue_score: u64,
}

impl SortableBlock {
    pub fn new(hash: Hash, blue_score: u64) -> Self {
        Self { hash, blue_score }
    }

    pub fn from_store(hash: Hash, store: &dyn GhostdagStoreReader) -> GhostdagResult<Self> {
        Ok(Self { hash, blue_score: store.blue_score(hash)? })
    }
}

impl PartialOrd for SortableBlock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortableBlock {
    /// Higher blue score sorts greater; among equal blue scores the smaller
    /// hash sorts greater, so that `max()` over a set of candidates picks
    /// the block GHOSTDAG's tie-break rule prefers (§4.1).
    fn cmp(&self, other: &Self) -> Ordering {
        self.blue_score.cmp(&other.blue_score).then_with(|| other.hash.cmp(&self.hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duskdag_hashes::Hash;

    #[test]
    fn higher_blue_score_wins() {
        let a = SortableBlock::new(Hash::from_u64_word(1), 5);
        let b = SortableBlock::new(Hash::from_u64_word(2), 10);
        assert!(b > a);
    }

    #[test]
    fn ties_break_on_smaller_hash() {
        let a = SortableBlock::new(Hash::from_u64_word(1), 5);
        let b = SortableBlock::new(Hash::from_u64_word(2), 5);
        assert!(a > b, "smaller hash should sort as the greater (preferred) block, matching direct hash comparison");
    }
}
