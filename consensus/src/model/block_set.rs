use crate::errors::GhostdagResult;
use crate::model::store::GhostdagStoreReader;
use duskdag_consensus_core::BlockHashSet;
use duskdag_hashes::Hash;

/// An unordered set of block hashes with the comparison helpers GHOSTDAG and
/// the virtual block need: "which member is bluest" (highest blue score,
/// smaller hash breaking ties) and plain set algebra (§3, §4.1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSet(BlockHashSet);

impl BlockSet {
    pub fn new() -> Self {
        Self(BlockHashSet::new())
    }

    pub fn insert(&mut self, hash: Hash) -> bool {
        self.0.insert(hash)
    }

    pub fn remove(&mut self, hash: &Hash) -> bool {
        self.0.remove(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.0.contains(hash)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hash> {
        self.0.iter()
    }

    /// A deterministically ordered snapshot of the set's members (sorted by
    /// hash), used where iteration order must be stable across runs, e.g.
    /// logging and test assertions.
    pub fn sorted_hashes(&self) -> Vec<Hash> {
        let mut v: Vec<Hash> = self.0.iter().copied().collect();
        v.sort_unstable();
        v
    }

    /// The member with the highest blue score, breaking ties on the smaller
    /// hash (§4.1's selected-parent tie-break rule, reused here for
    /// "bluest member of a set").
    pub fn bluest_member(&self, store: &dyn GhostdagStoreReader) -> GhostdagResult<Option<Hash>> {
        let mut best: Option<(u64, Hash)> = None;
        for &hash in &self.0 {
            let score = store.blue_score(hash)?;
            best = match best {
                None => Some((score, hash)),
                Some((best_score, best_hash)) => {
                    if score > best_score || (score == best_score && hash < best_hash) {
                        Some((score, hash))
                    } else {
                        Some((best_score, best_hash))
                    }
                }
            };
        }
        Ok(best.map(|(_, hash)| hash))
    }
}

impl FromIterator<Hash> for BlockSet {
    fn from_iter<T: IntoIterator<Item = Hash>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a BlockSet {
    type Item = &'a Hash;
    type IntoIter = std::collections::hash_set::Iter<'a, Hash>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
