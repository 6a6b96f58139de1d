use super::collection::UtxoCollection;
use super::error::{UtxoAlgebraError, UtxoResult};

/// A pending change to a UTXO set: outputs to add and outputs to remove.
/// By construction an outpoint never appears in both collections at once
/// (§3's invariant `to-add ∩ to-remove = ∅`).
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct UtxoDiff {
    pub to_add: UtxoCollection,
    pub to_remove: UtxoCollection,
}

impl UtxoDiff {
    pub fn new(to_add: UtxoCollection, to_remove: UtxoCollection) -> Self {
        Self { to_add, to_remove }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Swaps `to_add` and `to_remove`. `invert(invert(d)) == d` always holds
    /// since this is its own inverse.
    pub fn invert(&self) -> Self {
        Self { to_add: self.to_remove.clone(), to_remove: self.to_add.clone() }
    }

    /// Composes `self` (applied first) with `other` (applied second) into a
    /// single diff equivalent to applying both in sequence (§4.5).
    pub fn compose(&self, other: &UtxoDiff) -> UtxoResult<UtxoDiff> {
        let mut result = self.clone();
        result.compose_in_place(other)?;
        Ok(result)
    }

    /// In-place variant of [`compose`](Self::compose). On error `self` is left
    /// in a partially-mutated state and must be discarded by the caller —
    /// mirrors the teacher's `with_diff_in_place`, whose callers always treat
    /// an `Err` as "abandon this diff".
    pub fn compose_in_place(&mut self, other: &UtxoDiff) -> UtxoResult<()> {
        for outpoint in other.to_remove.keys() {
            if self.to_remove.contains_key(outpoint) && !self.to_add.contains_key(outpoint) {
                return Err(UtxoAlgebraError::DuplicateRemove(*outpoint));
            }
        }
        for outpoint in other.to_add.keys() {
            if self.to_add.contains_key(outpoint) && !other.to_remove.contains_key(outpoint) {
                return Err(UtxoAlgebraError::DuplicateAdd(*outpoint));
            }
        }

        for (outpoint, entry) in other.to_remove.iter() {
            if self.to_add.remove(outpoint).is_none() {
                self.to_remove.insert(*outpoint, entry.clone());
            }
        }

        for (outpoint, entry) in other.to_add.iter() {
            if self.to_remove.remove(outpoint).is_none() {
                self.to_add.insert(*outpoint, entry.clone());
            }
        }

        Ok(())
    }

    /// Applies this diff to a UTXO set, returning the resulting set. Every
    /// `to_remove` outpoint must be present and every `to_add` outpoint must
    /// be absent, or the whole application fails (§4.5).
    pub fn apply(&self, set: &UtxoCollection) -> UtxoResult<UtxoCollection> {
        let mut result = set.clone();
        for outpoint in self.to_remove.keys() {
            if result.remove(outpoint).is_none() {
                return Err(UtxoAlgebraError::MissingForRemoval(*outpoint));
            }
        }
        for (outpoint, entry) in self.to_add.iter() {
            if result.contains_key(outpoint) {
                return Err(UtxoAlgebraError::AlreadyExists(*outpoint));
            }
            result.insert(*outpoint, entry.clone());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utxo::collection::{Outpoint, UtxoEntry};
    use crate::Hash;

    fn entry(amount: u64) -> UtxoEntry {
        UtxoEntry::new(amount, vec![], 0, false)
    }

    fn outpoint(i: u64) -> Outpoint {
        Outpoint::new(Hash::from_u64_word(i), 0)
    }

    #[test]
    fn invert_is_involution() {
        let mut d = UtxoDiff::default();
        d.to_add.insert(outpoint(1), entry(1));
        d.to_remove.insert(outpoint(2), entry(2));
        assert_eq!(d.invert().invert(), d);
    }

    #[test]
    fn compose_cancels_add_then_remove() {
        let mut a = UtxoDiff::default();
        a.to_add.insert(outpoint(1), entry(10));

        let mut b = UtxoDiff::default();
        b.to_remove.insert(outpoint(1), entry(10));

        let c = a.compose(&b).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn compose_then_apply_equals_sequential_apply() {
        let mut base = UtxoCollection::new();
        base.insert(outpoint(5), entry(5));

        let mut a = UtxoDiff::default();
        a.to_add.insert(outpoint(1), entry(1));
        a.to_remove.insert(outpoint(5), entry(5));

        let mut b = UtxoDiff::default();
        b.to_add.insert(outpoint(2), entry(2));
        b.to_remove.insert(outpoint(1), entry(1));

        let composed = a.compose(&b).unwrap();
        let via_compose = composed.apply(&base).unwrap();

        let intermediate = a.apply(&base).unwrap();
        let via_sequential = b.apply(&intermediate).unwrap();

        assert_eq!(via_compose, via_sequential);
    }

    #[test]
    fn compose_rejects_double_remove() {
        let mut a = UtxoDiff::default();
        a.to_remove.insert(outpoint(1), entry(1));

        let mut b = UtxoDiff::default();
        b.to_remove.insert(outpoint(1), entry(1));

        assert_eq!(a.compose(&b), Err(UtxoAlgebraError::DuplicateRemove(outpoint(1))));
    }

    #[test]
    fn compose_rejects_double_add() {
        let mut a = UtxoDiff::default();
        a.to_add.insert(outpoint(1), entry(1));

        let mut b = UtxoDiff::default();
        b.to_add.insert(outpoint(1), entry(1));

        assert_eq!(a.compose(&b), Err(UtxoAlgebraError::DuplicateAdd(outpoint(1))));
    }

    #[test]
    fn apply_fails_on_missing_removal() {
        let set = UtxoCollection::new();
        let mut d = UtxoDiff::default();
        d.to_remove.insert(outpoint(1), entry(1));
        assert_eq!(d.apply(&set), Err(UtxoAlgebraError::MissingForRemoval(outpoint(1))));
    }

    #[test]
    fn apply_fails_on_existing_add() {
        let mut set = UtxoCollection::new();
        set.insert(outpoint(1), entry(1));
        let mut d = UtxoDiff::default();
        d.to_add.insert(outpoint(1), entry(99));
        assert_eq!(d.apply(&set), Err(UtxoAlgebraError::AlreadyExists(outpoint(1))));
    }
}
