use crate::state::codec::{decode_key, decode_value, encode_key, encode_value, VIRTUAL_UTXO_SET_BUCKET};
use duskdag_consensus_core::utxo::{Outpoint, UtxoCollection, UtxoDiff, UtxoEntry};
use duskdag_database::{DbReader, DbTransaction, StoreResult};
use thiserror::Error;

/// Staging-area misuse (§4.6/§4.9, design note "staged stores"): the two
/// staging modes are mutually exclusive per transaction, and a full-set
/// stage must not be built from a duplicate-keyed source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StagingError {
    #[error("cannot stage a UTXO diff while a full-set stage is pending")]
    DiffWhileFullSetStaged,
    #[error("cannot stage a full UTXO set while a diff stage is pending")]
    FullSetWhileDiffStaged,
    #[error("full-set stage source yielded outpoint {0:?} more than once")]
    DuplicateOutpoint(Outpoint),
}

pub type StagingResult<T> = std::result::Result<T, StagingError>;

/// A backend able to both answer reads directly and open a write
/// transaction. `duskdag-database`'s `RocksDb` is the production
/// implementation; tests use an in-memory stand-in.
pub trait TransactionalBackend: DbReader {
    fn begin(&self) -> Box<dyn DbTransaction + '_>;
}

impl TransactionalBackend for duskdag_database::RocksDb {
    fn begin(&self) -> Box<dyn DbTransaction + '_> {
        Box::new(self.transaction())
    }
}

/// What's currently staged on top of the persisted UTXO set, if anything
/// (§4.9/C9). Diff mode accumulates a [`UtxoDiff`] relative to what's
/// persisted — the common case, one diff per connected block. Full-set mode
/// replaces the bucket wholesale with a freshly materialized set — used when
/// rebuilding from a full UTXO-commitment download rather than applying
/// incremental diffs.
enum Staging {
    Diff(UtxoDiff),
    FullSet(UtxoCollection),
}

/// The persisted virtual UTXO set, with an optional staged-but-uncommitted
/// overlay (§4.9/C9). Reads consult the overlay first — a full-set overlay is
/// authoritative on its own (it isn't merged with stale persisted rows); a
/// diff overlay is consulted for a hit/miss before falling through to the
/// persisted store. This also fixes the inconsistency where the two read
/// methods used to disagree on which layer to check first.
pub struct ConsensusStateStore<B> {
    backend: B,
    staging: Option<Staging>,
}

impl<B: TransactionalBackend> ConsensusStateStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, staging: None }
    }

    /// Opens (or continues) diff staging. Fails rather than silently
    /// overwriting if a full-set stage is already pending (§5 "double-staging
    /// of the UTXO area in conflicting modes is rejected").
    pub fn start_diff_staging(&mut self) -> StagingResult<()> {
        match &self.staging {
            Some(Staging::FullSet(_)) => Err(StagingError::DiffWhileFullSetStaged),
            Some(Staging::Diff(_)) => Ok(()),
            None => {
                self.staging = Some(Staging::Diff(UtxoDiff::default()));
                Ok(())
            }
        }
    }

    /// Opens full-set staging from an iterator of outpoint/entry pairs,
    /// rejecting a source that yields the same outpoint twice (§4.6's
    /// "fails ... if the iterator yields duplicate outpoints") and rejecting
    /// the call outright if a diff stage is already pending.
    pub fn start_full_set_staging<I: IntoIterator<Item = (Outpoint, UtxoEntry)>>(&mut self, entries: I) -> StagingResult<()> {
        if matches!(self.staging, Some(Staging::Diff(_))) {
            return Err(StagingError::FullSetWhileDiffStaged);
        }
        let mut set = UtxoCollection::new();
        for (outpoint, entry) in entries {
            if set.insert(outpoint, entry).is_some() {
                return Err(StagingError::DuplicateOutpoint(outpoint));
            }
        }
        self.staging = Some(Staging::FullSet(set));
        Ok(())
    }

    pub fn is_staging(&self) -> bool {
        self.staging.is_some()
    }

    /// Folds `diff` into whatever is currently staged. In diff mode this
    /// composes via the UTXO diff algebra (§4.5); in full-set mode it applies
    /// the diff directly to the materialized set.
    pub fn stage_diff(&mut self, diff: UtxoDiff) -> duskdag_consensus_core::utxo::UtxoResult<()> {
        match self.staging.take() {
            Some(Staging::Diff(mut existing)) => {
                existing.compose_in_place(&diff)?;
                self.staging = Some(Staging::Diff(existing));
            }
            Some(Staging::FullSet(set)) => {
                let applied = diff.apply(&set)?;
                self.staging = Some(Staging::FullSet(applied));
            }
            None => {
                self.staging = Some(Staging::Diff(diff));
            }
        }
        Ok(())
    }

    pub fn utxo_by_outpoint(&self, outpoint: &Outpoint) -> StoreResult<Option<UtxoEntry>> {
        match &self.staging {
            Some(Staging::FullSet(set)) => Ok(set.get(outpoint).cloned()),
            Some(Staging::Diff(diff)) => {
                if let Some(entry) = diff.to_add.get(outpoint) {
                    return Ok(Some(entry.clone()));
                }
                if diff.to_remove.contains_key(outpoint) {
                    return Ok(None);
                }
                self.read_persisted(outpoint)
            }
            None => self.read_persisted(outpoint),
        }
    }

    pub fn has_utxo_by_outpoint(&self, outpoint: &Outpoint) -> StoreResult<bool> {
        Ok(self.utxo_by_outpoint(outpoint)?.is_some())
    }

    fn read_persisted(&self, outpoint: &Outpoint) -> StoreResult<Option<UtxoEntry>> {
        let key = encode_key(outpoint);
        if !self.backend.has(&key)? {
            return Ok(None);
        }
        let bytes = self.backend.get(&key)?;
        Ok(decode_value(&bytes))
    }

    /// Returns the full persisted set, ignoring any staged overlay — used by
    /// callers rebuilding a full-set stage from scratch.
    pub fn persisted_snapshot(&self) -> StoreResult<UtxoCollection> {
        let mut set = UtxoCollection::new();
        let mut cursor = self.backend.cursor(VIRTUAL_UTXO_SET_BUCKET)?;
        while cursor.next() {
            if let (Some(outpoint), Some(entry)) = (decode_key(&cursor.key()), decode_value(&cursor.value())) {
                set.insert(outpoint, entry);
            }
        }
        Ok(set)
    }

    /// Commits whatever is staged, atomically, and clears the stage.
    /// Committing with nothing staged is a no-op.
    pub fn commit(&mut self) -> StoreResult<()> {
        let Some(staging) = self.staging.take() else {
            return Ok(());
        };
        let mut tx = self.backend.begin();
        match staging {
            Staging::Diff(diff) => {
                for outpoint in diff.to_remove.keys() {
                    tx.delete(&encode_key(outpoint));
                }
                for (outpoint, entry) in diff.to_add.iter() {
                    tx.put(&encode_key(outpoint), &encode_value(entry));
                }
            }
            Staging::FullSet(set) => {
                let mut existing_keys = Vec::new();
                {
                    let mut cursor = self.backend.cursor(VIRTUAL_UTXO_SET_BUCKET)?;
                    while cursor.next() {
                        existing_keys.push(cursor.key());
                    }
                }
                for key in existing_keys {
                    tx.delete(&key);
                }
                for (outpoint, entry) in set.iter() {
                    tx.put(&encode_key(outpoint), &encode_value(entry));
                }
            }
        }
        tx.commit()
    }

    /// Discards whatever is staged without touching the backend.
    pub fn discard_staging(&mut self) {
        self.staging = None;
    }
}
