use super::Outpoint;
use thiserror::Error;

/// Failure modes of the UTXO diff/collection algebra (§4.5). Covers both
/// `compose` (the spec's `UTXODiffCompositionError`) and `apply`, since both
/// are "this mutation is not well-defined over the given state" errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UtxoAlgebraError {
    #[error("outpoint {0:?} is removed by both diffs being composed, with no cancelling add")]
    DuplicateRemove(Outpoint),

    #[error("outpoint {0:?} is added by both diffs being composed, with no cancelling remove")]
    DuplicateAdd(Outpoint),

    #[error("cannot apply diff: outpoint {0:?} scheduled for removal is not present in the set")]
    MissingForRemoval(Outpoint),

    #[error("cannot apply diff: outpoint {0:?} scheduled for addition already exists in the set")]
    AlreadyExists(Outpoint),
}

pub type UtxoResult<T> = std::result::Result<T, UtxoAlgebraError>;
