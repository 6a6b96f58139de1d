pub use duskdag_consensus_core::errors::{ConsensusError, RuleError};
use duskdag_hashes::Hash;
use thiserror::Error;

/// Errors raised by the in-memory GHOSTDAG/relations/header stores. These are
/// internal invariant violations, not consensus rule violations: a hash
/// missing here means the caller tried to query a block before it (or one of
/// its ancestors) was inserted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreAccessError {
    #[error("block {0} not found in store")]
    NotFound(Hash),
}

pub type StoreAccessResult<T> = std::result::Result<T, StoreAccessError>;

/// Errors raised while computing a block's GHOSTDAG data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GhostdagError {
    #[error("missing ancestor {0} required to compute GHOSTDAG data")]
    MissingAncestor(Hash),

    #[error(transparent)]
    Store(#[from] StoreAccessError),
}

pub type GhostdagResult<T> = std::result::Result<T, GhostdagError>;

/// The outcome of feeding a single block through [`crate::state::ConsensusStateManager::process_block`]
/// (§4.10). `Accepted` and `Orphan`/`Delayed` are ordinary, expected results;
/// `Rejected` carries a [`RuleError`] describing which validation rule
/// failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessBlockOutcome {
    Accepted,
    Orphan,
    Delayed,
    Rejected(RuleError),
}

/// `flags` (§4.7): caller-supplied hints that tweak a single `process_block`
/// call without changing the taxonomy of its outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessBlockFlags {
    /// Skip the header-bits-equals-expected-difficulty check. Test only —
    /// production callers must leave this `false`.
    pub no_pow_check: bool,
    /// This call is allowed to assume missing parents (used by orphan-pool
    /// resolution, which only reprocesses a header once its parents are
    /// already known, but still wants to flag the reprocessing path for
    /// logging/metrics purposes).
    pub orphan: bool,
    /// This header was previously classified `Delayed` and is being
    /// resubmitted now that wall-clock time has advanced.
    pub after_delay: bool,
}

/// Top-level error type for consensus state management: anything other than
/// a `RuleError` here represents a bug or storage failure, not a rejected
/// block, and per §9 is treated as an assertion failure rather than a
/// recoverable condition.
#[derive(Error, Debug)]
pub enum ConsensusStateError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error(transparent)]
    Ghostdag(#[from] GhostdagError),

    #[error(transparent)]
    Store(#[from] duskdag_database::StoreError),

    #[error(transparent)]
    Utxo(#[from] duskdag_consensus_core::utxo::UtxoAlgebraError),

    #[error(transparent)]
    Staging(#[from] crate::state::StagingError),
}

pub type ConsensusStateResult<T> = std::result::Result<T, ConsensusStateError>;
