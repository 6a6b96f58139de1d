use crate::{constants, Hash};
use thiserror::Error;

/// Block rejected because it violates a consensus rule. Recoverable: the
/// hash is recorded as known-invalid and the source block is rejected (§7).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("wrong block version: got {0} but expected {}", constants::BLOCK_VERSION)]
    WrongBlockVersion(u16),

    #[error("the block timestamp {0} is more than {1}ms ahead of the maximum allowed timestamp")]
    TimeTooFarIntoTheFuture(i64, i64),

    #[error("block has no parents")]
    NoParents,

    #[error("block has missing parents: {0:?}")]
    MissingParents(Vec<Hash>),

    #[error("block {0} difficulty bits {1:#x} does not match the expected value {2:#x}")]
    UnexpectedDifficulty(Hash, u32, u32),

    #[error("block is already known to be invalid")]
    KnownInvalid,

    #[error("transaction validation failed: {0}")]
    InvalidTransaction(String),

    #[error("double spend detected for outpoint")]
    DoubleSpend,
}
