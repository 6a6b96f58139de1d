use duskdag_consensus_core::errors::RuleError;
use duskdag_consensus_core::utxo::{Outpoint, UtxoDiff, UtxoEntry};
use duskdag_consensus_core::{Header, Transaction};

/// Validates a header's structural rules (§4.7 step 1) — version, shape,
/// and timestamp-vs-past-median-time ordering, and whatever else a
/// deployment wants enforced. [`crate::state::ConsensusStateManager`]
/// supplies the past median time it already computed. The header-bits-vs-
/// expected-difficulty comparison (§4.7 step 4) is *not* this collaborator's
/// job — it's native consensus logic the state manager performs itself,
/// since this crate already owns the difficulty manager that computes the
/// expected value.
pub trait HeaderValidator {
    fn validate_header(&self, header: &Header, past_median_time: i64) -> Result<(), RuleError>;
}

/// Computes the UTXO diff a block's transactions would apply, validating
/// them against a point-in-time view of the UTXO set. Script and signature
/// verification, and the transaction wire format itself, are out of scope
/// (non-goals) — this trait is the seam where that logic would plug in.
pub trait TransactionValidator {
    fn compute_utxo_diff(
        &self,
        header: &Header,
        transactions: &[Transaction],
        utxo_view: &dyn Fn(&Outpoint) -> Option<UtxoEntry>,
    ) -> Result<UtxoDiff, RuleError>;
}

/// Whether the node is currently in initial block download. Block-relay flow
/// logic outside this crate consults this to decide whether to request
/// individual blocks via inv/get or switch to a bulk sync strategy.
pub trait InitialBlockDownload {
    fn is_active(&self) -> bool;
}
