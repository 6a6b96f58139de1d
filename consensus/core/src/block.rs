use crate::Header;
use std::sync::Arc;

/// A transaction as carried on the wire (§6). Script/signature verification
/// and the transaction's own field layout are out of scope (non-goals) —
/// this crate only needs enough of a shape for a block to carry "some
/// transactions" through the relay flow and into the transaction validator
/// collaborator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transaction {
    pub payload: Vec<u8>,
}

/// The `Block{header, txs}` wire message (§6), already decoded: a header plus
/// its transactions. The byte codec that produces one of these is out of
/// scope (non-goal, §1) — the block-relay flow consumes values of this shape
/// once some external decoder has built them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: Arc<Header>,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(header: Arc<Header>, transactions: Vec<Transaction>) -> Self {
        Self { header, transactions }
    }

    pub fn header_only(header: Arc<Header>) -> Self {
        Self { header, transactions: Vec::new() }
    }

    pub fn hash(&self) -> crate::Hash {
        self.header.hash
    }
}
